//! App commands - CRUD against the stored application records

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use uuid::Uuid;

use dockyard_core::{ApplicationStore, NewApplication, ResourceSizing};

use super::{open_store, parse_env_pairs};

#[derive(Subcommand)]
pub enum AppCommands {
    /// Add a new application record
    Add {
        /// Unique application name (also the cluster resource name)
        name: String,

        /// Container image reference
        image: String,

        /// Desired replica count
        #[arg(long)]
        replicas: Option<i32>,

        /// Container port
        #[arg(long)]
        port: Option<i32>,

        /// Also ensure a Service when deploying
        #[arg(long)]
        service: bool,

        /// Environment variables (KEY=VALUE, repeatable)
        #[arg(long = "env")]
        env: Vec<String>,

        /// Cpu request quantity
        #[arg(long, default_value = "250m")]
        cpu: String,

        /// Memory limit quantity
        #[arg(long, default_value = "128Mi")]
        ram: String,
    },

    /// Update an existing application record
    Update {
        /// Application id
        id: Uuid,

        /// Application name
        name: String,

        /// Container image reference
        image: String,

        #[arg(long)]
        replicas: Option<i32>,

        #[arg(long)]
        port: Option<i32>,

        #[arg(long)]
        service: Option<bool>,

        #[arg(long = "env")]
        env: Vec<String>,
    },

    /// List stored application records
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one application record
    Get {
        /// Application id
        id: Uuid,
    },

    /// Remove an application record (cluster resources are left untouched)
    Remove {
        /// Application id
        id: Uuid,
    },
}

pub async fn run(command: AppCommands) -> Result<()> {
    let store = open_store()?;

    match command {
        AppCommands::Add {
            name,
            image,
            replicas,
            port,
            service,
            env,
            cpu,
            ram,
        } => {
            let request = NewApplication {
                name,
                image,
                desired_replicas: replicas,
                container_port: port,
                service_enabled: Some(service),
                env: Some(parse_env_pairs(&env)?),
                resources: Some(ResourceSizing { cpu, ram }),
            };
            let app = store.create(request).await.into_diagnostic()?;
            println!(
                "{} Added application {} ({})",
                style("✓").green().bold(),
                style(&app.name).cyan(),
                app.id
            );
        }

        AppCommands::Update {
            id,
            name,
            image,
            replicas,
            port,
            service,
            env,
        } => {
            let request = NewApplication {
                name,
                image,
                desired_replicas: replicas,
                container_port: port,
                service_enabled: service,
                env: if env.is_empty() {
                    None
                } else {
                    Some(parse_env_pairs(&env)?)
                },
                resources: None,
            };
            let app = store.update(id, request).await.into_diagnostic()?;
            println!(
                "{} Updated application {}",
                style("✓").green().bold(),
                style(&app.name).cyan()
            );
        }

        AppCommands::List { json } => {
            let apps = store.list().await.into_diagnostic()?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&apps).into_diagnostic()?
                );
                return Ok(());
            }

            if apps.is_empty() {
                println!("No applications stored");
                return Ok(());
            }

            println!(
                "{:<36} {:<20} {:<30} {:>8} {:>6} {:<8}",
                style("ID").bold(),
                style("NAME").bold(),
                style("IMAGE").bold(),
                style("REPLICAS").bold(),
                style("PORT").bold(),
                style("SERVICE").bold()
            );
            for app in apps {
                println!(
                    "{:<36} {:<20} {:<30} {:>8} {:>6} {:<8}",
                    app.id,
                    app.name,
                    app.image,
                    app.desired_replicas,
                    app.container_port.unwrap_or(0),
                    if app.service_enabled { "yes" } else { "no" }
                );
            }
        }

        AppCommands::Get { id } => {
            let app = store.get(id).await.into_diagnostic()?;
            println!(
                "{}",
                serde_json::to_string_pretty(&app).into_diagnostic()?
            );
        }

        AppCommands::Remove { id } => {
            store.delete(id).await.into_diagnostic()?;
            println!("{} Removed application {}", style("✓").green().bold(), id);
        }
    }

    Ok(())
}
