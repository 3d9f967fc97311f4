//! Dockyard CLI - deploy stored application records to Kubernetes

use clap::{Parser, Subcommand};
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

mod commands;

#[derive(Parser)]
#[command(name = "dockyard")]
#[command(author = "Dockyard Contributors")]
#[command(version)]
#[command(about = "Deploy stored application records to Kubernetes", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Target namespace
    #[arg(short, long, global = true, default_value = "default")]
    namespace: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage stored application records
    App {
        #[command(subcommand)]
        command: commands::app::AppCommands,
    },

    /// Deploy an application (or every stored application with --all)
    Deploy {
        /// Application id
        id: Option<Uuid>,

        /// Deploy every stored application, collecting per-item outcomes
        #[arg(long)]
        all: bool,

        /// Replace an already-deployed workload instead of leaving it untouched
        #[arg(long)]
        upsert: bool,
    },

    /// Ensure a Service exposing the application
    Expose {
        /// Application id
        id: Uuid,

        /// Service type
        #[arg(long = "type", default_value = "NodePort")]
        exposure_type: String,
    },

    /// Scale the application's workload up
    Start {
        /// Application id
        id: Uuid,

        /// Replica count
        #[arg(long, default_value_t = 1)]
        replicas: i32,
    },

    /// Scale the application's workload to zero
    Stop {
        /// Application id
        id: Uuid,
    },

    /// Rolling-restart the application's workload
    Restart {
        /// Application id
        id: Uuid,
    },

    /// Delete the application's workload (its Service is left in place)
    Delete {
        /// Application id
        id: Uuid,
    },

    /// Show live deployments
    Status {
        /// Only stored applications that are live and active
        #[arg(long)]
        active: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Default log filter; `--debug` opens the library-level spans up
fn log_filter(debug: bool) -> &'static str {
    if debug { "debug" } else { "warn" }
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_panic_hook();

    let cli = Cli::parse();

    if cli.debug {
        // SAFETY: We're the only thread touching the environment at this point
        unsafe { std::env::set_var("RUST_BACKTRACE", "1") };
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter(cli.debug).into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let namespace = cli.namespace;

    match cli.command {
        Commands::App { command } => commands::app::run(command).await,

        Commands::Deploy { id, all, upsert } => {
            commands::deploy::run(id, all, upsert, &namespace).await
        }

        Commands::Expose { id, exposure_type } => {
            commands::expose::run(id, &exposure_type, &namespace).await
        }

        Commands::Start { id, replicas } => {
            commands::lifecycle::run(commands::lifecycle::Action::Start { replicas }, id, &namespace)
                .await
        }

        Commands::Stop { id } => {
            commands::lifecycle::run(commands::lifecycle::Action::Stop, id, &namespace).await
        }

        Commands::Restart { id } => {
            commands::lifecycle::run(commands::lifecycle::Action::Restart, id, &namespace).await
        }

        Commands::Delete { id } => {
            commands::lifecycle::run(commands::lifecycle::Action::Delete, id, &namespace).await
        }

        Commands::Status { active, json } => commands::status::run(active, json, &namespace).await,
    }
}
