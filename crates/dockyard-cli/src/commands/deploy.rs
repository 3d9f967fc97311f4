//! Deploy command - reconcile one or every stored application

use console::style;
use miette::{IntoDiagnostic, Result};
use uuid::Uuid;

use dockyard_kube::{ReconciliationEngine, WorkloadApplyPolicy};

use super::{connect, open_store};

pub async fn run(id: Option<Uuid>, all: bool, upsert: bool, namespace: &str) -> Result<()> {
    let store = open_store()?;
    let gateway = connect().await?;

    let policy = if upsert {
        WorkloadApplyPolicy::Upsert
    } else {
        WorkloadApplyPolicy::CreateOnly
    };
    let engine = ReconciliationEngine::new(store, gateway)
        .with_namespace(namespace)
        .with_policy(policy);

    if all {
        let report = engine.deploy_all().await.into_diagnostic()?;

        for name in &report.succeeded {
            println!("{} {}", style("✓").green().bold(), style(name).cyan());
        }
        for (name, error) in &report.failed {
            println!(
                "{} {}: {}",
                style("✗").red().bold(),
                style(name).cyan(),
                error
            );
        }
        println!("Deployed: {}", report.summary());

        if !report.is_success() {
            return Err(miette::miette!(
                "{} application(s) failed to deploy",
                report.failed.len()
            ));
        }
        return Ok(());
    }

    let Some(id) = id else {
        return Err(miette::miette!("provide an application id or --all"));
    };

    engine.create_deployment(id).await.into_diagnostic()?;
    println!(
        "{} Deployed application {} to namespace {}",
        style("✓").green().bold(),
        style(id).cyan(),
        style(namespace).yellow()
    );
    Ok(())
}
