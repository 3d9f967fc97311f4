//! Expose command - ensure a Service for an application

use console::style;
use miette::{IntoDiagnostic, Result};
use uuid::Uuid;

use dockyard_kube::ReconciliationEngine;

use super::{connect, open_store};

pub async fn run(id: Uuid, exposure_type: &str, namespace: &str) -> Result<()> {
    let store = open_store()?;
    let gateway = connect().await?;

    let engine = ReconciliationEngine::new(store, gateway).with_namespace(namespace);
    engine
        .expose_application(id, exposure_type)
        .await
        .into_diagnostic()?;

    println!(
        "{} Exposed application {} (type={})",
        style("✓").green().bold(),
        style(id).cyan(),
        style(exposure_type).yellow()
    );
    Ok(())
}
