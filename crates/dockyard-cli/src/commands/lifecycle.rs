//! Lifecycle commands - start, stop, restart, delete a deployed workload
//!
//! A missing workload is an ordinary negative outcome from the engine
//! (boolean false); here it renders as a styled message and a nonzero exit,
//! distinct from an unknown application id, which is an error.

use console::style;
use miette::{IntoDiagnostic, Result};
use uuid::Uuid;

use dockyard_kube::ReconciliationEngine;

use super::{connect, open_store};

pub enum Action {
    Start { replicas: i32 },
    Stop,
    Restart,
    Delete,
}

impl Action {
    fn past_tense(&self) -> &'static str {
        match self {
            Action::Start { .. } => "Scaled",
            Action::Stop => "Stopped",
            Action::Restart => "Restarted",
            Action::Delete => "Deleted",
        }
    }
}

pub async fn run(action: Action, id: Uuid, namespace: &str) -> Result<()> {
    let store = open_store()?;
    let gateway = connect().await?;

    let engine = ReconciliationEngine::new(store, gateway).with_namespace(namespace);

    let done = match action {
        Action::Start { replicas } => engine.start_deployment(id, replicas).await,
        Action::Stop => engine.stop_deployment(id).await,
        Action::Restart => engine.restart_deployment(id).await,
        Action::Delete => engine.delete_deployment(id).await,
    }
    .into_diagnostic()?;

    if !done {
        println!(
            "{} No workload deployed for application {}",
            style("✗").red().bold(),
            style(id).cyan()
        );
        return Err(miette::miette!("no workload deployed for application {id}"));
    }

    println!(
        "{} {} workload for application {}",
        style("✓").green().bold(),
        action.past_tense(),
        style(id).cyan()
    );
    Ok(())
}
