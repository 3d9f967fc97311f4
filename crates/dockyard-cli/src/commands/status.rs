//! Status command - live deployments, optionally joined with stored records

use console::style;
use miette::{IntoDiagnostic, Result};

use dockyard_kube::StatusAggregator;

use super::{connect, open_store};

pub async fn run(active: bool, json: bool, namespace: &str) -> Result<()> {
    let store = open_store()?;
    let gateway = connect().await?;

    let aggregator = StatusAggregator::new(store, gateway).with_namespace(namespace);
    let rows = if active {
        aggregator.list_active_deployments().await
    } else {
        aggregator.list_deployments().await
    }
    .into_diagnostic()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows).into_diagnostic()?);
        return Ok(());
    }

    if rows.is_empty() {
        if active {
            println!("No active deployments in namespace {namespace}");
        } else {
            println!("No deployments in namespace {namespace}");
        }
        return Ok(());
    }

    println!(
        "{:<20} {:<30} {:>6} {:>8} {:>7} {:>11} {:>9} {:<8}",
        style("NAME").bold(),
        style("IMAGE").bold(),
        style("PORT").bold(),
        style("DESIRED").bold(),
        style("READY").bold(),
        style("AVAILABLE").bold(),
        style("UPDATED").bold(),
        style("SERVICE").bold()
    );

    for row in rows {
        let ready = format!("{}/{}", row.ready_replicas, row.spec_replicas);
        let ready_style = if row.ready_replicas >= row.spec_replicas {
            style(ready).green()
        } else {
            style(ready).yellow()
        };

        println!(
            "{:<20} {:<30} {:>6} {:>8} {:>7} {:>11} {:>9} {:<8}",
            row.name,
            row.image.as_deref().unwrap_or("-"),
            row.container_port,
            row.desired_replicas,
            ready_style,
            row.available_replicas,
            row.updated_replicas,
            if row.service_enabled { "yes" } else { "no" }
        );
    }

    Ok(())
}
