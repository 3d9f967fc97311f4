//! Status aggregation
//!
//! Reads cluster state and merges it with stored records to answer "what is
//! deployed and what is its live health". Both listings batch their cluster
//! reads: one Workload list and/or one Exposure list per aggregation pass,
//! indexed by name, instead of one lookup per row.

use std::collections::{HashMap, HashSet};

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Container;
use serde::{Deserialize, Serialize};

use dockyard_core::ApplicationStore;

use crate::DEFAULT_NAMESPACE;
use crate::error::Result;
use crate::gateway::ClusterGateway;

/// Read-only projection of a live Workload joined with Exposure presence
/// and, for the active listing, the stored record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDeploymentState {
    pub name: String,
    pub image: Option<String>,
    pub desired_replicas: i32,
    pub container_port: i32,
    pub service_enabled: bool,
    pub deployment_exists: bool,
    pub spec_replicas: i32,
    pub ready_replicas: i32,
    pub available_replicas: i32,
    pub updated_replicas: i32,
}

impl ClusterDeploymentState {
    /// A deployment is active iff it declares replicas or has some available
    pub fn is_active(&self) -> bool {
        self.spec_replicas > 0 || self.available_replicas > 0
    }
}

fn first_container(workload: &Deployment) -> Option<&Container> {
    workload
        .spec
        .as_ref()?
        .template
        .spec
        .as_ref()?
        .containers
        .first()
}

fn spec_replicas(workload: &Deployment) -> i32 {
    workload
        .spec
        .as_ref()
        .and_then(|s| s.replicas)
        .unwrap_or(0)
}

fn status_counts(workload: &Deployment) -> (i32, i32, i32) {
    let status = workload.status.as_ref();
    (
        status.and_then(|s| s.ready_replicas).unwrap_or(0),
        status.and_then(|s| s.available_replicas).unwrap_or(0),
        status.and_then(|s| s.updated_replicas).unwrap_or(0),
    )
}

/// Merges live cluster state with stored application records for reporting
pub struct StatusAggregator<S, G> {
    store: S,
    gateway: G,
    namespace: String,
}

impl<S: ApplicationStore, G: ClusterGateway> StatusAggregator<S, G> {
    /// Create an aggregator over the default namespace
    pub fn new(store: S, gateway: G) -> Self {
        Self {
            store,
            gateway,
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    /// Target a different namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// List every live Workload in the namespace with derived fields
    ///
    /// `service_enabled` comes from a single batched Exposure list indexed
    /// by name; `deployment_exists` is true for every row since the rows are
    /// sourced from live Workloads.
    pub async fn list_deployments(&self) -> Result<Vec<ClusterDeploymentState>> {
        let workloads = self.gateway.list_workloads(&self.namespace).await?;
        if workloads.is_empty() {
            return Ok(Vec::new());
        }

        let exposure_names: HashSet<String> = self
            .gateway
            .list_exposures(&self.namespace)
            .await?
            .into_iter()
            .filter_map(|svc| svc.metadata.name)
            .collect();

        Ok(workloads
            .iter()
            .map(|workload| {
                let name = workload.metadata.name.clone().unwrap_or_default();
                let container = first_container(workload);
                let container_port = container
                    .and_then(|c| c.ports.as_ref())
                    .and_then(|ports| ports.first())
                    .map(|p| p.container_port)
                    .unwrap_or(0);
                let replicas = spec_replicas(workload);
                let (ready, available, updated) = status_counts(workload);

                ClusterDeploymentState {
                    service_enabled: exposure_names.contains(&name),
                    name,
                    image: container.and_then(|c| c.image.clone()),
                    desired_replicas: replicas,
                    container_port,
                    deployment_exists: true,
                    spec_replicas: replicas,
                    ready_replicas: ready,
                    available_replicas: available,
                    updated_replicas: updated,
                }
            })
            .collect())
    }

    /// List stored applications that are live and active
    ///
    /// Joins stored records against a single batched Workload list indexed
    /// by name. Records with no live Workload are skipped; so are inactive
    /// ones (no declared replicas and none available). Descriptive fields
    /// come from the store on purpose, overriding live drift; only the
    /// activity test and the replica counts use cluster data.
    pub async fn list_active_deployments(&self) -> Result<Vec<ClusterDeploymentState>> {
        let apps = self.store.list().await?;

        let workloads: HashMap<String, Deployment> = self
            .gateway
            .list_workloads(&self.namespace)
            .await?
            .into_iter()
            .filter_map(|w| w.metadata.name.clone().map(|name| (name, w)))
            .collect();

        let mut states = Vec::new();
        for app in apps {
            let Some(workload) = workloads.get(&app.name) else {
                continue;
            };
            let replicas = spec_replicas(workload);
            let (ready, available, updated) = status_counts(workload);
            if replicas <= 0 && available <= 0 {
                continue;
            }

            states.push(ClusterDeploymentState {
                name: app.name,
                image: Some(app.image),
                desired_replicas: app.desired_replicas,
                container_port: app.container_port.unwrap_or(0),
                service_enabled: app.service_enabled,
                deployment_exists: true,
                spec_replicas: replicas,
                ready_replicas: ready,
                available_replicas: available,
                updated_replicas: updated,
            });
        }
        Ok(states)
    }
}
