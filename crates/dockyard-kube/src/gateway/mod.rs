//! Cluster gateway boundary
//!
//! The gateway exposes the read/write primitives the engine needs against
//! the two resource kinds it manages:
//! - **Workload**: a Kubernetes `Deployment`
//! - **Exposure**: a Kubernetes `Service`
//!
//! Two drivers exist:
//! - [`KubeGateway`]: typed `kube` API calls against a live cluster
//! - [`MockGateway`]: in-memory cluster state for unit tests

mod kube;
mod mock;

pub use kube::KubeGateway;
pub use mock::{GatewayCounts, MockGateway};

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;

use crate::error::Result;

/// Read/list and write primitives against the cluster
///
/// Every call is attempted exactly once; there is no retry policy here or in
/// the callers. A create or replace losing a check-then-act race surfaces as
/// a deterministic `ClusterError::Conflict`.
#[async_trait]
pub trait ClusterGateway: Send + Sync {
    /// Fetch a Workload by name, `None` if absent
    async fn get_workload(&self, namespace: &str, name: &str) -> Result<Option<Deployment>>;

    /// List every Workload in the namespace
    async fn list_workloads(&self, namespace: &str) -> Result<Vec<Deployment>>;

    /// Create a Workload; conflicts if one with the same name exists
    async fn create_workload(&self, namespace: &str, workload: &Deployment) -> Result<Deployment>;

    /// Replace an existing Workload wholesale
    async fn replace_workload(&self, namespace: &str, workload: &Deployment) -> Result<Deployment>;

    /// Scale a Workload to the given replica count
    async fn scale_workload(&self, namespace: &str, name: &str, replicas: i32) -> Result<()>;

    /// Trigger a rolling restart of a Workload, preserving its replica count
    async fn restart_workload(&self, namespace: &str, name: &str) -> Result<()>;

    /// Delete a Workload (never cascades to its Exposure)
    async fn delete_workload(&self, namespace: &str, name: &str) -> Result<()>;

    /// Fetch an Exposure by name, `None` if absent
    async fn get_exposure(&self, namespace: &str, name: &str) -> Result<Option<Service>>;

    /// List every Exposure in the namespace
    async fn list_exposures(&self, namespace: &str) -> Result<Vec<Service>>;

    /// Create an Exposure; conflicts if one with the same name exists
    async fn create_exposure(&self, namespace: &str, exposure: &Service) -> Result<Service>;

    /// Replace an existing Exposure wholesale
    async fn replace_exposure(&self, namespace: &str, exposure: &Service) -> Result<Service>;
}
