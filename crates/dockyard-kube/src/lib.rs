//! Dockyard Kube - Kubernetes integration for Dockyard
//!
//! This crate provides:
//! - **Cluster Gateway**: read/write primitives for Workloads (Deployments)
//!   and Exposures (Services), with a kube-backed driver and a test double
//! - **Reconciliation Engine**: one-shot passes mapping application records
//!   into cluster resources (create, expose, scale, restart, delete)
//! - **Status Aggregation**: live cluster state merged with stored records

pub mod error;
pub mod gateway;
pub mod manifest;
pub mod reconciler;
pub mod status;

pub use error::{ClusterError, Result};
pub use gateway::{ClusterGateway, GatewayCounts, KubeGateway, MockGateway};
pub use manifest::{exposure_manifest, merged_exposure, workload_manifest};
pub use reconciler::{DeployAllReport, ReconciliationEngine, WorkloadApplyPolicy};
pub use status::{ClusterDeploymentState, StatusAggregator};

/// Namespace used when none is configured
pub const DEFAULT_NAMESPACE: &str = "default";

/// Exposure type applied when the requested type is blank
pub const DEFAULT_EXPOSURE_TYPE: &str = "ClusterIP";
