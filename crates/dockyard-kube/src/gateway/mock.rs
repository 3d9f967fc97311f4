//! Mock gateway driver for testing
//!
//! Holds cluster state in memory, useful for unit tests without a real
//! cluster. Mirrors the cluster's native semantics: create conflicts when
//! the name is taken, writes against a missing resource surface as 404s.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use super::ClusterGateway;
use crate::error::{ClusterError, Result};

/// In-memory gateway driver for testing
#[derive(Clone, Default)]
pub struct MockGateway {
    /// namespace -> name -> workload
    workloads: Arc<RwLock<BTreeMap<String, BTreeMap<String, Deployment>>>>,
    /// namespace -> name -> exposure
    exposures: Arc<RwLock<BTreeMap<String, BTreeMap<String, Service>>>>,
    /// Track operation counts for assertions
    counts: Arc<RwLock<GatewayCounts>>,
    /// One-shot forced failures
    forced: Arc<RwLock<ForcedConflicts>>,
}

/// One-shot switches making the next create conflict, simulating a
/// concurrent creator winning the race after the caller's existence check
#[derive(Debug, Default)]
struct ForcedConflicts {
    workload_create: bool,
    exposure_create: bool,
}

/// Counts of gateway operations performed, for testing assertions
#[derive(Debug, Default, Clone)]
pub struct GatewayCounts {
    pub workload_gets: usize,
    pub workload_lists: usize,
    pub workload_creates: usize,
    pub workload_replaces: usize,
    pub workload_scales: usize,
    pub workload_restarts: usize,
    pub workload_deletes: usize,
    pub exposure_gets: usize,
    pub exposure_lists: usize,
    pub exposure_creates: usize,
    pub exposure_replaces: usize,
}

fn not_found(kind: &str, name: &str, namespace: &str) -> ClusterError {
    ClusterError::Api(kube::Error::Api(kube::core::ErrorResponse {
        status: "Failure".to_string(),
        message: format!("{kind} \"{name}\" not found in namespace \"{namespace}\""),
        reason: "NotFound".to_string(),
        code: 404,
    }))
}

impl MockGateway {
    /// Create a new empty mock cluster
    pub fn new() -> Self {
        Self::default()
    }

    /// Get operation counts for assertions
    pub fn counts(&self) -> GatewayCounts {
        self.counts.read().unwrap().clone()
    }

    /// Seed a workload directly into the mock cluster
    pub fn insert_workload(&self, namespace: &str, workload: Deployment) {
        let name = workload.metadata.name.clone().unwrap_or_default();
        self.workloads
            .write()
            .unwrap()
            .entry(namespace.to_string())
            .or_default()
            .insert(name, workload);
    }

    /// Seed an exposure directly into the mock cluster
    pub fn insert_exposure(&self, namespace: &str, exposure: Service) {
        let name = exposure.metadata.name.clone().unwrap_or_default();
        self.exposures
            .write()
            .unwrap()
            .entry(namespace.to_string())
            .or_default()
            .insert(name, exposure);
    }

    /// Fetch a workload without counting the access (for assertions)
    pub fn workload(&self, namespace: &str, name: &str) -> Option<Deployment> {
        self.workloads
            .read()
            .unwrap()
            .get(namespace)
            .and_then(|ns| ns.get(name))
            .cloned()
    }

    /// Fetch an exposure without counting the access (for assertions)
    pub fn exposure(&self, namespace: &str, name: &str) -> Option<Service> {
        self.exposures
            .read()
            .unwrap()
            .get(namespace)
            .and_then(|ns| ns.get(name))
            .cloned()
    }

    /// Make the next workload create conflict regardless of stored state
    pub fn force_workload_create_conflict(&self) {
        self.forced.write().unwrap().workload_create = true;
    }

    /// Make the next exposure create conflict regardless of stored state
    pub fn force_exposure_create_conflict(&self) {
        self.forced.write().unwrap().exposure_create = true;
    }

    /// Overwrite the status counters of a seeded workload
    pub fn set_workload_status(
        &self,
        namespace: &str,
        name: &str,
        ready: i32,
        available: i32,
        updated: i32,
    ) {
        let mut workloads = self.workloads.write().unwrap();
        if let Some(workload) = workloads
            .get_mut(namespace)
            .and_then(|ns| ns.get_mut(name))
        {
            let status = workload.status.get_or_insert_with(Default::default);
            status.ready_replicas = Some(ready);
            status.available_replicas = Some(available);
            status.updated_replicas = Some(updated);
        }
    }
}

#[async_trait]
impl ClusterGateway for MockGateway {
    async fn get_workload(&self, namespace: &str, name: &str) -> Result<Option<Deployment>> {
        self.counts.write().unwrap().workload_gets += 1;
        Ok(self.workload(namespace, name))
    }

    async fn list_workloads(&self, namespace: &str) -> Result<Vec<Deployment>> {
        self.counts.write().unwrap().workload_lists += 1;
        Ok(self
            .workloads
            .read()
            .unwrap()
            .get(namespace)
            .map(|ns| ns.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn create_workload(&self, namespace: &str, workload: &Deployment) -> Result<Deployment> {
        self.counts.write().unwrap().workload_creates += 1;

        let name = workload.metadata.name.clone().unwrap_or_default();
        let forced = std::mem::take(&mut self.forced.write().unwrap().workload_create);
        let mut workloads = self.workloads.write().unwrap();
        let ns = workloads.entry(namespace.to_string()).or_default();
        if forced || ns.contains_key(&name) {
            return Err(ClusterError::Conflict {
                kind: "workload".to_string(),
                name,
                namespace: namespace.to_string(),
            });
        }
        ns.insert(name, workload.clone());
        Ok(workload.clone())
    }

    async fn replace_workload(&self, namespace: &str, workload: &Deployment) -> Result<Deployment> {
        self.counts.write().unwrap().workload_replaces += 1;

        let name = workload.metadata.name.clone().unwrap_or_default();
        let mut workloads = self.workloads.write().unwrap();
        let ns = workloads.entry(namespace.to_string()).or_default();
        if !ns.contains_key(&name) {
            return Err(not_found("workload", &name, namespace));
        }
        ns.insert(name, workload.clone());
        Ok(workload.clone())
    }

    async fn scale_workload(&self, namespace: &str, name: &str, replicas: i32) -> Result<()> {
        self.counts.write().unwrap().workload_scales += 1;

        let mut workloads = self.workloads.write().unwrap();
        let workload = workloads
            .get_mut(namespace)
            .and_then(|ns| ns.get_mut(name))
            .ok_or_else(|| not_found("workload", name, namespace))?;
        workload
            .spec
            .get_or_insert_with(Default::default)
            .replicas = Some(replicas);
        Ok(())
    }

    async fn restart_workload(&self, namespace: &str, name: &str) -> Result<()> {
        self.counts.write().unwrap().workload_restarts += 1;

        let mut workloads = self.workloads.write().unwrap();
        let workload = workloads
            .get_mut(namespace)
            .and_then(|ns| ns.get_mut(name))
            .ok_or_else(|| not_found("workload", name, namespace))?;
        let template = &mut workload.spec.get_or_insert_with(Default::default).template;
        template
            .metadata
            .get_or_insert_with(Default::default)
            .annotations
            .get_or_insert_with(Default::default)
            .insert(
                "kubectl.kubernetes.io/restartedAt".to_string(),
                chrono::Utc::now().to_rfc3339(),
            );
        Ok(())
    }

    async fn delete_workload(&self, namespace: &str, name: &str) -> Result<()> {
        self.counts.write().unwrap().workload_deletes += 1;

        let mut workloads = self.workloads.write().unwrap();
        workloads
            .get_mut(namespace)
            .and_then(|ns| ns.remove(name))
            .map(|_| ())
            .ok_or_else(|| not_found("workload", name, namespace))
    }

    async fn get_exposure(&self, namespace: &str, name: &str) -> Result<Option<Service>> {
        self.counts.write().unwrap().exposure_gets += 1;
        Ok(self.exposure(namespace, name))
    }

    async fn list_exposures(&self, namespace: &str) -> Result<Vec<Service>> {
        self.counts.write().unwrap().exposure_lists += 1;
        Ok(self
            .exposures
            .read()
            .unwrap()
            .get(namespace)
            .map(|ns| ns.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn create_exposure(&self, namespace: &str, exposure: &Service) -> Result<Service> {
        self.counts.write().unwrap().exposure_creates += 1;

        let name = exposure.metadata.name.clone().unwrap_or_default();
        let forced = std::mem::take(&mut self.forced.write().unwrap().exposure_create);
        let mut exposures = self.exposures.write().unwrap();
        let ns = exposures.entry(namespace.to_string()).or_default();
        if forced || ns.contains_key(&name) {
            return Err(ClusterError::Conflict {
                kind: "exposure".to_string(),
                name,
                namespace: namespace.to_string(),
            });
        }
        ns.insert(name, exposure.clone());
        Ok(exposure.clone())
    }

    async fn replace_exposure(&self, namespace: &str, exposure: &Service) -> Result<Service> {
        self.counts.write().unwrap().exposure_replaces += 1;

        let name = exposure.metadata.name.clone().unwrap_or_default();
        let mut exposures = self.exposures.write().unwrap();
        let ns = exposures.entry(namespace.to_string()).or_default();
        if !ns.contains_key(&name) {
            return Err(not_found("exposure", &name, namespace));
        }
        ns.insert(name, exposure.clone());
        Ok(exposure.clone())
    }
}
