//! Reconciliation engine
//!
//! Maps stored application records into cluster resources in single
//! synchronous passes. There is no background loop and no watch: every
//! reconciling action here is triggered by one inbound call and performs
//! exactly one pass.
//!
//! Lifecycle operations against a name with no live Workload return
//! `Ok(false)` rather than an error, so callers can distinguish "application
//! record unknown" (an error) from "application known, nothing deployed yet"
//! (an ordinary negative result).

use tracing::{debug, info};
use uuid::Uuid;

use dockyard_core::{ApplicationSpec, ApplicationStore, CoreError};

use crate::error::Result;
use crate::gateway::ClusterGateway;
use crate::manifest::{exposure_manifest, merged_exposure, workload_manifest};
use crate::{DEFAULT_EXPOSURE_TYPE, DEFAULT_NAMESPACE};

/// What a deploy pass does when a Workload with the application's name
/// already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkloadApplyPolicy {
    /// Silently leave the existing Workload untouched (the compatibility
    /// behavior of the system Dockyard replaces: create-only, drift is
    /// never reconciled)
    #[default]
    CreateOnly,

    /// Replace the existing Workload with the manifest built from the
    /// current record, like the Exposure path does
    Upsert,
}

/// Per-application outcome of a deploy-all pass
///
/// A failure on one application never aborts the remaining iteration; the
/// aggregate outcome is observable per item.
#[derive(Debug, Clone, Default)]
pub struct DeployAllReport {
    /// Application names deployed (or already present) without error
    pub succeeded: Vec<String>,
    /// Application names with the error that stopped them
    pub failed: Vec<(String, String)>,
}

impl DeployAllReport {
    /// Check if every application deployed cleanly
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Total applications visited
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Format as a human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "{} succeeded, {} failed",
            self.succeeded.len(),
            self.failed.len()
        )
    }
}

/// One-shot reconciliation of application records against the cluster
pub struct ReconciliationEngine<S, G> {
    store: S,
    gateway: G,
    namespace: String,
    policy: WorkloadApplyPolicy,
}

impl<S: ApplicationStore, G: ClusterGateway> ReconciliationEngine<S, G> {
    /// Create an engine over the default namespace with the create-only policy
    pub fn new(store: S, gateway: G) -> Self {
        Self {
            store,
            gateway,
            namespace: DEFAULT_NAMESPACE.to_string(),
            policy: WorkloadApplyPolicy::default(),
        }
    }

    /// Target a different namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Change the apply policy for existing Workloads
    pub fn with_policy(mut self, policy: WorkloadApplyPolicy) -> Self {
        self.policy = policy;
        self
    }

    async fn resolve(&self, id: Uuid) -> Result<ApplicationSpec> {
        Ok(self.store.get(id).await?)
    }

    async fn workload_exists(&self, name: &str) -> Result<bool> {
        Ok(self.gateway.get_workload(&self.namespace, name).await?.is_some())
    }

    /// Deploy an application: ensure its Workload and, when the record asks
    /// for it, its Exposure
    ///
    /// Fails before any cluster call if the record is missing or its image
    /// is empty. If the Exposure step fails after the Workload was created,
    /// the Workload is left in place: partial success is the contract, there
    /// is no compensating rollback.
    pub async fn create_deployment(&self, id: Uuid) -> Result<()> {
        let app = self.resolve(id).await?;

        if app.image.is_empty() {
            return Err(CoreError::invalid_argument("application image must be provided").into());
        }

        if let Some(existing) = self.gateway.get_workload(&self.namespace, &app.name).await? {
            match self.policy {
                WorkloadApplyPolicy::CreateOnly => {
                    info!(app = %app.name, "workload already exists, leaving untouched");
                    return Ok(());
                }
                WorkloadApplyPolicy::Upsert => {
                    info!(app = %app.name, "workload already exists, replacing");
                    let mut manifest = workload_manifest(&app);
                    manifest.metadata.resource_version = existing.metadata.resource_version;
                    self.gateway
                        .replace_workload(&self.namespace, &manifest)
                        .await?;
                    if app.service_enabled {
                        self.ensure_exposure(&app, None).await?;
                    }
                    return Ok(());
                }
            }
        }

        let manifest = workload_manifest(&app);
        self.gateway
            .create_workload(&self.namespace, &manifest)
            .await?;
        info!(app = %app.name, replicas = app.desired_replicas, "workload created");

        if !app.service_enabled {
            return Ok(());
        }
        self.ensure_exposure(&app, None).await
    }

    /// Ensure an Exposure of the given type for an application
    pub async fn expose_application(&self, id: Uuid, exposure_type: &str) -> Result<()> {
        let app = self.resolve(id).await?;
        self.ensure_exposure(&app, Some(exposure_type)).await
    }

    /// Exposure upsert shared by the deploy and expose paths
    ///
    /// Create if absent, otherwise a wholesale replace of labels, type,
    /// port list and selector. A `None` type keeps the live Exposure's type
    /// (ClusterIP for a fresh one), so a redeploy never downgrades a
    /// NodePort set through the expose path. A concurrent create between
    /// the existence check and the create call surfaces as a deterministic
    /// conflict.
    async fn ensure_exposure(&self, app: &ApplicationSpec, exposure_type: Option<&str>) -> Result<()> {
        if app.container_port.is_none() {
            return Err(CoreError::invalid_argument(
                "application container port must be set to expose it",
            )
            .into());
        }

        match self.gateway.get_exposure(&self.namespace, &app.name).await? {
            None => {
                let requested = exposure_type.unwrap_or(DEFAULT_EXPOSURE_TYPE);
                let manifest = exposure_manifest(app, requested);
                self.gateway
                    .create_exposure(&self.namespace, &manifest)
                    .await?;
                info!(app = %app.name, r#type = requested, "exposure created");
            }
            Some(existing) => {
                let requested = exposure_type
                    .or_else(|| existing.spec.as_ref().and_then(|s| s.type_.as_deref()))
                    .unwrap_or(DEFAULT_EXPOSURE_TYPE);
                let manifest = merged_exposure(&existing, app, requested);
                self.gateway
                    .replace_exposure(&self.namespace, &manifest)
                    .await?;
                info!(app = %app.name, r#type = requested, "exposure updated");
            }
        }
        Ok(())
    }

    /// Scale the application's Workload to `replicas`
    ///
    /// `Ok(false)` if no Workload exists by that name.
    pub async fn start_deployment(&self, id: Uuid, replicas: i32) -> Result<bool> {
        if replicas < 0 {
            return Err(CoreError::invalid_argument("replicas must be >= 0").into());
        }
        let app = self.resolve(id).await?;
        if !self.workload_exists(&app.name).await? {
            return Ok(false);
        }
        self.gateway
            .scale_workload(&self.namespace, &app.name, replicas)
            .await?;
        info!(app = %app.name, replicas, "workload scaled");
        Ok(true)
    }

    /// Scale the application's Workload to zero
    pub async fn stop_deployment(&self, id: Uuid) -> Result<bool> {
        let app = self.resolve(id).await?;
        if !self.workload_exists(&app.name).await? {
            return Ok(false);
        }
        self.gateway
            .scale_workload(&self.namespace, &app.name, 0)
            .await?;
        info!(app = %app.name, "workload stopped");
        Ok(true)
    }

    /// Rolling-restart the application's Workload, keeping its replica count
    pub async fn restart_deployment(&self, id: Uuid) -> Result<bool> {
        let app = self.resolve(id).await?;
        if !self.workload_exists(&app.name).await? {
            return Ok(false);
        }
        self.gateway
            .restart_workload(&self.namespace, &app.name)
            .await?;
        info!(app = %app.name, "workload restarted");
        Ok(true)
    }

    /// Delete the application's Workload; its Exposure is never cascaded
    pub async fn delete_deployment(&self, id: Uuid) -> Result<bool> {
        let app = self.resolve(id).await?;
        if !self.workload_exists(&app.name).await? {
            return Ok(false);
        }
        self.gateway
            .delete_workload(&self.namespace, &app.name)
            .await?;
        info!(app = %app.name, "workload deleted");
        Ok(true)
    }

    /// Deploy every stored application sequentially, collecting per-item
    /// outcomes instead of aborting on the first failure
    pub async fn deploy_all(&self) -> Result<DeployAllReport> {
        let apps = self.store.list().await?;
        let mut report = DeployAllReport::default();

        for app in apps {
            debug!(app = %app.name, "deploying");
            match self.create_deployment(app.id).await {
                Ok(()) => report.succeeded.push(app.name),
                Err(e) => report.failed.push((app.name, e.to_string())),
            }
        }

        info!(outcome = %report.summary(), "deploy-all pass finished");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClusterError;
    use crate::gateway::MockGateway;
    use dockyard_core::{MemoryStore, NewApplication};
    use serde_json::json;

    fn engine(store: MemoryStore, gateway: MockGateway) -> ReconciliationEngine<MemoryStore, MockGateway> {
        ReconciliationEngine::new(store, gateway)
    }

    async fn stored_web_app(store: &MemoryStore) -> ApplicationSpec {
        store
            .create(NewApplication {
                desired_replicas: Some(2),
                container_port: Some(80),
                service_enabled: Some(true),
                env: Some(json!({"MODE": "prod"})),
                ..NewApplication::new("web", "nginx:1.25")
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn deploy_builds_workload_and_exposure() {
        let store = MemoryStore::new();
        let gateway = MockGateway::new();
        let app = stored_web_app(&store).await;

        engine(store, gateway.clone())
            .create_deployment(app.id)
            .await
            .unwrap();

        let workload = gateway.workload(DEFAULT_NAMESPACE, "web").unwrap();
        let spec = workload.spec.unwrap();
        assert_eq!(spec.replicas, Some(2));
        let container = &spec.template.spec.unwrap().containers[0];
        assert_eq!(container.name, "web");
        assert_eq!(container.image.as_deref(), Some("nginx:1.25"));
        assert_eq!(container.ports.as_ref().unwrap()[0].container_port, 80);
        let resources = container.resources.as_ref().unwrap();
        assert_eq!(
            resources.limits.as_ref().unwrap().get("memory").unwrap().0,
            "128Mi"
        );
        assert_eq!(
            resources.requests.as_ref().unwrap().get("cpu").unwrap().0,
            "250m"
        );

        let exposure = gateway.exposure(DEFAULT_NAMESPACE, "web").unwrap();
        let spec = exposure.spec.unwrap();
        assert_eq!(spec.type_.as_deref(), Some("ClusterIP"));
        let port = &spec.ports.unwrap()[0];
        assert_eq!(port.port, 80);
        assert_eq!(
            port.target_port,
            Some(k8s_openapi::apimachinery::pkg::util::intstr::IntOrString::Int(80))
        );
    }

    #[tokio::test]
    async fn deploy_twice_is_a_noop_under_create_only() {
        let store = MemoryStore::new();
        let gateway = MockGateway::new();
        let app = stored_web_app(&store).await;

        let engine = engine(store, gateway.clone());
        engine.create_deployment(app.id).await.unwrap();
        engine.create_deployment(app.id).await.unwrap();

        assert_eq!(gateway.counts().workload_creates, 1);
    }

    #[tokio::test]
    async fn deploy_replaces_under_upsert() {
        let store = MemoryStore::new();
        let gateway = MockGateway::new();
        let app = stored_web_app(&store).await;

        let engine =
            ReconciliationEngine::new(store.clone(), gateway.clone()).with_policy(WorkloadApplyPolicy::Upsert);
        engine.create_deployment(app.id).await.unwrap();

        store
            .update(app.id, NewApplication::new("web", "nginx:1.26"))
            .await
            .unwrap();
        engine.create_deployment(app.id).await.unwrap();

        assert_eq!(gateway.counts().workload_replaces, 1);
        let workload = gateway.workload(DEFAULT_NAMESPACE, "web").unwrap();
        let container = &workload.spec.unwrap().template.spec.unwrap().containers[0];
        assert_eq!(container.image.as_deref(), Some("nginx:1.26"));
    }

    #[tokio::test]
    async fn deploy_rejects_empty_image_before_any_cluster_call() {
        let store = MemoryStore::new();
        let gateway = MockGateway::new();
        let app = store.create(NewApplication::new("web", "")).await.unwrap();

        let err = engine(store, gateway.clone())
            .create_deployment(app.id)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ClusterError::Application(CoreError::InvalidArgument { .. })
        ));
        assert_eq!(gateway.counts().workload_gets, 0);
        assert_eq!(gateway.counts().workload_creates, 0);
    }

    #[tokio::test]
    async fn deploy_skips_exposure_when_disabled() {
        let store = MemoryStore::new();
        let gateway = MockGateway::new();
        let app = store
            .create(NewApplication::new("batch", "worker:1"))
            .await
            .unwrap();

        engine(store, gateway.clone())
            .create_deployment(app.id)
            .await
            .unwrap();

        assert!(gateway.workload(DEFAULT_NAMESPACE, "batch").is_some());
        assert!(gateway.exposure(DEFAULT_NAMESPACE, "batch").is_none());
    }

    #[tokio::test]
    async fn unknown_application_is_a_lookup_failure() {
        let store = MemoryStore::new();
        let gateway = MockGateway::new();

        let err = engine(store, gateway)
            .create_deployment(Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(err.is_application_not_found());
    }

    #[tokio::test]
    async fn expose_updates_existing_exposure_in_full() {
        let store = MemoryStore::new();
        let gateway = MockGateway::new();
        let app = stored_web_app(&store).await;

        let engine = engine(store, gateway.clone());
        engine.create_deployment(app.id).await.unwrap();

        // second port added out of band; the upsert must discard it
        let mut live = gateway.exposure(DEFAULT_NAMESPACE, "web").unwrap();
        live.spec.as_mut().unwrap().ports.as_mut().unwrap().push(
            k8s_openapi::api::core::v1::ServicePort {
                name: Some("metrics".to_string()),
                port: 9090,
                ..Default::default()
            },
        );
        gateway.insert_exposure(DEFAULT_NAMESPACE, live);

        engine.expose_application(app.id, "NodePort").await.unwrap();

        let exposure = gateway.exposure(DEFAULT_NAMESPACE, "web").unwrap();
        let spec = exposure.spec.unwrap();
        assert_eq!(spec.type_.as_deref(), Some("NodePort"));
        assert_eq!(spec.ports.unwrap().len(), 1);
        assert_eq!(gateway.counts().exposure_replaces, 1);
    }

    #[tokio::test]
    async fn deploy_surfaces_conflict_from_a_racing_creator() {
        let store = MemoryStore::new();
        let gateway = MockGateway::new();
        let app = stored_web_app(&store).await;

        // a concurrent creator wins between the existence check and create
        gateway.force_workload_create_conflict();
        let err = engine(store, gateway)
            .create_deployment(app.id)
            .await
            .unwrap_err();

        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn exposure_race_leaves_the_workload_in_place() {
        let store = MemoryStore::new();
        let gateway = MockGateway::new();
        let app = stored_web_app(&store).await;

        gateway.force_exposure_create_conflict();
        let err = engine(store, gateway.clone())
            .create_deployment(app.id)
            .await
            .unwrap_err();

        assert!(err.is_conflict());
        // partial success: no compensating workload delete
        assert!(gateway.workload(DEFAULT_NAMESPACE, "web").is_some());
        assert!(gateway.exposure(DEFAULT_NAMESPACE, "web").is_none());
    }

    #[tokio::test]
    async fn upsert_redeploy_keeps_the_exposure_type() {
        let store = MemoryStore::new();
        let gateway = MockGateway::new();
        let app = stored_web_app(&store).await;

        let engine = ReconciliationEngine::new(store, gateway.clone())
            .with_policy(WorkloadApplyPolicy::Upsert);
        engine.create_deployment(app.id).await.unwrap();
        engine.expose_application(app.id, "NodePort").await.unwrap();
        engine.create_deployment(app.id).await.unwrap();

        let exposure = gateway.exposure(DEFAULT_NAMESPACE, "web").unwrap();
        assert_eq!(exposure.spec.unwrap().type_.as_deref(), Some("NodePort"));
    }

    #[tokio::test]
    async fn expose_rejects_a_record_without_a_port() {
        let gateway = MockGateway::new();
        let mut record = ApplicationSpec::from_request(NewApplication::new("web", "nginx:1.25"));
        record.container_port = None;
        let id = record.id;
        let store = MemoryStore::with_records(vec![record]);

        let err = engine(store, gateway.clone())
            .expose_application(id, "ClusterIP")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ClusterError::Application(CoreError::InvalidArgument { .. })
        ));
        assert_eq!(gateway.counts().exposure_creates, 0);
    }

    #[tokio::test]
    async fn lifecycle_against_missing_workload_returns_false() {
        let store = MemoryStore::new();
        let gateway = MockGateway::new();
        let app = stored_web_app(&store).await;

        let engine = engine(store, gateway.clone());
        assert!(!engine.start_deployment(app.id, 3).await.unwrap());
        assert!(!engine.stop_deployment(app.id).await.unwrap());
        assert!(!engine.restart_deployment(app.id).await.unwrap());
        assert!(!engine.delete_deployment(app.id).await.unwrap());

        let counts = gateway.counts();
        assert_eq!(counts.workload_scales, 0);
        assert_eq!(counts.workload_restarts, 0);
        assert_eq!(counts.workload_deletes, 0);
    }

    #[tokio::test]
    async fn start_scales_and_rejects_negative_replicas() {
        let store = MemoryStore::new();
        let gateway = MockGateway::new();
        let app = stored_web_app(&store).await;

        let engine = engine(store, gateway.clone());
        engine.create_deployment(app.id).await.unwrap();

        assert!(engine.start_deployment(app.id, 5).await.unwrap());
        let workload = gateway.workload(DEFAULT_NAMESPACE, "web").unwrap();
        assert_eq!(workload.spec.unwrap().replicas, Some(5));

        let err = engine.start_deployment(app.id, -1).await.unwrap_err();
        assert!(matches!(
            err,
            ClusterError::Application(CoreError::InvalidArgument { .. })
        ));
    }

    #[tokio::test]
    async fn stop_scales_to_zero() {
        let store = MemoryStore::new();
        let gateway = MockGateway::new();
        let app = stored_web_app(&store).await;

        let engine = engine(store, gateway.clone());
        engine.create_deployment(app.id).await.unwrap();
        assert!(engine.stop_deployment(app.id).await.unwrap());

        let workload = gateway.workload(DEFAULT_NAMESPACE, "web").unwrap();
        assert_eq!(workload.spec.unwrap().replicas, Some(0));
    }

    #[tokio::test]
    async fn restart_preserves_replica_count() {
        let store = MemoryStore::new();
        let gateway = MockGateway::new();
        let app = stored_web_app(&store).await;

        let engine = engine(store, gateway.clone());
        engine.create_deployment(app.id).await.unwrap();
        assert!(engine.restart_deployment(app.id).await.unwrap());

        let workload = gateway.workload(DEFAULT_NAMESPACE, "web").unwrap();
        let spec = workload.spec.unwrap();
        assert_eq!(spec.replicas, Some(2));
        assert!(
            spec.template
                .metadata
                .unwrap()
                .annotations
                .unwrap()
                .contains_key("kubectl.kubernetes.io/restartedAt")
        );
    }

    #[tokio::test]
    async fn delete_leaves_the_exposure_in_place() {
        let store = MemoryStore::new();
        let gateway = MockGateway::new();
        let app = stored_web_app(&store).await;

        let engine = engine(store, gateway.clone());
        engine.create_deployment(app.id).await.unwrap();
        assert!(engine.delete_deployment(app.id).await.unwrap());

        assert!(gateway.workload(DEFAULT_NAMESPACE, "web").is_none());
        assert!(gateway.exposure(DEFAULT_NAMESPACE, "web").is_some());
    }

    #[tokio::test]
    async fn deploy_all_collects_per_item_failures() {
        let store = MemoryStore::new();
        let gateway = MockGateway::new();
        stored_web_app(&store).await;
        store
            .create(NewApplication::new("broken", ""))
            .await
            .unwrap();
        store
            .create(NewApplication::new("api", "api:2.0"))
            .await
            .unwrap();

        let report = engine(store, gateway.clone()).deploy_all().await.unwrap();

        assert!(!report.is_success());
        assert_eq!(report.total(), 3);
        assert_eq!(report.succeeded.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "broken");

        // the failure neither aborted nor rolled back the others
        assert!(gateway.workload(DEFAULT_NAMESPACE, "web").is_some());
        assert!(gateway.workload(DEFAULT_NAMESPACE, "api").is_some());
    }
}
