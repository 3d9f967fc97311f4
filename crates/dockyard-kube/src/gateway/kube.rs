//! Kube-backed gateway driver

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams, PostParams};
use serde_json::json;

use super::ClusterGateway;
use crate::error::{ClusterError, Result};

/// Annotation kubectl sets to trigger a rolling restart
const RESTARTED_AT_ANNOTATION: &str = "kubectl.kubernetes.io/restartedAt";

/// Gateway driver over a live Kubernetes cluster
#[derive(Clone)]
pub struct KubeGateway {
    client: kube::Client,
}

impl KubeGateway {
    /// Create a gateway from the default kubeconfig/in-cluster config
    pub async fn try_default() -> Result<Self> {
        Ok(Self {
            client: kube::Client::try_default().await?,
        })
    }

    /// Create a gateway from an existing client
    pub fn with_client(client: kube::Client) -> Self {
        Self { client }
    }

    fn workloads(&self, namespace: &str) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn exposures(&self, namespace: &str) -> Api<Service> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Map the cluster's native 409 on create/replace to a deterministic conflict
fn conflict_on_409(err: kube::Error, kind: &str, name: &str, namespace: &str) -> ClusterError {
    match err {
        kube::Error::Api(resp) if resp.code == 409 => ClusterError::Conflict {
            kind: kind.to_string(),
            name: name.to_string(),
            namespace: namespace.to_string(),
        },
        other => ClusterError::Api(other),
    }
}

fn resource_name(metadata: &kube::api::ObjectMeta) -> String {
    metadata.name.clone().unwrap_or_default()
}

#[async_trait]
impl ClusterGateway for KubeGateway {
    async fn get_workload(&self, namespace: &str, name: &str) -> Result<Option<Deployment>> {
        Ok(self.workloads(namespace).get_opt(name).await?)
    }

    async fn list_workloads(&self, namespace: &str) -> Result<Vec<Deployment>> {
        let list = self
            .workloads(namespace)
            .list(&ListParams::default())
            .await?;
        Ok(list.items)
    }

    async fn create_workload(&self, namespace: &str, workload: &Deployment) -> Result<Deployment> {
        let name = resource_name(&workload.metadata);
        self.workloads(namespace)
            .create(&PostParams::default(), workload)
            .await
            .map_err(|e| conflict_on_409(e, "workload", &name, namespace))
    }

    async fn replace_workload(&self, namespace: &str, workload: &Deployment) -> Result<Deployment> {
        let name = resource_name(&workload.metadata);
        self.workloads(namespace)
            .replace(&name, &PostParams::default(), workload)
            .await
            .map_err(|e| conflict_on_409(e, "workload", &name, namespace))
    }

    async fn scale_workload(&self, namespace: &str, name: &str, replicas: i32) -> Result<()> {
        let patch = json!({ "spec": { "replicas": replicas } });
        self.workloads(namespace)
            .patch_scale(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    async fn restart_workload(&self, namespace: &str, name: &str) -> Result<()> {
        // Same template-annotation patch kubectl rollout restart issues;
        // replaces every pod without touching the replica count.
        let patch = json!({
            "spec": {
                "template": {
                    "metadata": {
                        "annotations": {
                            RESTARTED_AT_ANNOTATION: chrono::Utc::now().to_rfc3339(),
                        }
                    }
                }
            }
        });
        self.workloads(namespace)
            .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    async fn delete_workload(&self, namespace: &str, name: &str) -> Result<()> {
        self.workloads(namespace)
            .delete(name, &DeleteParams::default())
            .await?;
        Ok(())
    }

    async fn get_exposure(&self, namespace: &str, name: &str) -> Result<Option<Service>> {
        Ok(self.exposures(namespace).get_opt(name).await?)
    }

    async fn list_exposures(&self, namespace: &str) -> Result<Vec<Service>> {
        let list = self
            .exposures(namespace)
            .list(&ListParams::default())
            .await?;
        Ok(list.items)
    }

    async fn create_exposure(&self, namespace: &str, exposure: &Service) -> Result<Service> {
        let name = resource_name(&exposure.metadata);
        self.exposures(namespace)
            .create(&PostParams::default(), exposure)
            .await
            .map_err(|e| conflict_on_409(e, "exposure", &name, namespace))
    }

    async fn replace_exposure(&self, namespace: &str, exposure: &Service) -> Result<Service> {
        let name = resource_name(&exposure.metadata);
        self.exposures(namespace)
            .replace(&name, &PostParams::default(), exposure)
            .await
            .map_err(|e| conflict_on_409(e, "exposure", &name, namespace))
    }
}
