//! Manifest construction
//!
//! Maps an application record into the Workload (Deployment) and Exposure
//! (Service) manifests a reconciliation pass applies. The shapes here are a
//! compatibility contract: one pod template with one container, exposure
//! with a single TCP port named "http", selector and labels `{app: name}`.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, PodSpec, PodTemplateSpec, ResourceRequirements, Service,
    ServicePort, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::ObjectMeta;

use dockyard_core::{ApplicationSpec, ResourceSizing, env_pairs};

use crate::DEFAULT_EXPOSURE_TYPE;

/// Label key joining Workloads, pods, and Exposures to an application
pub const APP_LABEL: &str = "app";

fn app_labels(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(APP_LABEL.to_string(), name.to_string())])
}

/// Container resource shaping: ram as a memory *limit* only, cpu as a
/// *request* only. No memory request and no cpu limit are set.
///
/// This asymmetric shape is inherited from the system Dockyard replaces and
/// is kept for compatibility; it is pinned by tests, not an accident.
pub fn shaped_resources(sizing: &ResourceSizing) -> ResourceRequirements {
    ResourceRequirements {
        limits: Some(BTreeMap::from([(
            "memory".to_string(),
            Quantity(sizing.ram.clone()),
        )])),
        requests: Some(BTreeMap::from([(
            "cpu".to_string(),
            Quantity(sizing.cpu.clone()),
        )])),
        ..Default::default()
    }
}

/// Resolve the effective exposure type: blank input falls back to ClusterIP
pub fn effective_exposure_type(exposure_type: &str) -> &str {
    if exposure_type.trim().is_empty() {
        DEFAULT_EXPOSURE_TYPE
    } else {
        exposure_type
    }
}

/// Build the Workload manifest for an application record
///
/// One pod template with a single container named after the application,
/// replicas from `desired_replicas`, env from the record's JSON object, and
/// resources via [`shaped_resources`].
pub fn workload_manifest(app: &ApplicationSpec) -> Deployment {
    let env: Vec<EnvVar> = env_pairs(Some(&app.env))
        .into_iter()
        .map(|(name, value)| EnvVar {
            name,
            value: Some(value),
            ..Default::default()
        })
        .collect();

    let container = Container {
        name: app.name.clone(),
        image: Some(app.image.clone()),
        ports: app.container_port.map(|port| {
            vec![ContainerPort {
                container_port: port,
                ..Default::default()
            }]
        }),
        env: if env.is_empty() { None } else { Some(env) },
        resources: Some(shaped_resources(&app.resources)),
        ..Default::default()
    };

    Deployment {
        metadata: ObjectMeta {
            name: Some(app.name.clone()),
            labels: Some(app_labels(&app.name)),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(app.desired_replicas),
            selector: LabelSelector {
                match_labels: Some(app_labels(&app.name)),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(app_labels(&app.name)),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![container],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn exposure_port(app: &ApplicationSpec) -> ServicePort {
    let port = app.container_port.unwrap_or_default();
    ServicePort {
        name: Some("http".to_string()),
        protocol: Some("TCP".to_string()),
        port,
        target_port: Some(IntOrString::Int(port)),
        ..Default::default()
    }
}

/// Build a fresh Exposure manifest for an application record
pub fn exposure_manifest(app: &ApplicationSpec, exposure_type: &str) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(app.name.clone()),
            labels: Some(app_labels(&app.name)),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some(effective_exposure_type(exposure_type).to_string()),
            selector: Some(app_labels(&app.name)),
            ports: Some(vec![exposure_port(app)]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Merge the application's exposure shape onto an existing Exposure
///
/// This is a full replace, not a patch: labels gain `{app: name}`, and the
/// type, the whole port list, and the selector are overwritten. Ports or
/// selector entries added by hand on the live Exposure are discarded. The
/// existing metadata identity (resourceVersion) is kept so the replace call
/// targets the live object.
pub fn merged_exposure(existing: &Service, app: &ApplicationSpec, exposure_type: &str) -> Service {
    let mut merged = existing.clone();
    merged
        .metadata
        .labels
        .get_or_insert_with(Default::default)
        .insert(APP_LABEL.to_string(), app.name.clone());

    let spec = merged.spec.get_or_insert_with(Default::default);
    spec.type_ = Some(effective_exposure_type(exposure_type).to_string());
    spec.ports = Some(vec![exposure_port(app)]);
    spec.selector = Some(app_labels(&app.name));

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use dockyard_core::NewApplication;
    use serde_json::json;

    fn web_app() -> ApplicationSpec {
        ApplicationSpec::from_request(NewApplication {
            desired_replicas: Some(2),
            container_port: Some(80),
            service_enabled: Some(true),
            env: Some(json!({"MODE": "prod"})),
            ..NewApplication::new("web", "nginx:1.25")
        })
    }

    #[test]
    fn workload_shape_matches_contract() {
        let workload = workload_manifest(&web_app());

        assert_eq!(workload.metadata.name.as_deref(), Some("web"));
        let spec = workload.spec.unwrap();
        assert_eq!(spec.replicas, Some(2));
        assert_eq!(
            spec.selector.match_labels.unwrap().get("app").unwrap(),
            "web"
        );

        let pod = spec.template.spec.unwrap();
        assert_eq!(pod.containers.len(), 1);
        let container = &pod.containers[0];
        assert_eq!(container.name, "web");
        assert_eq!(container.image.as_deref(), Some("nginx:1.25"));
        assert_eq!(container.ports.as_ref().unwrap()[0].container_port, 80);
        let env = container.env.as_ref().unwrap();
        assert_eq!(env[0].name, "MODE");
        assert_eq!(env[0].value.as_deref(), Some("prod"));
    }

    #[test]
    fn resource_shaping_is_ram_limit_cpu_request_only() {
        let resources = shaped_resources(&ResourceSizing {
            cpu: "250m".to_string(),
            ram: "128Mi".to_string(),
        });

        let limits = resources.limits.unwrap();
        let requests = resources.requests.unwrap();
        assert_eq!(limits.get("memory").unwrap().0, "128Mi");
        assert_eq!(requests.get("cpu").unwrap().0, "250m");
        assert!(!limits.contains_key("cpu"));
        assert!(!requests.contains_key("memory"));
    }

    #[test]
    fn exposure_has_single_http_port() {
        let exposure = exposure_manifest(&web_app(), "NodePort");

        let spec = exposure.spec.unwrap();
        assert_eq!(spec.type_.as_deref(), Some("NodePort"));
        assert_eq!(spec.selector.unwrap().get("app").unwrap(), "web");
        let ports = spec.ports.unwrap();
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].name.as_deref(), Some("http"));
        assert_eq!(ports[0].protocol.as_deref(), Some("TCP"));
        assert_eq!(ports[0].port, 80);
        assert_eq!(ports[0].target_port, Some(IntOrString::Int(80)));
    }

    #[test]
    fn blank_exposure_type_falls_back_to_cluster_ip() {
        let exposure = exposure_manifest(&web_app(), "  ");
        assert_eq!(exposure.spec.unwrap().type_.as_deref(), Some("ClusterIP"));
    }

    #[test]
    fn merge_discards_extra_ports_and_selectors() {
        let app = web_app();
        let mut existing = exposure_manifest(&app, "ClusterIP");
        {
            let spec = existing.spec.as_mut().unwrap();
            spec.ports.as_mut().unwrap().push(ServicePort {
                name: Some("metrics".to_string()),
                port: 9090,
                ..Default::default()
            });
            spec.selector
                .as_mut()
                .unwrap()
                .insert("tier".to_string(), "edge".to_string());
        }
        existing.metadata.resource_version = Some("42".to_string());

        let merged = merged_exposure(&existing, &app, "NodePort");

        // replace targets the live object
        assert_eq!(merged.metadata.resource_version.as_deref(), Some("42"));
        let spec = merged.spec.unwrap();
        assert_eq!(spec.type_.as_deref(), Some("NodePort"));
        let ports = spec.ports.unwrap();
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].name.as_deref(), Some("http"));
        let selector = spec.selector.unwrap();
        assert_eq!(selector.len(), 1);
        assert_eq!(selector.get("app").unwrap(), "web");
    }
}
