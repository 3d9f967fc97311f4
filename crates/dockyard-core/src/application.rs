//! Application records
//!
//! An [`ApplicationSpec`] is the declarative record a deploy pass reconciles
//! against the cluster. Its `name` doubles as the Workload/Exposure resource
//! name in the cluster, which makes it the join key between the store and
//! live state: at most one Workload and one Exposure exist per name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Default container port applied when a create request leaves it unset
pub const DEFAULT_CONTAINER_PORT: i32 = 80;

/// Default replica count applied when a create request leaves it unset
pub const DEFAULT_REPLICAS: i32 = 1;

/// Container resource sizing as Kubernetes quantity expressions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSizing {
    /// Cpu quantity, e.g. "250m"
    pub cpu: String,
    /// Memory quantity, e.g. "128Mi"
    pub ram: String,
}

impl Default for ResourceSizing {
    fn default() -> Self {
        Self {
            cpu: "250m".to_string(),
            ram: "128Mi".to_string(),
        }
    }
}

/// A stored application record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSpec {
    /// Opaque unique identifier, immutable after creation
    pub id: Uuid,

    /// Unique name; also the cluster resource name for the Workload/Exposure
    pub name: String,

    /// Container image reference; must be non-empty for any deploy action
    pub image: String,

    /// Desired replica count (non-negative)
    pub desired_replicas: i32,

    /// Container listening port; also the Exposure port and target port
    pub container_port: Option<i32>,

    /// Whether deploying this application also ensures an Exposure
    pub service_enabled: bool,

    /// Flat string-to-string environment mapping as a JSON object
    #[serde(default)]
    pub env: Value,

    /// Resource sizing applied to the single workload container
    #[serde(default)]
    pub resources: ResourceSizing,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update request for an application record
///
/// Optional fields fall back to defaults at creation (1 replica, port 80,
/// no Exposure, empty env) and to the existing values on update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApplication {
    pub name: String,
    pub image: String,
    pub desired_replicas: Option<i32>,
    pub container_port: Option<i32>,
    pub service_enabled: Option<bool>,
    pub env: Option<Value>,
    pub resources: Option<ResourceSizing>,
}

impl NewApplication {
    /// Minimal request with just a name and image
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            ..Default::default()
        }
    }
}

impl ApplicationSpec {
    /// Materialize a record from a create request, applying defaults
    pub fn from_request(request: NewApplication) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: request.name,
            image: request.image,
            desired_replicas: request.desired_replicas.unwrap_or(DEFAULT_REPLICAS),
            container_port: Some(request.container_port.unwrap_or(DEFAULT_CONTAINER_PORT)),
            service_enabled: request.service_enabled.unwrap_or(false),
            env: request.env.unwrap_or_else(|| Value::Object(Default::default())),
            resources: request.resources.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply an update request on top of this record, keeping unset fields
    pub fn apply_update(&mut self, request: NewApplication) {
        self.name = request.name;
        self.image = request.image;
        if let Some(replicas) = request.desired_replicas {
            self.desired_replicas = replicas;
        }
        if let Some(port) = request.container_port {
            self.container_port = Some(port);
        }
        if let Some(enabled) = request.service_enabled {
            self.service_enabled = enabled;
        }
        if let Some(env) = request.env {
            self.env = env;
        }
        if let Some(resources) = request.resources {
            self.resources = resources;
        }
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_request_applies_defaults() {
        let app = ApplicationSpec::from_request(NewApplication::new("web", "nginx:1.25"));
        assert_eq!(app.desired_replicas, 1);
        assert_eq!(app.container_port, Some(80));
        assert!(!app.service_enabled);
        assert_eq!(app.env, json!({}));
        assert_eq!(app.resources.cpu, "250m");
        assert_eq!(app.resources.ram, "128Mi");
    }

    #[test]
    fn update_keeps_unset_fields() {
        let mut app = ApplicationSpec::from_request(NewApplication {
            desired_replicas: Some(3),
            service_enabled: Some(true),
            ..NewApplication::new("web", "nginx:1.25")
        });
        app.apply_update(NewApplication::new("web", "nginx:1.26"));
        assert_eq!(app.image, "nginx:1.26");
        assert_eq!(app.desired_replicas, 3);
        assert!(app.service_enabled);
    }
}
