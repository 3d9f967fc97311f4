//! Error types for dockyard-kube

use thiserror::Error;

/// Result type for dockyard-kube operations
pub type Result<T> = std::result::Result<T, ClusterError>;

/// Errors that can occur during cluster operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClusterError {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// A create/replace lost a check-then-act race against a concurrent writer
    #[error("{kind} '{name}' already exists in namespace '{namespace}'")]
    Conflict {
        kind: String,
        name: String,
        namespace: String,
    },

    /// Application record lookup or validation failure
    #[error(transparent)]
    Application(#[from] dockyard_core::CoreError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ClusterError {
    fn from(e: serde_json::Error) -> Self {
        ClusterError::Serialization(e.to_string())
    }
}

impl ClusterError {
    /// Check if this is a Kubernetes 404 Not Found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClusterError::Api(kube::Error::Api(resp)) if resp.code == 404)
    }

    /// Check if this is a conflict, either detected deterministically or as
    /// the cluster's native 409
    pub fn is_conflict(&self) -> bool {
        match self {
            ClusterError::Conflict { .. } => true,
            ClusterError::Api(kube::Error::Api(resp)) => resp.code == 409,
            _ => false,
        }
    }

    /// Check if this is a missing-application lookup failure
    pub fn is_application_not_found(&self) -> bool {
        matches!(self, ClusterError::Application(e) if e.is_not_found())
    }
}
