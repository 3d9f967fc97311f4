//! Core error types

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("application not found: {id}")]
    ApplicationNotFound { id: Uuid },

    #[error("application with name '{name}' already exists")]
    NameTaken { name: String },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl CoreError {
    /// Create an invalid-argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Check whether this is a missing-application lookup failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::ApplicationNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
