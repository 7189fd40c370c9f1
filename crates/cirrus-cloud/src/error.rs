//! Error types for provider calls.

use thiserror::Error;

/// Result type alias for provider operations.
pub type Result<T> = std::result::Result<T, CloudError>;

/// Errors from the cloud provider or the client used to reach it.
#[derive(Debug, Error)]
pub enum CloudError {
    /// The provider client could not be started.
    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// The provider rejected or failed the call.
    #[error("{operation} failed: {message}")]
    Remote { operation: String, message: String },

    /// The named resource does not exist.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// The provider's response did not have the expected shape.
    #[error("failed to parse {operation} response: {source}")]
    Parse {
        operation: String,
        source: serde_json::Error,
    },

    /// The request was rejected before reaching the provider.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl CloudError {
    /// Create a remote failure for an operation.
    pub fn remote(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Returns true if the error means the resource is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::NotFound(_))
    }
}
