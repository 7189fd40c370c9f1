//! Error types for the session engine.

use thiserror::Error;

/// Result type alias using the session error type.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors that escape the session engine.
///
/// Most remote failures are degraded into sentinel results before they get
/// here; only inventory failures and snapshot encoding remain.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The instance inventory could not be queried.
    #[error("Instance inventory failed: {0}")]
    Cloud(#[from] cirrus_cloud::CloudError),

    /// The snapshot could not be encoded.
    #[error("Snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
