//! Error types for shared Cirrus types.

use thiserror::Error;

/// Result type alias using the shared error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while constructing shared types from user input.
#[derive(Debug, Error)]
pub enum Error {
    /// A tag filter was not in `KEY=VALUE` form.
    #[error("invalid tag filter '{0}': expected KEY=VALUE")]
    InvalidTag(String),
}
