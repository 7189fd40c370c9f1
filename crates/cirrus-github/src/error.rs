//! Error types for GitHub access.

use thiserror::Error;

/// Result type alias using the GitHub error type.
pub type Result<T> = std::result::Result<T, GithubError>;

#[derive(Debug, Error)]
pub enum GithubError {
    /// The request never got a response.
    #[error("Error connecting to GitHub API: {0}")]
    Network(String),

    /// GitHub answered with a non-success status.
    #[error("GitHub API returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body was not the expected JSON.
    #[error("Unexpected GitHub response: {0}")]
    Parse(String),

    /// The search pattern is not a valid regular expression.
    #[error("Invalid search pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for GithubError {
    fn from(err: reqwest::Error) -> Self {
        GithubError::Network(err.to_string())
    }
}
