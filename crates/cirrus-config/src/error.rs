//! Configuration error types.

/// Result type alias for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur during configuration loading and resolution.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a config file.
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },

    /// Failed to write a config file.
    #[error("failed to write config file '{path}': {source}")]
    WriteFile {
        path: String,
        source: std::io::Error,
    },

    /// Failed to parse TOML.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Failed to serialize config.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// No region could be determined for provider calls.
    #[error("no AWS region configured: set [aws] region, --region, or AWS_REGION")]
    NoRegion,

    /// API key not found through any resolution method.
    #[error(
        "credential not found for backend '{backend}'. Set via keyring (cirrus config set-secret), env var ({env_var}), or config file"
    )]
    ApiKeyNotFound { backend: String, env_var: String },
}
