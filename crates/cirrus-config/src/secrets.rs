//! API key storage and retrieval.
//!
//! Resolution order:
//! 1. System keyring (if the `keyring` feature is enabled)
//! 2. Environment variable
//! 3. Config file (with warning)
//!
//! Keyring entries are stored as service="cirrus", user="<env var>_api_key".

use crate::Backend;

/// Keyring service name.
const SERVICE_NAME: &str = "cirrus";

/// Result of API key resolution with provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSecret {
    /// The secret value.
    pub value: String,
    /// Where the secret was found.
    pub source: SecretSource,
}

/// Where a secret was resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSource {
    /// OS keyring.
    Keyring,
    /// Environment variable.
    EnvVar(String),
    /// Config file (plaintext).
    ConfigFile,
}

impl std::fmt::Display for SecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretSource::Keyring => write!(f, "system keyring"),
            SecretSource::EnvVar(var) => write!(f, "env var {}", var),
            SecretSource::ConfigFile => write!(f, "config file (plaintext)"),
        }
    }
}

/// Resolve an API key for a backend using the full resolution chain.
pub fn resolve_api_key(backend: &Backend, config_value: Option<&str>) -> Option<ResolvedSecret> {
    if let Some(secret) = get_from_keyring(backend) {
        return Some(secret);
    }

    let env_var = backend.env_var();
    if let Ok(value) = std::env::var(env_var)
        && !value.is_empty()
    {
        return Some(ResolvedSecret {
            value,
            source: SecretSource::EnvVar(env_var.to_string()),
        });
    }

    config_value
        .filter(|v| !v.is_empty())
        .map(|v| ResolvedSecret {
            value: v.to_string(),
            source: SecretSource::ConfigFile,
        })
}

/// Store an API key in the system keyring.
pub fn store_in_keyring(backend: &Backend, api_key: &str) -> std::result::Result<(), String> {
    store_keyring_entry(SERVICE_NAME, &keyring_user(backend), api_key)
}

fn keyring_user(backend: &Backend) -> String {
    format!("{}_api_key", backend.env_var().to_lowercase())
}

// ─────────────────────────────────────────────────────────────────────────────
// Keyring implementation (feature-gated)
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(feature = "keyring")]
fn get_from_keyring(backend: &Backend) -> Option<ResolvedSecret> {
    // Tests must not depend on the local machine's keychain.
    if cfg!(test) {
        return None;
    }

    let entry = keyring::Entry::new(SERVICE_NAME, &keyring_user(backend)).ok()?;
    let value = entry.get_password().ok()?;
    if value.is_empty() {
        return None;
    }
    Some(ResolvedSecret {
        value,
        source: SecretSource::Keyring,
    })
}

#[cfg(feature = "keyring")]
fn store_keyring_entry(service: &str, user: &str, secret: &str) -> std::result::Result<(), String> {
    if cfg!(test) {
        return Err("keyring access disabled in tests".to_string());
    }
    let entry = keyring::Entry::new(service, user).map_err(|e| format!("keyring error: {}", e))?;
    entry
        .set_password(secret)
        .map_err(|e| format!("failed to store in keyring: {}", e))
}

#[cfg(not(feature = "keyring"))]
fn get_from_keyring(_backend: &Backend) -> Option<ResolvedSecret> {
    None
}

#[cfg(not(feature = "keyring"))]
fn store_keyring_entry(
    _service: &str,
    _user: &str,
    _secret: &str,
) -> std::result::Result<(), String> {
    Err("keyring support not compiled in (enable the 'keyring' feature)".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_keyring_user_format() {
        assert_eq!(
            keyring_user(&Backend::Anthropic),
            "anthropic_api_key_api_key"
        );
        assert_eq!(
            keyring_user(&Backend::Bedrock),
            "aws_bearer_token_bedrock_api_key"
        );
    }

    #[test]
    #[serial]
    fn test_env_var_beats_config_value() {
        unsafe { std::env::set_var("ANTHROPIC_API_KEY", "from-env") };
        let resolved = resolve_api_key(&Backend::Anthropic, Some("from-config")).unwrap();
        assert_eq!(resolved.value, "from-env");
        assert_eq!(
            resolved.source,
            SecretSource::EnvVar("ANTHROPIC_API_KEY".to_string())
        );
        unsafe { std::env::remove_var("ANTHROPIC_API_KEY") };
    }

    #[test]
    #[serial]
    fn test_falls_back_to_config_value() {
        unsafe { std::env::remove_var("AWS_BEARER_TOKEN_BEDROCK") };
        let resolved = resolve_api_key(&Backend::Bedrock, Some("from-config")).unwrap();
        assert_eq!(resolved.value, "from-config");
        assert_eq!(resolved.source, SecretSource::ConfigFile);

        assert!(resolve_api_key(&Backend::Bedrock, None).is_none());
        assert!(resolve_api_key(&Backend::Bedrock, Some("")).is_none());
    }

    #[test]
    fn test_secret_source_display() {
        assert_eq!(SecretSource::Keyring.to_string(), "system keyring");
        assert_eq!(
            SecretSource::EnvVar("ANTHROPIC_API_KEY".to_string()).to_string(),
            "env var ANTHROPIC_API_KEY"
        );
        assert_eq!(
            SecretSource::ConfigFile.to_string(),
            "config file (plaintext)"
        );
    }

    #[cfg(not(feature = "keyring"))]
    #[test]
    fn test_store_keyring_disabled() {
        let result = store_in_keyring(&Backend::Anthropic, "test-key");
        assert!(result.unwrap_err().contains("not compiled"));
    }
}
