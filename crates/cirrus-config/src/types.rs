//! Configuration types mapping to the TOML schema.
//!
//! Top-level config:
//! ```toml
//! [aws]        # provider access (region, profile, CLI executable)
//! [llm]        # model backend and sampling defaults
//! [github]     # self-hosted runner listing
//! [audit]      # default log groups for log search
//! [logging]    # log file toggle
//! ```

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CirrusConfig {
    /// Provider access settings.
    pub aws: Option<AwsConfig>,

    /// Model backend settings.
    pub llm: Option<LlmConfig>,

    /// GitHub runner listing settings.
    pub github: Option<GithubConfig>,

    /// Audit/log search defaults.
    pub audit: Option<AuditConfig>,

    /// Logging settings.
    pub logging: Option<LoggingConfig>,
}

impl CirrusConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Sections merge field by field, so a project file that only sets
    /// `[aws] region` keeps the user's `[aws] profile`.
    pub fn merge(&mut self, other: CirrusConfig) {
        merge_section(&mut self.aws, other.aws, AwsConfig::merge);
        merge_section(&mut self.llm, other.llm, LlmConfig::merge);
        merge_section(&mut self.github, other.github, GithubConfig::merge);

        if other.audit.is_some() {
            self.audit = other.audit;
        }

        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    /// Provider settings, or defaults when the section is absent.
    pub fn aws(&self) -> AwsConfig {
        self.aws.clone().unwrap_or_default()
    }

    /// Model settings, or defaults when the section is absent.
    pub fn llm(&self) -> LlmConfig {
        self.llm.clone().unwrap_or_default()
    }

    /// GitHub settings, or defaults when the section is absent.
    pub fn github(&self) -> GithubConfig {
        self.github.clone().unwrap_or_default()
    }

    /// Audit settings, or defaults when the section is absent.
    pub fn audit(&self) -> AuditConfig {
        self.audit.clone().unwrap_or_default()
    }

    /// Logging settings, or defaults when the section is absent.
    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }

    /// A commented-out starter config for `cirrus config init`.
    pub fn starter_toml() -> &'static str {
        STARTER_CONFIG
    }
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: fn(&mut T, T)) {
    match (base.as_mut(), other) {
        (Some(existing), Some(incoming)) => merge(existing, incoming),
        (None, Some(incoming)) => *base = Some(incoming),
        (_, None) => {}
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// AWS Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Default executable used for provider calls.
pub const DEFAULT_AWS_CLI: &str = "aws";

/// Provider access settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    /// Region for all provider calls.
    pub region: Option<String>,
    /// Named credentials profile.
    pub profile: Option<String>,
    /// Path or name of the provider CLI executable.
    pub cli_path: Option<String>,
}

impl AwsConfig {
    fn merge(&mut self, other: AwsConfig) {
        if other.region.is_some() {
            self.region = other.region;
        }
        if other.profile.is_some() {
            self.profile = other.profile;
        }
        if other.cli_path.is_some() {
            self.cli_path = other.cli_path;
        }
    }

    /// Region from config, then `AWS_REGION`, then `AWS_DEFAULT_REGION`.
    pub fn resolved_region(&self) -> Option<String> {
        if let Some(ref region) = self.region {
            return Some(region.clone());
        }
        ["AWS_REGION", "AWS_DEFAULT_REGION"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.is_empty())
    }

    /// Like [`resolved_region`](Self::resolved_region) but fails when unset.
    pub fn require_region(&self) -> crate::Result<String> {
        self.resolved_region().ok_or(crate::ConfigError::NoRegion)
    }

    /// The CLI executable to invoke.
    pub fn cli_path(&self) -> &str {
        self.cli_path.as_deref().unwrap_or(DEFAULT_AWS_CLI)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LLM Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Default model when none is configured.
pub const DEFAULT_MODEL: &str = "anthropic.claude-3-sonnet-20240229-v1:0";

/// Default maximum tokens per reply.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Model backend settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend provider.
    pub backend: Option<Backend>,
    /// Model identifier.
    pub model: Option<String>,
    /// Custom API base URL (for proxies, VPC endpoints).
    pub base_url: Option<String>,
    /// API key (prefer keyring or env var; warns if set here).
    pub api_key: Option<String>,
    /// Maximum tokens per reply.
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Maximum retry attempts for failed requests.
    pub retry_max: Option<u32>,
    /// Backoff delay between retries in milliseconds.
    pub retry_backoff_ms: Option<u64>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl LlmConfig {
    fn merge(&mut self, other: LlmConfig) {
        if other.backend.is_some() {
            self.backend = other.backend;
        }
        if other.model.is_some() {
            self.model = other.model;
        }
        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }
        if other.api_key.is_some() {
            self.api_key = other.api_key;
        }
        if other.max_tokens.is_some() {
            self.max_tokens = other.max_tokens;
        }
        if other.temperature.is_some() {
            self.temperature = other.temperature;
        }
        if other.retry_max.is_some() {
            self.retry_max = other.retry_max;
        }
        if other.retry_backoff_ms.is_some() {
            self.retry_backoff_ms = other.retry_backoff_ms;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
    }

    /// Returns true if an API key is stored directly in the config file.
    pub fn has_plaintext_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Configured backend, Bedrock when unset.
    pub fn backend(&self) -> Backend {
        self.backend.unwrap_or(Backend::Bedrock)
    }

    /// Configured model, or [`DEFAULT_MODEL`].
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Configured reply size, or [`DEFAULT_MAX_TOKENS`].
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    /// Configured temperature, or [`DEFAULT_TEMPERATURE`].
    pub fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }
}

/// Supported model backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Claude on Amazon Bedrock.
    Bedrock,
    /// Anthropic's Messages API.
    Anthropic,
}

impl Backend {
    /// Environment variable holding this backend's credential.
    pub fn env_var(&self) -> &'static str {
        match self {
            Backend::Bedrock => "AWS_BEARER_TOKEN_BEDROCK",
            Backend::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Backend::Bedrock => "Amazon Bedrock",
            Backend::Anthropic => "Anthropic",
        }
    }

    /// Parse a backend from its config name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "bedrock" => Some(Backend::Bedrock),
            "anthropic" => Some(Backend::Anthropic),
            _ => None,
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// GitHub Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Default organization whose runners are listed.
pub const DEFAULT_GITHUB_ORG: &str = "pytorch";

/// Default environment variable holding the GitHub token.
pub const DEFAULT_GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN_ADMIN_READ";

/// Default GitHub API base URL.
pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";

/// Default runner cache lifetime in seconds.
pub const DEFAULT_RUNNER_CACHE_TTL_SECS: u64 = 300;

/// GitHub runner listing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// Organization name.
    pub org: Option<String>,
    /// Environment variable holding the token.
    pub token_env: Option<String>,
    /// API base URL.
    pub api_base: Option<String>,
    /// How long a fetched runner list stays fresh.
    pub cache_ttl_secs: Option<u64>,
}

impl GithubConfig {
    fn merge(&mut self, other: GithubConfig) {
        if other.org.is_some() {
            self.org = other.org;
        }
        if other.token_env.is_some() {
            self.token_env = other.token_env;
        }
        if other.api_base.is_some() {
            self.api_base = other.api_base;
        }
        if other.cache_ttl_secs.is_some() {
            self.cache_ttl_secs = other.cache_ttl_secs;
        }
    }

    pub fn org(&self) -> &str {
        self.org.as_deref().unwrap_or(DEFAULT_GITHUB_ORG)
    }

    pub fn token_env(&self) -> &str {
        self.token_env.as_deref().unwrap_or(DEFAULT_GITHUB_TOKEN_ENV)
    }

    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_GITHUB_API)
    }

    pub fn cache_ttl_secs(&self) -> u64 {
        self.cache_ttl_secs.unwrap_or(DEFAULT_RUNNER_CACHE_TTL_SECS)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Audit & Logging
// ─────────────────────────────────────────────────────────────────────────────

/// Log groups searched when none are given.
pub const DEFAULT_LOG_GROUPS: &[&str] = &[
    "/aws/lambda/gh-ci-scale-up",
    "/aws/lambda/gh-ci-scale-down",
    "/aws/lambda/gh-ci-scale-up-chron",
];

/// Audit and log search defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Log groups searched by default.
    pub log_groups: Vec<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            log_groups: DEFAULT_LOG_GROUPS.iter().map(|g| g.to_string()).collect(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Write a JSON log file under the config directory.
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { file: true }
    }
}

const STARTER_CONFIG: &str = r#"# Cirrus configuration

[aws]
# region = "us-east-1"
# profile = "default"
# cli_path = "aws"

[llm]
backend = "bedrock"
model = "anthropic.claude-3-sonnet-20240229-v1:0"
# max_tokens = 1000
# temperature = 0.7

[github]
# org = "pytorch"
# token_env = "GITHUB_TOKEN_ADMIN_READ"
# cache_ttl_secs = 300

[logging]
file = true
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_full_config() {
        let config = CirrusConfig::from_toml(
            r#"
[aws]
region = "eu-west-1"
profile = "ops"

[llm]
backend = "anthropic"
model = "claude-sonnet-4-5"
temperature = 0.2

[github]
org = "acme"
cache_ttl_secs = 60

[audit]
log_groups = ["/aws/lambda/one"]

[logging]
file = false
"#,
        )
        .unwrap();

        let aws = config.aws();
        assert_eq!(aws.region.as_deref(), Some("eu-west-1"));
        assert_eq!(aws.cli_path(), "aws");
        let llm = config.llm();
        assert_eq!(llm.backend(), Backend::Anthropic);
        assert_eq!(llm.model(), "claude-sonnet-4-5");
        assert_eq!(llm.max_tokens(), DEFAULT_MAX_TOKENS);
        assert!((llm.temperature() - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.github().org(), "acme");
        assert_eq!(config.github().cache_ttl_secs(), 60);
        assert_eq!(config.audit().log_groups, vec!["/aws/lambda/one"]);
        assert!(!config.logging().file);
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = CirrusConfig::from_toml("").unwrap();
        assert_eq!(config.llm().backend(), Backend::Bedrock);
        assert_eq!(config.llm().model(), DEFAULT_MODEL);
        assert_eq!(config.github().org(), DEFAULT_GITHUB_ORG);
        assert_eq!(config.github().token_env(), DEFAULT_GITHUB_TOKEN_ENV);
        assert_eq!(config.audit().log_groups.len(), 3);
        assert!(config.logging().file);
    }

    #[test]
    fn test_merge_is_field_wise() {
        let mut base = CirrusConfig::from_toml(
            r#"
[aws]
region = "us-east-1"
profile = "ops"

[llm]
backend = "bedrock"
max_tokens = 2000
"#,
        )
        .unwrap();
        let overlay = CirrusConfig::from_toml(
            r#"
[aws]
region = "us-west-2"

[llm]
model = "other-model"
"#,
        )
        .unwrap();

        base.merge(overlay);
        let aws = base.aws();
        assert_eq!(aws.region.as_deref(), Some("us-west-2"));
        assert_eq!(aws.profile.as_deref(), Some("ops"));
        let llm = base.llm();
        assert_eq!(llm.backend(), Backend::Bedrock);
        assert_eq!(llm.model(), "other-model");
        assert_eq!(llm.max_tokens(), 2000);
    }

    #[test]
    fn test_round_trip_toml() {
        let config = CirrusConfig::from_toml(
            r#"
[aws]
region = "us-east-1"
"#,
        )
        .unwrap();
        let text = config.to_toml().unwrap();
        assert_eq!(CirrusConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_starter_config_parses() {
        let config = CirrusConfig::from_toml(CirrusConfig::starter_toml()).unwrap();
        assert_eq!(config.llm().backend(), Backend::Bedrock);
    }

    #[test]
    fn test_backend_names() {
        assert_eq!(Backend::from_name("Bedrock"), Some(Backend::Bedrock));
        assert_eq!(Backend::from_name("anthropic"), Some(Backend::Anthropic));
        assert_eq!(Backend::from_name("openai"), None);
        assert_eq!(Backend::Bedrock.env_var(), "AWS_BEARER_TOKEN_BEDROCK");
    }

    #[test]
    #[serial]
    fn test_region_prefers_config_over_env() {
        unsafe { std::env::set_var("AWS_REGION", "ap-south-1") };
        let configured = AwsConfig {
            region: Some("eu-central-1".to_string()),
            ..Default::default()
        };
        assert_eq!(configured.resolved_region().as_deref(), Some("eu-central-1"));
        assert_eq!(
            AwsConfig::default().resolved_region().as_deref(),
            Some("ap-south-1")
        );
        unsafe { std::env::remove_var("AWS_REGION") };
    }

    #[test]
    #[serial]
    fn test_require_region_fails_when_unset() {
        unsafe {
            std::env::remove_var("AWS_REGION");
            std::env::remove_var("AWS_DEFAULT_REGION");
        }
        let err = AwsConfig::default().require_region().unwrap_err();
        assert!(matches!(err, crate::ConfigError::NoRegion));
    }
}
