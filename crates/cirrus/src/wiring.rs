//! Builds the cloud, model and GitHub components from configuration.
//!
//! Every command goes through here, so a `CirrusConfig` is loaded once in
//! `main` and passed down by reference.

use std::sync::Arc;
use std::time::Duration;

use cirrus_cloud::{AuditLog, AwsCli, CommandRunner, InstanceDirectory};
use cirrus_config::{AwsConfig, Backend, CirrusConfig, ConfigError};
use cirrus_github::{RunnerClient, RunnerDirectory};
use cirrus_llm::{BackendKind, LlmSettings, build_backend};
use cirrus_session::{ModelAccess, QueryDispatcher, QueryOptions, SessionContext};

/// Layer `--profile` / `--region` over the loaded config.
pub fn apply_cli_overrides(
    config: &mut CirrusConfig,
    profile: Option<String>,
    region: Option<String>,
) {
    config.merge(CirrusConfig {
        aws: Some(AwsConfig {
            region,
            profile,
            cli_path: None,
        }),
        ..Default::default()
    });
}

/// Provider client configured with region, profile and executable.
pub fn aws_cli(config: &CirrusConfig) -> Arc<AwsCli> {
    let aws = config.aws();
    Arc::new(
        AwsCli::new()
            .with_program(aws.cli_path())
            .with_region(aws.resolved_region())
            .with_profile(aws.profile.clone()),
    )
}

pub fn instance_directory(cli: &Arc<AwsCli>) -> InstanceDirectory {
    InstanceDirectory::new(cli.clone(), cli.clone())
}

pub fn audit_log(config: &CirrusConfig) -> AuditLog {
    AuditLog::new(aws_cli(config))
}

/// A fresh session bound to the configured account.
pub fn session_context(config: &CirrusConfig) -> SessionContext {
    let cli = aws_cli(config);
    let region = cli.region().map(str::to_string);
    SessionContext::new(instance_directory(&cli), CommandRunner::new(cli)).with_region(region)
}

/// Resolve the model credential and build the backend.
///
/// Never fails: a missing credential or region becomes
/// [`ModelAccess::Unconfigured`] with a message saying what to set.
pub fn model_access(config: &CirrusConfig) -> ModelAccess {
    let llm = config.llm();
    let backend = llm.backend();

    let Some(secret) = cirrus_config::resolve_api_key(&backend, llm.api_key.as_deref()) else {
        let err = ConfigError::ApiKeyNotFound {
            backend: backend.display_name().to_string(),
            env_var: backend.env_var().to_string(),
        };
        return ModelAccess::Unconfigured(err.to_string());
    };
    tracing::debug!(backend = %backend, source = %secret.source, "Resolved model credential");

    let mut settings = LlmSettings::new(match backend {
        Backend::Bedrock => BackendKind::Bedrock,
        Backend::Anthropic => BackendKind::Anthropic,
    });
    settings.api_key = Some(secret.value);
    settings.base_url = llm.base_url.clone();

    if backend == Backend::Bedrock && settings.base_url.is_none() {
        match config.aws().require_region() {
            Ok(region) => settings.region = Some(region),
            Err(e) => return ModelAccess::Unconfigured(e.to_string()),
        }
    }
    if let Some(secs) = llm.timeout_secs {
        settings.timeout = Duration::from_secs(secs);
    }
    if let Some(retries) = llm.retry_max {
        settings.max_retries = retries;
    }
    if let Some(ms) = llm.retry_backoff_ms {
        settings.retry_backoff = Duration::from_millis(ms);
    }

    ModelAccess::from(build_backend(&settings))
}

pub fn query_dispatcher(config: &CirrusConfig, context: Arc<SessionContext>) -> QueryDispatcher {
    QueryDispatcher::new(context, model_access(config), config.llm().model())
}

/// Sampling options from `[llm]`.
pub fn query_options(config: &CirrusConfig) -> QueryOptions {
    let llm = config.llm();
    QueryOptions {
        max_tokens: llm.max_tokens(),
        temperature: llm.temperature(),
    }
}

/// Runner search, unconfigured when the token variable is unset.
pub fn runner_directory(config: &CirrusConfig) -> RunnerDirectory {
    let github = config.github();
    let token = match std::env::var(github.token_env()) {
        Ok(token) if !token.is_empty() => token,
        _ => {
            return RunnerDirectory::unconfigured(format!(
                "{} environment variable is not set.",
                github.token_env()
            ));
        }
    };

    match RunnerClient::new(github.api_base(), github.org(), token) {
        Ok(client) => {
            RunnerDirectory::new(client, Duration::from_secs(github.cache_ttl_secs()))
        }
        Err(e) => RunnerDirectory::unconfigured(e.to_string()),
    }
}
