//! LLM Backend trait, retry policy and backend construction.
//!
//! This module defines the abstraction over model providers (Bedrock,
//! Anthropic) and provides a mock implementation for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::anthropic::{AnthropicBackend, AnthropicConfig};
use crate::bedrock::{BedrockBackend, BedrockConfig};
use crate::error::{LlmError, Result};
use crate::types::{CompletionRequest, CompletionResponse};

// ─────────────────────────────────────────────────────────────────────────────
// Shared Retry Logic
// ─────────────────────────────────────────────────────────────────────────────

/// Execute an async operation with exponential backoff retry.
///
/// Retries only on transient errors (network failures, rate limits).
/// Non-retryable errors are returned immediately. A provider-requested
/// `Retry-After` longer than the current backoff is honored.
pub async fn with_retry<F, Fut, T>(
    max_retries: u32,
    initial_backoff: Duration,
    backend_name: &str,
    mut f: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut backoff = initial_backoff;
    let mut attempt = 0;

    loop {
        let err = match f().await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        if !err.is_retryable() || attempt >= max_retries {
            return Err(err);
        }

        let delay = err.retry_after().map_or(backoff, |after| after.max(backoff));
        attempt += 1;
        tracing::warn!(
            backend = backend_name,
            attempt = attempt,
            max_retries = max_retries,
            backoff_ms = delay.as_millis() as u64,
            error = %err,
            "Request failed, retrying"
        );
        tokio::time::sleep(delay).await;
        backoff *= 2;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LLM Backend Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for model backend providers.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Execute a completion request and return the full response.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the name of this backend.
    fn name(&self) -> &str;
}

/// A backend that can be shared across threads.
pub type SharedBackend = Arc<dyn LlmBackend>;

// ─────────────────────────────────────────────────────────────────────────────
// Backend Construction
// ─────────────────────────────────────────────────────────────────────────────

/// Which provider serves model requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Bedrock,
    Anthropic,
}

impl BackendKind {
    /// Environment variable the credential is usually read from.
    pub fn credential_env_var(&self) -> &'static str {
        match self {
            BackendKind::Bedrock => "AWS_BEARER_TOKEN_BEDROCK",
            BackendKind::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

/// Fully resolved settings for one backend.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub kind: BackendKind,
    /// Credential, already resolved from keyring, environment or config.
    pub api_key: Option<String>,
    /// Region for regional endpoints.
    pub region: Option<String>,
    /// Endpoint override.
    pub base_url: Option<String>,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl LlmSettings {
    /// Settings with the default timeout and retry policy.
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            api_key: None,
            region: None,
            base_url: None,
            timeout: Duration::from_secs(300),
            max_retries: 3,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

/// Build a backend from resolved settings.
///
/// Returns [`LlmError::Config`] when the credential, or the region a
/// regional endpoint needs, is missing.
pub fn build_backend(settings: &LlmSettings) -> Result<SharedBackend> {
    let api_key = settings
        .api_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            LlmError::Config(format!(
                "no credential configured; set {} or use 'cirrus config set-secret'",
                settings.kind.credential_env_var()
            ))
        })?;

    match settings.kind {
        BackendKind::Bedrock => {
            let mut config = match (&settings.base_url, &settings.region) {
                (Some(base_url), _) => BedrockConfig::new(api_key, "custom").with_base_url(base_url),
                (None, Some(region)) => BedrockConfig::new(api_key, region),
                (None, None) => {
                    return Err(LlmError::Config(
                        "no AWS region configured for Bedrock".to_string(),
                    ));
                }
            };
            config = config
                .with_timeout(settings.timeout)
                .with_max_retries(settings.max_retries)
                .with_retry_backoff(settings.retry_backoff);
            Ok(Arc::new(BedrockBackend::new(config)?))
        }
        BackendKind::Anthropic => {
            let mut config = AnthropicConfig::new(api_key)
                .with_timeout(settings.timeout)
                .with_max_retries(settings.max_retries)
                .with_retry_backoff(settings.retry_backoff);
            if let Some(ref base_url) = settings.base_url {
                config = config.with_base_url(base_url);
            }
            Ok(Arc::new(AnthropicBackend::new(config)?))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Mock Backend
// ─────────────────────────────────────────────────────────────────────────────

/// A mock backend for testing purposes.
///
/// Returns scripted responses in order, or a fixed error, and records every
/// request it receives.
#[cfg(any(test, feature = "testing"))]
pub struct MockBackend {
    name: String,
    responses: std::sync::Mutex<Vec<CompletionResponse>>,
    error: Option<String>,
    request_log: std::sync::Mutex<Vec<CompletionRequest>>,
}

#[cfg(any(test, feature = "testing"))]
impl MockBackend {
    /// Create a new mock backend with the given responses.
    ///
    /// Responses are returned in order. If more requests are made than
    /// responses available, an error is returned.
    pub fn new(responses: Vec<CompletionResponse>) -> Self {
        Self {
            name: "mock".to_string(),
            responses: std::sync::Mutex::new(responses),
            error: None,
            request_log: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Create a mock backend with a single text response.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::new(vec![CompletionResponse::new(
            "mock_msg_1",
            "mock-model",
            vec![crate::types::ContentBlock::text(text)],
            crate::types::StopReason::EndTurn,
            crate::types::Usage::new(10, 20),
        )])
    }

    /// Create a mock backend that fails every request with a backend error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::new(Vec::new())
        }
    }

    /// Get all requests that were made to this backend.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.request_log.lock().unwrap().clone()
    }

    /// Get the number of requests made.
    pub fn request_count(&self) -> usize {
        self.request_log.lock().unwrap().len()
    }
}

#[cfg(any(test, feature = "testing"))]
#[async_trait]
impl LlmBackend for MockBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.request_log.lock().unwrap().push(request);

        if let Some(ref message) = self.error {
            return Err(LlmError::Backend(message.clone()));
        }

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(LlmError::Backend(
                "MockBackend: no more responses available".to_string(),
            ));
        }
        Ok(responses.remove(0))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::types::Message;

    #[tokio::test]
    async fn test_mock_backend_single_response() {
        let backend = MockBackend::with_text("Hello!");

        let request = CompletionRequest::new("test-model", vec![Message::user("Hi")], 100);
        let response = backend.complete(request).await.unwrap();

        assert_eq!(response.first_text(), "Hello!");
        assert_eq!(backend.request_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_backend_exhausted() {
        let backend = MockBackend::with_text("once");
        let request = CompletionRequest::new("m", vec![Message::user("Hi")], 10);
        backend.complete(request.clone()).await.unwrap();
        assert!(backend.complete(request).await.is_err());
        assert_eq!(backend.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_backend_failing() {
        let backend = MockBackend::failing("model overloaded");
        let request = CompletionRequest::new("m", vec![Message::user("Hi")], 10);
        let err = backend.complete(request).await.unwrap_err();
        assert!(err.to_string().contains("model overloaded"));
        assert_eq!(backend.request_count(), 1);
    }

    #[tokio::test]
    async fn test_with_retry_recovers_from_transient_errors() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = with_retry(3, Duration::from_millis(1), "test", move || async move {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(LlmError::Network("reset".to_string()))
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_gives_up_after_max() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = with_retry(2, Duration::from_millis(1), "test", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(LlmError::rate_limit("slow down"))
        })
        .await;

        assert!(matches!(result, Err(LlmError::RateLimit(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_does_not_retry_auth() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = with_retry(3, Duration::from_millis(1), "test", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(LlmError::Auth("bad key".to_string()))
        })
        .await;

        assert!(matches!(result, Err(LlmError::Auth(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_build_backend_requires_credential() {
        let err = build_backend(&LlmSettings::new(BackendKind::Anthropic))
            .err()
            .unwrap();
        assert!(matches!(err, LlmError::Config(_)));
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_build_bedrock_requires_region() {
        let mut settings = LlmSettings::new(BackendKind::Bedrock);
        settings.api_key = Some("token".to_string());
        let err = build_backend(&settings).err().unwrap();
        assert!(err.to_string().contains("region"));

        settings.region = Some("us-east-1".to_string());
        let backend = build_backend(&settings).unwrap();
        assert_eq!(backend.name(), "bedrock");
    }

    #[test]
    fn test_build_anthropic_backend() {
        let mut settings = LlmSettings::new(BackendKind::Anthropic);
        settings.api_key = Some("sk-test".to_string());
        let backend = build_backend(&settings).unwrap();
        assert_eq!(backend.name(), "anthropic");
    }
}
