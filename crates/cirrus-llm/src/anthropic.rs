//! Anthropic API backend implementation.
//!
//! This module provides the `AnthropicBackend` which connects to Anthropic's
//! Messages API. The response and error parsing here is shared with the
//! Bedrock backend, which returns the same message shape.

use async_trait::async_trait;
use reqwest::{Client, Response, header};
use std::time::Duration;

use crate::backend::{LlmBackend, with_retry};
use crate::error::{LlmError, RateLimitInfo, Result};
use crate::types::{CompletionRequest, CompletionResponse, ContentBlock, StopReason, Usage};

/// Default API base URL.
const DEFAULT_API_BASE: &str = "https://api.anthropic.com";

/// Default API version.
const DEFAULT_API_VERSION: &str = "2023-06-01";

/// Default timeout for requests.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for the Anthropic backend.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key for authentication.
    pub api_key: String,

    /// Base URL for the API.
    pub base_url: String,

    /// API version header.
    pub api_version: String,

    /// Request timeout.
    pub timeout: Duration,

    /// Maximum retries for transient errors.
    pub max_retries: u32,

    /// Initial backoff duration for retries.
    pub retry_backoff: Duration,
}

impl AnthropicConfig {
    /// Create a new config with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_API_BASE.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: 3,
            retry_backoff: Duration::from_millis(500),
        }
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set max retries.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set retry backoff.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Anthropic Backend
// ─────────────────────────────────────────────────────────────────────────────

/// Anthropic API backend.
pub struct AnthropicBackend {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicBackend {
    /// Create a new Anthropic backend with the given configuration.
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Build the messages endpoint URL.
    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
    }

    /// Add authentication and API headers to a request.
    fn add_headers(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", &self.config.api_version)
            .header(header::CONTENT_TYPE, "application/json")
    }
}

#[async_trait]
impl LlmBackend for AnthropicBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        with_retry(
            self.config.max_retries,
            self.config.retry_backoff,
            "anthropic",
            || async {
                let response = self
                    .add_headers(self.client.post(self.messages_url()))
                    .json(&request)
                    .send()
                    .await?;

                handle_response(response).await
            },
        )
        .await
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Response Handling
// ─────────────────────────────────────────────────────────────────────────────

/// Parse a Messages API response, mapping HTTP failures to [`LlmError`].
pub(crate) async fn handle_response(response: Response) -> Result<CompletionResponse> {
    if !response.status().is_success() {
        return Err(handle_error_response(response).await);
    }

    let body = response.text().await?;
    let parsed: ApiResponse =
        serde_json::from_str(&body).map_err(|e| LlmError::Serialization(e.to_string()))?;

    Ok(parsed.into())
}

/// Map an error response to an [`LlmError`].
///
/// Understands both the Anthropic error envelope and Bedrock's flat
/// `{"message": ...}` body.
pub(crate) async fn handle_error_response(response: Response) -> LlmError {
    let status = response.status();

    let retry_after_header = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let body = response.text().await.unwrap_or_default();

    let message = if let Ok(error) = serde_json::from_str::<ApiError>(&body) {
        error.error.message
    } else if let Ok(error) = serde_json::from_str::<FlatError>(&body) {
        error.message
    } else {
        return LlmError::Backend(format!("HTTP {}: {}", status, body));
    };

    match status.as_u16() {
        401 | 403 => LlmError::Auth(format!("Authentication failed: {}", message)),
        429 => LlmError::RateLimit(RateLimitInfo::from_header(
            &message,
            retry_after_header.as_deref(),
        )),
        500..=599 => LlmError::Backend(format!("Server error: {}", message)),
        _ => LlmError::Backend(message),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// API Response Types
// ─────────────────────────────────────────────────────────────────────────────

/// Internal API response structure.
#[derive(Debug, serde::Deserialize)]
struct ApiResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    model: String,
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Usage,
}

impl From<ApiResponse> for CompletionResponse {
    fn from(api: ApiResponse) -> Self {
        CompletionResponse {
            id: api.id,
            model: api.model,
            content: api.content,
            stop_reason: api.stop_reason.as_deref().map(StopReason::parse),
            usage: api.usage,
        }
    }
}

#[derive(Debug, serde::Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, serde::Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Debug, serde::Deserialize)]
struct FlatError {
    message: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn reply(text: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "msg_123",
            "type": "message",
            "role": "assistant",
            "content": [{ "type": "text", "text": text }],
            "model": "claude-sonnet",
            "stop_reason": "end_turn",
            "usage": { "input_tokens": 10, "output_tokens": 5 }
        })
    }

    fn backend(server: &MockServer) -> AnthropicBackend {
        let config = AnthropicConfig::new("sk-test")
            .with_base_url(server.uri())
            .with_retry_backoff(Duration::from_millis(1));
        AnthropicBackend::new(config).unwrap()
    }

    fn request() -> CompletionRequest {
        CompletionRequest::new("claude-sonnet", vec![Message::user("Hi")], 100)
    }

    #[test]
    fn test_config_new() {
        let config = AnthropicConfig::new("test-key");
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.base_url, DEFAULT_API_BASE);
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
    }

    #[test]
    fn test_messages_url_custom_base() {
        let config = AnthropicConfig::new("key").with_base_url("http://localhost:8080/");
        let backend = AnthropicBackend::new(config).unwrap();
        assert_eq!(backend.messages_url(), "http://localhost:8080/v1/messages");
    }

    #[tokio::test]
    async fn test_complete_sends_headers_and_parses_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-test"))
            .and(header("anthropic-version", DEFAULT_API_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("Hello!")))
            .expect(1)
            .mount(&server)
            .await;

        let response = backend(&server).complete(request()).await.unwrap();
        assert_eq!(response.first_text(), "Hello!");
        assert_eq!(response.stop_reason, Some(StopReason::EndTurn));
        assert_eq!(response.usage.output_tokens, 5);
    }

    #[tokio::test]
    async fn test_auth_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "type": "error",
                "error": { "type": "authentication_error", "message": "invalid x-api-key" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = backend(&server).complete(request()).await.unwrap_err();
        assert!(matches!(err, LlmError::Auth(_)));
        assert!(err.to_string().contains("invalid x-api-key"));
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "type": "error",
                "error": { "type": "rate_limit_error", "message": "slow down" }
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("after retry")))
            .mount(&server)
            .await;

        let response = backend(&server).complete(request()).await.unwrap();
        assert_eq!(response.first_text(), "after retry");
    }

    #[tokio::test]
    async fn test_unparseable_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = backend(&server).complete(request()).await.unwrap_err();
        assert!(matches!(err, LlmError::Backend(_)));
        assert!(err.to_string().contains("bad gateway"));
    }
}
