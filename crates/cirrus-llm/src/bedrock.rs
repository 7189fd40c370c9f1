//! Claude on Amazon Bedrock.
//!
//! Uses the runtime `InvokeModel` endpoint with a Bedrock API key sent as a
//! bearer token, so no request signing is needed.

use async_trait::async_trait;
use reqwest::{Client, header};
use serde::Serialize;
use std::time::Duration;

use crate::anthropic::handle_response;
use crate::backend::{LlmBackend, with_retry};
use crate::error::{LlmError, Result};
use crate::types::{CompletionRequest, CompletionResponse, Message};

/// Messages API version Bedrock expects in the request body.
pub const BEDROCK_ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

/// Default timeout for requests.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Configuration for the Bedrock backend.
#[derive(Debug, Clone)]
pub struct BedrockConfig {
    /// Bedrock API key, sent as a bearer token.
    pub api_key: String,
    /// Region hosting the runtime endpoint.
    pub region: String,
    /// Runtime endpoint; derived from the region unless overridden.
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl BedrockConfig {
    /// Create a config for the regional runtime endpoint.
    pub fn new(api_key: impl Into<String>, region: impl Into<String>) -> Self {
        let region = region.into();
        Self {
            api_key: api_key.into(),
            base_url: format!("https://bedrock-runtime.{region}.amazonaws.com"),
            region,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: 3,
            retry_backoff: Duration::from_millis(500),
        }
    }

    /// Use a custom endpoint (VPC endpoint, proxy).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }
}

/// Request body for Claude models on Bedrock. The model travels in the URL.
#[derive(Debug, Serialize)]
struct InvokeBody<'a> {
    anthropic_version: &'static str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [Message],
}

impl<'a> From<&'a CompletionRequest> for InvokeBody<'a> {
    fn from(request: &'a CompletionRequest) -> Self {
        Self {
            anthropic_version: BEDROCK_ANTHROPIC_VERSION,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: request.system.as_deref(),
            messages: &request.messages,
        }
    }
}

/// Bedrock runtime backend.
pub struct BedrockBackend {
    client: Client,
    config: BedrockConfig,
}

impl BedrockBackend {
    pub fn new(config: BedrockConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn invoke_url(&self, model: &str) -> String {
        format!(
            "{}/model/{}/invoke",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }
}

#[async_trait]
impl LlmBackend for BedrockBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        if request.model.is_empty() {
            return Err(LlmError::InvalidRequest("model id is empty".to_string()));
        }
        let url = self.invoke_url(&request.model);
        let body = InvokeBody::from(&request);

        tracing::debug!(model = %request.model, region = %self.config.region, "Invoking model");

        let mut response = with_retry(
            self.config.max_retries,
            self.config.retry_backoff,
            "bedrock",
            || async {
                let response = self
                    .client
                    .post(&url)
                    .bearer_auth(&self.config.api_key)
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::ACCEPT, "application/json")
                    .json(&body)
                    .send()
                    .await?;

                handle_response(response).await
            },
        )
        .await?;

        if response.model.is_empty() {
            response.model = request.model;
        }
        Ok(response)
    }

    fn name(&self) -> &str {
        "bedrock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL: &str = "anthropic.claude-3-sonnet-20240229-v1:0";

    fn backend(server: &MockServer) -> BedrockBackend {
        let config = BedrockConfig::new("bedrock-token", "us-east-1")
            .with_base_url(server.uri())
            .with_retry_backoff(Duration::from_millis(1));
        BedrockBackend::new(config).unwrap()
    }

    #[test]
    fn test_regional_endpoint() {
        let config = BedrockConfig::new("token", "eu-west-1");
        assert_eq!(
            config.base_url,
            "https://bedrock-runtime.eu-west-1.amazonaws.com"
        );
        let backend = BedrockBackend::new(config).unwrap();
        assert_eq!(
            backend.invoke_url("model-a"),
            "https://bedrock-runtime.eu-west-1.amazonaws.com/model/model-a/invoke"
        );
    }

    #[tokio::test]
    async fn test_invoke_body_and_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/model/{MODEL}/invoke")))
            .and(header("authorization", "Bearer bedrock-token"))
            .and(body_json(serde_json::json!({
                "anthropic_version": "bedrock-2023-05-31",
                "max_tokens": 1000,
                "temperature": 0.5,
                "messages": [{ "role": "user", "content": "How many hosts?" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "msg_bdrk_1",
                "type": "message",
                "role": "assistant",
                "content": [{ "type": "text", "text": "Three." }],
                "stop_reason": "end_turn",
                "usage": { "input_tokens": 12, "output_tokens": 2 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = CompletionRequest::new(MODEL, vec![Message::user("How many hosts?")], 1000)
            .with_temperature(0.5);
        let response = backend(&server).complete(request).await.unwrap();

        assert_eq!(response.first_text(), "Three.");
        assert_eq!(response.model, MODEL);
    }

    #[tokio::test]
    async fn test_access_denied_maps_to_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "message": "You don't have access to the model with the specified model ID."
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = CompletionRequest::new(MODEL, vec![Message::user("Hi")], 10);
        let err = backend(&server).complete(request).await.unwrap_err();
        assert!(matches!(err, LlmError::Auth(_)));
    }

    #[tokio::test]
    async fn test_throttling_exhausts_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "message": "Too many requests, please wait before trying again."
            })))
            .expect(4)
            .mount(&server)
            .await;

        let request = CompletionRequest::new(MODEL, vec![Message::user("Hi")], 10);
        let err = backend(&server).complete(request).await.unwrap_err();
        assert!(matches!(err, LlmError::RateLimit(_)));
    }
}
