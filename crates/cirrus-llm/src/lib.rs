//! Model backend abstraction for Cirrus.
//!
//! This crate provides:
//! - [`LlmBackend`]: the trait every model provider implements
//! - [`BedrockBackend`]: Claude on Amazon Bedrock (bearer-token auth)
//! - [`AnthropicBackend`]: Anthropic's Messages API
//! - [`with_retry`]: exponential backoff for transient failures
//! - [`build_backend`]: construct a backend from resolved settings
//! - [`MockBackend`]: scripted responses for tests (`testing` feature)

pub mod anthropic;
pub mod backend;
pub mod bedrock;
pub mod error;
pub mod types;

pub use anthropic::{AnthropicBackend, AnthropicConfig};
#[cfg(any(test, feature = "testing"))]
pub use backend::MockBackend;
pub use backend::{BackendKind, LlmBackend, LlmSettings, SharedBackend, build_backend, with_retry};
pub use bedrock::{BedrockBackend, BedrockConfig};
pub use error::{LlmError, RateLimitInfo, Result};
pub use types::{
    CompletionRequest, CompletionResponse, ContentBlock, Message, Role, StopReason, Usage,
};
