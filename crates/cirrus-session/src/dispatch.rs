//! Sends a question plus infrastructure context to the model.

use std::sync::Arc;

use cirrus_llm::{CompletionRequest, LlmError, Message, SharedBackend};
use cirrus_types::InstanceFilter;

use crate::context::SessionContext;
use crate::error::Result;
use crate::snapshot::ContextSnapshot;

/// Prefix of every reply that reports a model failure instead of an answer.
pub const QUERY_ERROR_PREFIX: &str = "Error communicating with the model: ";

/// Sampling options for one query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryOptions {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            temperature: 0.7,
        }
    }
}

/// Whether a model backend is available.
#[derive(Clone)]
pub enum ModelAccess {
    Ready(SharedBackend),
    /// No backend could be built; the reason is reported on every query.
    Unconfigured(String),
}

impl From<cirrus_llm::Result<SharedBackend>> for ModelAccess {
    fn from(result: cirrus_llm::Result<SharedBackend>) -> Self {
        match result {
            Ok(backend) => ModelAccess::Ready(backend),
            Err(e) => ModelAccess::Unconfigured(e.to_string()),
        }
    }
}

/// Wraps a [`ContextSnapshot`] and a question into one model request.
pub struct QueryDispatcher {
    context: Arc<SessionContext>,
    access: ModelAccess,
    model: String,
}

impl QueryDispatcher {
    pub fn new(context: Arc<SessionContext>, access: ModelAccess, model: impl Into<String>) -> Self {
        Self {
            context,
            access,
            model: model.into(),
        }
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Name of the active backend, if any.
    pub fn backend_name(&self) -> Option<&str> {
        match &self.access {
            ModelAccess::Ready(backend) => Some(backend.name()),
            ModelAccess::Unconfigured(_) => None,
        }
    }

    /// Ask the model `message` with infrastructure context.
    ///
    /// Without a snapshot, one is built from every reachable instance plus
    /// the history; an inventory failure there is the only error returned.
    /// Model failures come back as `Ok` text starting with
    /// [`QUERY_ERROR_PREFIX`].
    pub async fn query(
        &self,
        message: &str,
        snapshot: Option<&ContextSnapshot>,
        options: QueryOptions,
    ) -> Result<String> {
        let built;
        let snapshot = match snapshot {
            Some(snapshot) => snapshot,
            None => {
                built = self
                    .context
                    .build_snapshot(&InstanceFilter::default(), true)
                    .await?;
                &built
            }
        };

        let prompt = format!(
            "<infrastructure_context>\n{}\n</infrastructure_context>\n\n{}",
            snapshot.to_json()?,
            message
        );

        match self.complete(prompt, options).await {
            Ok(text) => Ok(text),
            Err(e) => {
                tracing::error!(model = %self.model, error = %e, "Model query failed");
                Ok(format!("{QUERY_ERROR_PREFIX}{e}"))
            }
        }
    }

    async fn complete(&self, prompt: String, options: QueryOptions) -> cirrus_llm::Result<String> {
        let backend = match &self.access {
            ModelAccess::Ready(backend) => backend,
            ModelAccess::Unconfigured(reason) => return Err(LlmError::Config(reason.clone())),
        };

        let request = CompletionRequest::new(&self.model, vec![Message::user(prompt)], options.max_tokens)
            .with_temperature(options.temperature);

        tracing::debug!(backend = backend.name(), model = %self.model, "Sending query");
        let response = backend.complete(request).await?;
        tracing::debug!(
            backend = backend.name(),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Query answered"
        );
        Ok(response.first_text().to_string())
    }
}
