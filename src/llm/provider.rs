use async_trait::async_trait;
use thiserror::Error;

use super::types::ChatRequest;

/// Failure modes when talking to the embedding/chat provider.
///
/// Callers get the failure kind explicitly instead of an empty result, so
/// they can decide whether to retry (`is_transient`) or abort.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider rejected credentials")]
    Auth,
    #[error("provider rate limit exceeded")]
    RateLimited,
    #[error("network error reaching provider: {0}")]
    Network(String),
    #[error("provider returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}

impl ProviderError {
    /// Whether a retry with the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Network(_) | ProviderError::RateLimited)
    }
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "openai")
    fn name(&self) -> &str;

    /// check if the provider is healthy/reachable
    async fn health_check(&self) -> Result<bool, ProviderError>;

    /// generate one embedding vector per input text, in input order
    async fn embed(&self, inputs: &[String], model_id: &str)
        -> Result<Vec<Vec<f32>>, ProviderError>;

    /// chat completion (non-streaming)
    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, ProviderError>;
}
