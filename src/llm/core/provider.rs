//! Provider trait for completion backends

use async_trait::async_trait;
use futures::stream::Stream;
use std::pin::Pin;
use std::sync::Arc;

use super::{
    error::LlmError,
    types::{CompletionRequest, Fragment},
};
use crate::config::UpstreamConfig;
use crate::llm::openai::OpenAiClient;

/// Lazily produced fragments of one streaming completion
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<Fragment, LlmError>> + Send>>;

/// Main interface that all completion backends must satisfy
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Request a full completion and wait for the whole message.
    ///
    /// A response without content is a success and yields an empty string.
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;

    /// Open a streaming completion.
    ///
    /// The returned stream yields non-empty fragments in upstream order. It
    /// ends on natural exhaustion, or after yielding exactly one error.
    async fn stream_complete(&self, request: CompletionRequest)
        -> Result<FragmentStream, LlmError>;
}

/// Create the completion provider described by the upstream configuration
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn create_provider(config: &UpstreamConfig) -> Result<Arc<dyn CompletionProvider>, LlmError> {
    let client = OpenAiClient::new(
        config.base_url.clone(),
        config.api_key.clone(),
        config.model.clone(),
        config.request_timeout,
    )?;
    Ok(Arc::new(client))
}
