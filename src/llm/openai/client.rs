//! OpenAI-compatible chat completion client

use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use crate::llm::core::{
    error::LlmError,
    provider::{CompletionProvider, FragmentStream},
    types::CompletionRequest,
};

use super::mapper::{from_api_error, from_chunk, from_error_response, from_response, to_chat_request};
use super::sse::parse_sse_stream;
use super::types::{ChatCompletionResponse, UpstreamEvent};

/// Client for any provider exposing `POST {base_url}/chat/completions`
pub struct OpenAiClient {
    /// HTTP client for making requests
    http_client: Client,
    /// API root, e.g. `https://integrate.api.nvidia.com/v1`
    base_url: String,
    /// Bearer credential
    api_key: String,
    /// Model identifier sent with every request
    model: String,
    /// Total time allowed for a non-streaming call
    request_timeout: Duration,
}

impl OpenAiClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        request_timeout: Duration,
    ) -> Result<Self, LlmError> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| LlmError::HttpError {
                status: 0,
                body: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http_client,
            base_url,
            api_key,
            model,
            request_timeout,
        })
    }

    /// Build the chat completions endpoint URL
    fn build_endpoint_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    async fn send(&self, request: CompletionRequest, stream: bool) -> Result<reqwest::Response, LlmError> {
        let body = to_chat_request(request, &self.model, stream);

        let mut builder = self
            .http_client
            .post(self.build_endpoint_url())
            .bearer_auth(&self.api_key)
            .json(&body);

        // Streams are bounded by the relay's idle timeout instead
        builder = if stream {
            builder.header("Accept", "text/event-stream")
        } else {
            builder.timeout(self.request_timeout)
        };

        debug!(model = %self.model, stream, "sending chat completion request");
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            return Err(from_error_response(status, &headers, &body));
        }

        Ok(response)
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let response = self.send(request, false).await?;
        let body = response.text().await?;
        let completion: ChatCompletionResponse = serde_json::from_str(&body)?;
        Ok(from_response(completion))
    }

    async fn stream_complete(&self, request: CompletionRequest) -> Result<FragmentStream, LlmError> {
        let response = self.send(request, true).await?;
        let mut events = parse_sse_stream(response.bytes_stream());

        let fragments = stream! {
            let mut finish_reason: Option<String> = None;
            while let Some(event) = events.next().await {
                match event {
                    Ok(UpstreamEvent::Chunk(chunk)) => {
                        if let Some(reason) = chunk.choices.iter().find_map(|c| c.finish_reason.clone()) {
                            debug!(finish_reason = %reason, "upstream finished generating");
                            finish_reason = Some(reason);
                        }
                        if let Some(fragment) = from_chunk(chunk) {
                            yield Ok(fragment);
                        }
                    }
                    Ok(UpstreamEvent::Done) => return,
                    Ok(UpstreamEvent::Error(error)) => {
                        yield Err(from_api_error(error));
                        return;
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }

            // A cleanly framed body that ends without [DONE] still counts as exhausted
            if finish_reason.is_none() {
                warn!("upstream stream ended without [DONE] or a finish reason");
            }
        };

        Ok(Box::pin(fragments))
    }
}
