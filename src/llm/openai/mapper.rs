//! Mapping between abstraction types and OpenAI-compatible wire types

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use std::time::Duration;

use crate::llm::core::{
    error::LlmError,
    types::{CompletionRequest, Fragment, Message},
};

use super::types::{
    ApiError, ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, ChatMessage,
    ErrorEnvelope,
};

/// Convert our abstraction request to the chat completion request body
pub fn to_chat_request(request: CompletionRequest, model: &str, stream: bool) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: model.to_string(),
        messages: request.messages.into_iter().map(to_chat_message).collect(),
        temperature: request.config.temperature,
        max_tokens: request.config.max_tokens,
        stream,
    }
}

fn to_chat_message(message: Message) -> ChatMessage {
    ChatMessage {
        role: message.role.as_str().to_string(),
        content: message.content,
    }
}

/// Text of the first choice, empty when the payload has none
pub fn from_response(response: ChatCompletionResponse) -> String {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .unwrap_or_default()
}

/// Fragment carried by a streaming chunk, if any
///
/// Chunks without choices, without a delta, or with empty content (role
/// announcements, finish markers) produce nothing.
pub fn from_chunk(chunk: ChatCompletionChunk) -> Option<Fragment> {
    chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta)
        .and_then(|delta| delta.content)
        .and_then(Fragment::new)
}

/// Convert a provider error object
pub fn from_api_error(error: ApiError) -> LlmError {
    let code = match error.code {
        Some(serde_json::Value::String(code)) => code,
        Some(serde_json::Value::Number(code)) => code.to_string(),
        _ => error.error_type.unwrap_or_else(|| "unknown".to_string()),
    };

    LlmError::ProviderError {
        code,
        message: error.message,
    }
}

/// Convert a non-success HTTP response into an error
pub fn from_error_response(status: StatusCode, headers: &HeaderMap, body: &str) -> LlmError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = headers
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        return LlmError::RateLimitExceeded { retry_after };
    }

    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => from_api_error(envelope.error),
        _ => LlmError::HttpError {
            status: status.as_u16(),
            body: body.to_string(),
        },
    }
}
