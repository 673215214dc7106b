//! Error types for the relay boundary and the relay wire protocol

use thiserror::Error;

/// Request rejected before any upstream call is made
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Symptoms are required")]
    MissingSymptoms,
}

/// Failures decoding the relay stream (consumer side only)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("Frame is not valid UTF-8")]
    InvalidUtf8,

    #[error("Malformed frame payload: {0}")]
    MalformedPayload(String),

    #[error("Stream ended inside a partial frame")]
    IncompleteFrame,

    #[error("Stream ended before a terminal event")]
    UnexpectedEof,

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Errors surfaced by [`crate::client::RelayClient`]
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The relay answered with a non-success status
    #[error("Request rejected (status {status}): {message}")]
    Rejected {
        status: u16,
        message: String,
        details: Option<String>,
    },

    /// The relay delivered an in-band error event
    #[error("Recommendation failed: {0}")]
    Upstream(String),

    #[error("Protocol error: {0}")]
    Protocol(#[from] FrameError),
}
