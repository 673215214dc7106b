//! Scripted in-process provider
//!
//! Replays a fixed completion or fragment script without any network access
//! and counts how often it is invoked. Used by the relay tests and handy for
//! running the server without upstream credentials.

use async_stream::stream;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::core::{
    error::LlmError,
    provider::{CompletionProvider, FragmentStream},
    types::{CompletionRequest, Fragment},
};

/// One step of a scripted stream
#[derive(Debug, Clone)]
pub enum ScriptedChunk {
    /// A delta; empty text is dropped like an empty upstream delta
    Text(String),
    /// Fail the stream with this message
    Fail(String),
    /// Never produce anything again
    Stall,
}

impl ScriptedChunk {
    pub fn text(text: impl Into<String>) -> Self {
        ScriptedChunk::Text(text.into())
    }
}

pub struct ScriptedProvider {
    completion: Result<String, String>,
    open_error: Option<String>,
    chunks: Vec<ScriptedChunk>,
    calls: AtomicUsize,
    streams_dropped: Arc<AtomicUsize>,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            completion: Ok(String::new()),
            open_error: None,
            chunks: Vec::new(),
            calls: AtomicUsize::new(0),
            streams_dropped: Arc::new(AtomicUsize::new(0)),
            last_request: Mutex::new(None),
        }
    }

    /// Text returned by `complete`
    pub fn with_completion(mut self, text: impl Into<String>) -> Self {
        self.completion = Ok(text.into());
        self
    }

    /// Make `complete` fail with this message
    pub fn with_completion_error(mut self, message: impl Into<String>) -> Self {
        self.completion = Err(message.into());
        self
    }

    /// Script replayed by `stream_complete`
    pub fn with_chunks(mut self, chunks: Vec<ScriptedChunk>) -> Self {
        self.chunks = chunks;
        self
    }

    /// Make `stream_complete` fail before any fragment
    pub fn with_open_error(mut self, message: impl Into<String>) -> Self {
        self.open_error = Some(message.into());
        self
    }

    /// Number of `complete` plus `stream_complete` calls
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of fragment streams that have been dropped
    pub fn streams_dropped(&self) -> usize {
        self.streams_dropped.load(Ordering::SeqCst)
    }

    /// The most recent request received
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().ok().and_then(|guard| guard.clone())
    }

    fn record(&self, request: CompletionRequest) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.last_request.lock() {
            *guard = Some(request);
        }
    }
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn scripted_error(message: &str) -> LlmError {
    LlmError::ProviderError {
        code: "scripted".to_string(),
        message: message.to_string(),
    }
}

/// Counts drops of the stream that owns it
struct DropCounter(Arc<AtomicUsize>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        self.record(request);
        self.completion.clone().map_err(|message| scripted_error(&message))
    }

    async fn stream_complete(&self, request: CompletionRequest) -> Result<FragmentStream, LlmError> {
        self.record(request);
        if let Some(message) = &self.open_error {
            return Err(scripted_error(message));
        }

        let chunks = self.chunks.clone();
        let counter = DropCounter(self.streams_dropped.clone());

        let fragments = stream! {
            let _counter = counter;
            for chunk in chunks {
                match chunk {
                    ScriptedChunk::Text(text) => {
                        if let Some(fragment) = Fragment::new(text) {
                            yield Ok(fragment);
                        }
                    }
                    ScriptedChunk::Fail(message) => {
                        yield Err(scripted_error(&message));
                        break;
                    }
                    ScriptedChunk::Stall => futures::future::pending::<()>().await,
                }
            }
        };

        Ok(Box::pin(fragments))
    }
}
