//! Streaming relay sessions
//!
//! A session owns one upstream fragment stream and the sending half of the
//! channel that feeds one inbound SSE response. It moves through
//! `StreamOpen -> Emitting* -> Terminal` exactly once:
//!
//! - upstream exhausted: one `Done` event
//! - upstream failed (at open, mid-stream, or stalled): one `Error` event
//! - receiver dropped (the client went away): nothing more is sent and the
//!   upstream stream is dropped immediately

use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::DEFAULT_STREAM_IDLE_TIMEOUT_SECS;
use crate::llm::{CompletionProvider, CompletionRequest, LlmError};
use crate::sse::StreamEvent;

/// Events buffered between the session and a slow client
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySettings {
    /// Longest wait for the next upstream fragment
    pub idle_timeout: Duration,
    pub channel_capacity: usize,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(DEFAULT_STREAM_IDLE_TIMEOUT_SECS),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Terminal state reached by a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Done { fragments: usize },
    Error(String),
    PeerClosed,
}

pub struct RelaySession {
    id: Uuid,
    provider: Arc<dyn CompletionProvider>,
    request: CompletionRequest,
    sender: mpsc::Sender<StreamEvent>,
    idle_timeout: Duration,
}

impl RelaySession {
    /// Create a session and the receiver its events are delivered to
    pub fn open(
        provider: Arc<dyn CompletionProvider>,
        request: CompletionRequest,
        settings: &RelaySettings,
    ) -> (Self, mpsc::Receiver<StreamEvent>) {
        let (sender, receiver) = mpsc::channel(settings.channel_capacity.max(1));
        let session = Self {
            id: Uuid::new_v4(),
            provider,
            request,
            sender,
            idle_timeout: settings.idle_timeout,
        };
        (session, receiver)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Run the session on its own task
    pub fn spawn(self) -> JoinHandle<SessionOutcome> {
        let span = info_span!("relay_session", session_id = %self.id);
        tokio::spawn(self.run().instrument(span))
    }

    /// Pump upstream fragments into the channel until a terminal state
    pub async fn run(self) -> SessionOutcome {
        let RelaySession {
            provider,
            request,
            sender,
            idle_timeout,
            ..
        } = self;

        debug!("opening upstream stream");
        let opened = tokio::select! {
            biased;
            _ = sender.closed() => return log_outcome(SessionOutcome::PeerClosed),
            opened = tokio::time::timeout(idle_timeout, provider.stream_complete(request)) => opened,
        };

        let mut upstream = match opened {
            Ok(Ok(upstream)) => upstream,
            Ok(Err(e)) => return log_outcome(fail(&sender, e).await),
            Err(_elapsed) => {
                return log_outcome(fail(&sender, LlmError::IdleTimeout(idle_timeout)).await)
            }
        };

        let mut fragments = 0;
        loop {
            let next = tokio::select! {
                biased;
                _ = sender.closed() => return log_outcome(SessionOutcome::PeerClosed),
                next = tokio::time::timeout(idle_timeout, upstream.next()) => next,
            };

            match next {
                Ok(Some(Ok(fragment))) => {
                    if sender.send(StreamEvent::Fragment(fragment.content)).await.is_err() {
                        return log_outcome(SessionOutcome::PeerClosed);
                    }
                    fragments += 1;
                }
                Ok(Some(Err(e))) => return log_outcome(fail(&sender, e).await),
                Ok(None) => {
                    let outcome = match sender.send(StreamEvent::Done).await {
                        Ok(()) => SessionOutcome::Done { fragments },
                        Err(_) => SessionOutcome::PeerClosed,
                    };
                    return log_outcome(outcome);
                }
                Err(_elapsed) => {
                    return log_outcome(fail(&sender, LlmError::IdleTimeout(idle_timeout)).await)
                }
            }
        }
    }
}

/// Deliver the in-band error event
async fn fail(sender: &mpsc::Sender<StreamEvent>, error: LlmError) -> SessionOutcome {
    let message = error.to_string();
    match sender.send(StreamEvent::Error(message.clone())).await {
        Ok(()) => SessionOutcome::Error(message),
        Err(_) => SessionOutcome::PeerClosed,
    }
}

fn log_outcome(outcome: SessionOutcome) -> SessionOutcome {
    match &outcome {
        SessionOutcome::Done { fragments } => info!(fragments, "relay completed"),
        SessionOutcome::Error(message) => warn!(error = %message, "relay ended with upstream error"),
        SessionOutcome::PeerClosed => info!("client disconnected, upstream released"),
    }
    outcome
}
