//! Relay wire framing
//!
//! Every [`StreamEvent`] travels as one text-event-stream frame:
//!
//! ```text
//! data: {"content":"Take "}
//!
//! data: {"error":"Provider error (500): overloaded"}
//!
//! data: [DONE]
//! ```
//!
//! `Done` is a bare sentinel rather than JSON, so decoding special-cases it.

use async_stream::stream;
use futures::stream::Stream;
use futures::StreamExt;
use serde::Deserialize;
use std::convert::Infallible;
use warp::sse::Event;

use crate::error::FrameError;

/// Payload of the end-of-stream frame
pub const DONE_SENTINEL: &str = "[DONE]";

/// One unit on the relay connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Fragment(String),
    Done,
    Error(String),
}

impl StreamEvent {
    /// `Done` and `Error` end a relay session
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done | StreamEvent::Error(_))
    }
}

/// Data field carried by the frame for `event`
pub fn event_payload(event: &StreamEvent) -> String {
    match event {
        StreamEvent::Fragment(content) => serde_json::json!({ "content": content }).to_string(),
        StreamEvent::Error(message) => serde_json::json!({ "error": message }).to_string(),
        StreamEvent::Done => DONE_SENTINEL.to_string(),
    }
}

/// Encode a complete frame, blank-line terminator included
pub fn encode_frame(event: &StreamEvent) -> String {
    format!("data: {}\n\n", event_payload(event))
}

/// Build the warp SSE event for `event`
pub fn to_sse_event(event: &StreamEvent) -> Result<Event, Infallible> {
    Ok(Event::default().data(event_payload(event)))
}

#[derive(Deserialize)]
struct WirePayload {
    content: Option<String>,
    error: Option<String>,
}

/// Decode the data field of one frame
pub fn decode_payload(data: &str) -> Result<StreamEvent, FrameError> {
    if data.trim() == DONE_SENTINEL {
        return Ok(StreamEvent::Done);
    }

    let payload: WirePayload = serde_json::from_str(data)
        .map_err(|e| FrameError::MalformedPayload(format!("{}: {}", e, data)))?;

    match (payload.error, payload.content) {
        (Some(message), _) => Ok(StreamEvent::Error(message)),
        (None, Some(content)) => Ok(StreamEvent::Fragment(content)),
        (None, None) => Err(FrameError::MalformedPayload(data.to_string())),
    }
}

/// Incremental text-event-stream frame splitter
///
/// Bytes are buffered until a blank line closes the frame, so frames (and
/// multi-byte characters inside them) split across reads are reassembled
/// before anything is parsed.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one read; returns the data fields of every frame it completed.
    ///
    /// Frames without a `data` field (keep-alive comments) are dropped.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<String>, FrameError> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some((end, separator_len)) = find_frame_end(&self.buffer) {
            let frame: Vec<u8> = self.buffer.drain(..end + separator_len).take(end).collect();
            let text = String::from_utf8(frame).map_err(|_| FrameError::InvalidUtf8)?;
            if let Some(data) = frame_data(&text) {
                frames.push(data);
            }
        }

        Ok(frames)
    }

    /// Whether a partial frame is still buffered
    pub fn has_pending(&self) -> bool {
        self.buffer.iter().any(|b| !b.is_ascii_whitespace())
    }

    /// Flush what is left once the byte stream has ended.
    ///
    /// A trailing frame whose last line is terminated (only the closing blank
    /// line is missing) is returned. A frame cut inside a line is
    /// [`FrameError::IncompleteFrame`].
    pub fn finish(&mut self) -> Result<Option<String>, FrameError> {
        if !self.has_pending() {
            self.buffer.clear();
            return Ok(None);
        }
        if self.buffer.last() != Some(&b'\n') {
            return Err(FrameError::IncompleteFrame);
        }

        let frame = std::mem::take(&mut self.buffer);
        let text = String::from_utf8(frame).map_err(|_| FrameError::InvalidUtf8)?;
        Ok(frame_data(&text))
    }
}

fn find_frame_end(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = find(buffer, b"\n\n").map(|i| (i, 2));
    let crlf = find(buffer, b"\r\n\r\n").map(|i| (i, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn frame_data(text: &str) -> Option<String> {
    let mut data: Option<String> = None;

    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);

        // Comments carry keep-alives
        if line.is_empty() || line.starts_with(':') {
            continue;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        if field == "data" {
            match data.as_mut() {
                Some(existing) => {
                    existing.push('\n');
                    existing.push_str(value);
                }
                None => data = Some(value.to_string()),
            }
        }
    }

    data
}

/// Decode a relay byte stream into events.
///
/// The stream ends after the first terminal event. A trailing frame missing
/// only its blank line is still decoded. A byte stream that ends without a
/// terminal event yields [`FrameError::IncompleteFrame`] or
/// [`FrameError::UnexpectedEof`]; any other error also ends the stream.
pub fn decode_stream<S, B, E>(byte_stream: S) -> impl Stream<Item = Result<StreamEvent, FrameError>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    stream! {
        let mut decoder = FrameDecoder::new();
        let mut byte_stream = Box::pin(byte_stream);

        while let Some(chunk) = byte_stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(FrameError::Transport(e.to_string()));
                    return;
                }
            };

            let payloads = match decoder.push(chunk.as_ref()) {
                Ok(payloads) => payloads,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            for data in payloads {
                match decode_payload(&data) {
                    Ok(event) => {
                        let terminal = event.is_terminal();
                        yield Ok(event);
                        if terminal {
                            return;
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        }

        match decoder.finish() {
            Ok(Some(data)) => match decode_payload(&data) {
                Ok(event) => {
                    let terminal = event.is_terminal();
                    yield Ok(event);
                    if !terminal {
                        yield Err(FrameError::UnexpectedEof);
                    }
                }
                Err(e) => yield Err(e),
            },
            Ok(None) => yield Err(FrameError::UnexpectedEof),
            Err(e) => yield Err(e),
        }
    }
}
