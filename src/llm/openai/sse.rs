//! Server-Sent Events (SSE) parser for chat completion streams

use async_stream::stream;
use bytes::Bytes;
use futures::stream::Stream;
use futures::StreamExt;
use std::pin::Pin;
use tracing::warn;

use crate::llm::core::error::LlmError;
use crate::error::FrameError;
use crate::sse::{FrameDecoder, DONE_SENTINEL};

use super::types::{ChatCompletionChunk, ErrorEnvelope, UpstreamEvent};

/// Parse a stream of bytes as chat completion SSE events
///
/// The provider sends one JSON chunk per frame and a bare sentinel at the end:
/// ```text
/// data: {"choices":[{"delta":{"content":"Take "}}]}
///
/// data: [DONE]
/// ```
///
/// Frame reassembly happens on raw bytes, so a read boundary inside a
/// multi-byte character or a JSON object is harmless. Payloads that are not
/// JSON objects are logged and skipped. When the body ends, a trailing frame
/// missing only its blank line is still parsed; a frame cut mid-line is a
/// truncated stream and ends with [`LlmError::StreamError`].
pub fn parse_sse_stream<S>(byte_stream: S) -> Pin<Box<dyn Stream<Item = Result<UpstreamEvent, LlmError>> + Send>>
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
{
    let event_stream = stream! {
        let mut decoder = FrameDecoder::new();
        let mut byte_stream = Box::pin(byte_stream);

        while let Some(chunk_result) = byte_stream.next().await {
            let chunk = match chunk_result {
                Ok(bytes) => bytes,
                Err(e) => {
                    yield Err(LlmError::StreamError(e.to_string()));
                    return;
                }
            };

            let frames = match decoder.push(&chunk) {
                Ok(frames) => frames,
                Err(e) => {
                    yield Err(LlmError::StreamError(e.to_string()));
                    return;
                }
            };

            for data in frames {
                if let Some(event) = parse_event(&data) {
                    yield Ok(event);
                }
            }
        }

        match decoder.finish() {
            Ok(Some(data)) => {
                if let Some(event) = parse_event(&data) {
                    yield Ok(event);
                }
            }
            Ok(None) => {}
            Err(FrameError::IncompleteFrame) => {
                yield Err(LlmError::StreamError("upstream stream truncated".to_string()));
            }
            Err(e) => yield Err(LlmError::StreamError(e.to_string())),
        }
    };

    Box::pin(event_stream)
}

/// Parse the data field of a single frame
fn parse_event(data: &str) -> Option<UpstreamEvent> {
    let data = data.trim();
    if data.is_empty() {
        return None;
    }
    if data == DONE_SENTINEL {
        return Some(UpstreamEvent::Done);
    }

    let value: serde_json::Value = match serde_json::from_str(data) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, data, "skipping unparseable upstream delta");
            return None;
        }
    };

    // Some providers send `"error": null` on every normal chunk
    if value.get("error").filter(|e| !e.is_null()).is_some() {
        return match serde_json::from_value::<ErrorEnvelope>(value) {
            Ok(envelope) => Some(UpstreamEvent::Error(envelope.error)),
            Err(e) => {
                warn!(error = %e, data, "skipping unparseable upstream error");
                None
            }
        };
    }

    match serde_json::from_value::<ChatCompletionChunk>(value) {
        Ok(chunk) => Some(UpstreamEvent::Chunk(chunk)),
        Err(e) => {
            warn!(error = %e, data, "skipping malformed upstream delta");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn byte_stream(
        chunks: Vec<&'static [u8]>,
    ) -> impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static {
        stream::iter(chunks.into_iter().map(|c| Ok(Bytes::from_static(c))))
    }

    async fn collect(chunks: Vec<&'static [u8]>) -> Vec<UpstreamEvent> {
        parse_sse_stream(byte_stream(chunks))
            .map(|event| event.expect("stream error"))
            .collect()
            .await
    }

    fn delta_text(event: &UpstreamEvent) -> Option<String> {
        match event {
            UpstreamEvent::Chunk(chunk) => chunk.choices[0]
                .delta
                .as_ref()
                .and_then(|d| d.content.clone()),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_parse_content_chunk() {
        let events = collect(vec![
            b"data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hello\"}}]}\n\n",
        ])
        .await;

        assert_eq!(events.len(), 1);
        assert_eq!(delta_text(&events[0]).as_deref(), Some("Hello"));
    }

    #[tokio::test]
    async fn test_parse_done_sentinel() {
        let events = collect(vec![b"data: [DONE]\n\n"]).await;
        assert!(matches!(events.as_slice(), [UpstreamEvent::Done]));
    }

    #[tokio::test]
    async fn test_parse_chunked_events() {
        let events = collect(vec![
            b"data: {\"choices\":[{\"delta\":{\"con",
            b"tent\":\"Hello\"}}]}\n",
            b"\ndata: [DONE]\n\n",
        ])
        .await;

        assert_eq!(events.len(), 2);
        assert_eq!(delta_text(&events[0]).as_deref(), Some("Hello"));
        assert!(matches!(events[1], UpstreamEvent::Done));
    }

    #[tokio::test]
    async fn test_parse_split_multibyte_character() {
        // "é" is 0xC3 0xA9; the read boundary falls between the two bytes
        let events = collect(vec![
            b"data: {\"choices\":[{\"delta\":{\"content\":\"caf\xc3",
            b"\xa9\"}}]}\n\n",
        ])
        .await;

        assert_eq!(delta_text(&events[0]).as_deref(), Some("café"));
    }

    #[tokio::test]
    async fn test_parse_in_band_error() {
        let events = collect(vec![
            b"data: {\"error\":{\"message\":\"model overloaded\",\"type\":\"server_error\"}}\n\n",
        ])
        .await;

        match &events[0] {
            UpstreamEvent::Error(error) => {
                assert_eq!(error.message, "model overloaded");
                assert_eq!(error.error_type.as_deref(), Some("server_error"));
            }
            other => panic!("Expected Error event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_parse_skips_malformed_payloads() {
        let events = collect(vec![
            b"data: {invalid json}\n\n",
            b"data: [1,2,3]\n\n",
            b": keep-alive\n\n",
            b"data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\n",
        ])
        .await;

        assert_eq!(events.len(), 1);
        assert_eq!(delta_text(&events[0]).as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn test_parse_truncated_stream_is_an_error() {
        let events: Vec<_> = parse_sse_stream(byte_stream(vec![
            b"data: {\"choices\":[{\"delta\":{\"content\":\"Take \"}}]}\n\n",
            b"data: {\"choices\":[{\"delta\":{\"content\":\"ibupro",
        ]))
        .collect()
        .await;

        assert_eq!(events.len(), 2);
        assert_eq!(
            delta_text(events[0].as_ref().unwrap()).as_deref(),
            Some("Take ")
        );
        match &events[1] {
            Err(LlmError::StreamError(message)) => assert!(message.contains("truncated")),
            other => panic!("Expected truncation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_parse_flushes_unterminated_last_frame() {
        let events = collect(vec![
            b"data: {\"choices\":[{\"delta\":{\"content\":\"Take \"}}]}\n\n",
            b"data: {\"choices\":[{\"delta\":{\"content\":\"ibuprofen.\"}}]}\n",
        ])
        .await;

        assert_eq!(events.len(), 2);
        assert_eq!(delta_text(&events[1]).as_deref(), Some("ibuprofen."));
    }

    #[tokio::test]
    async fn test_parse_ignores_null_error_field() {
        let events = collect(vec![
            b"data: {\"error\":null,\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\n",
        ])
        .await;

        assert_eq!(events.len(), 1);
        assert_eq!(delta_text(&events[0]).as_deref(), Some("ok"));
    }
}
