//! Incremental SSE (Server-Sent Events) decoding.
//!
//! Provider streams arrive as lines like:
//!
//! ```text
//! data: {"choices":[{"delta":{"content":"Hello"}}]}
//!
//! data: [DONE]
//! ```
//!
//! [`SseDecoder`] buffers raw bytes across network reads and yields the
//! JSON payload of every complete `data:` line. [`pump_sse`] is the
//! producer loop that owns a response body, feeds the decoder and pushes
//! mapped chunks into an [`ApiStream`] channel.

use std::fmt::Display;

use futures_util::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};

use crate::error::{ProviderError, Result};
use crate::stream::{ApiStream, ApiStreamChunk, ChunkSender};

/// The sentinel payload that marks the end of an SSE stream.
const DONE_SENTINEL: &str = "[DONE]";

/// Byte-buffered decoder for `data:` lines.
///
/// Only complete lines are parsed, so a JSON object or a multi-byte UTF-8
/// character split across two reads decodes the same as if it had arrived
/// in one piece.
#[derive(Debug)]
pub struct SseDecoder {
    provider: &'static str,
    buffer: Vec<u8>,
    malformed: usize,
}

impl SseDecoder {
    pub fn new(provider: &'static str) -> Self {
        Self {
            provider,
            buffer: Vec::new(),
            malformed: 0,
        }
    }

    /// Append `bytes` and parse every line they complete.
    ///
    /// Lines whose payload does not parse as `T` are logged, counted and
    /// skipped.
    pub fn feed<T: DeserializeOwned>(&mut self, bytes: &[u8]) -> Vec<T> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            if let Some(event) = self.parse_line(start, end) {
                events.push(event);
            }
            start = end + 1;
        }
        self.buffer.drain(..start);
        events
    }

    /// End of input. A trailing line without a newline is discarded.
    pub fn finish(&mut self) {
        if !self.buffer.is_empty() {
            debug!(
                provider = self.provider,
                bytes = self.buffer.len(),
                "discarding incomplete trailing SSE line"
            );
            self.buffer.clear();
        }
    }

    /// Number of `data:` lines skipped because their payload did not parse.
    pub fn malformed(&self) -> usize {
        self.malformed
    }

    fn parse_line<T: DeserializeOwned>(&mut self, start: usize, end: usize) -> Option<T> {
        let line = &self.buffer[start..end];
        let line = line.strip_suffix(b"\r").unwrap_or(line);

        let payload = line.strip_prefix(b"data:")?;
        let payload = payload.strip_prefix(b" ").unwrap_or(payload);

        if payload.iter().all(u8::is_ascii_whitespace) || payload == DONE_SENTINEL.as_bytes() {
            return None;
        }

        match serde_json::from_slice(payload) {
            Ok(event) => Some(event),
            Err(e) => {
                self.malformed += 1;
                warn!(
                    provider = self.provider,
                    error = %e,
                    "SSE parse error, skipping line"
                );
                None
            }
        }
    }
}

/// Read `body` to the end, decoding events of type `T` and sending the
/// chunks produced by `map` to `tx`.
///
/// An `Err` from `map` (an error event reported by the provider inside the
/// stream) is forwarded as the final item. The body is owned here and
/// dropped exactly once when this returns: after the last read, after a
/// read error (forwarded as [`ProviderError::Stream`]), after a mapped
/// error, or as soon as the consumer drops its [`ApiStream`]. Returns the
/// number of malformed lines skipped.
pub async fn pump_sse<B, D, E, T, M>(
    provider: &'static str,
    body: B,
    tx: ChunkSender,
    mut map: M,
) -> usize
where
    B: Stream<Item = std::result::Result<D, E>>,
    D: AsRef<[u8]>,
    E: Display,
    T: DeserializeOwned,
    M: FnMut(T) -> Result<Vec<ApiStreamChunk>>,
{
    let mut body = std::pin::pin!(body);
    let mut decoder = SseDecoder::new(provider);

    'read: loop {
        let next = tokio::select! {
            biased;
            _ = tx.closed() => {
                debug!(provider, "stream receiver dropped, stopping");
                break 'read;
            }
            next = body.next() => next,
        };

        match next {
            Some(Ok(bytes)) => {
                for event in decoder.feed::<T>(bytes.as_ref()) {
                    let chunks = match map(event) {
                        Ok(chunks) => chunks,
                        Err(e) => {
                            warn!(provider, error = %e, "provider reported an error mid-stream");
                            let _ = tx.send(Err(e)).await;
                            break 'read;
                        }
                    };
                    for chunk in chunks {
                        trace!(provider, chunk = ?chunk, "streaming chunk");
                        if tx.send(Ok(chunk)).await.is_err() {
                            debug!(provider, "stream receiver dropped, stopping");
                            break 'read;
                        }
                    }
                }
            }
            Some(Err(e)) => {
                warn!(provider, error = %e, "stream read error");
                let _ = tx
                    .send(Err(ProviderError::Stream {
                        provider: provider.to_string(),
                        message: e.to_string(),
                    }))
                    .await;
                break 'read;
            }
            None => {
                decoder.finish();
                debug!(provider, "streaming complete");
                break 'read;
            }
        }
    }

    decoder.malformed()
}

/// Validate a streaming response and hand its body to a producer task.
///
/// A non-success status or a body declared empty fails here, before any
/// chunk is produced.
pub(crate) fn stream_response<T, M>(
    provider: &'static str,
    response: reqwest::Response,
    map: M,
) -> Result<ApiStream>
where
    T: DeserializeOwned + Send + 'static,
    M: FnMut(T) -> Result<Vec<ApiStreamChunk>> + Send + 'static,
{
    let response = check_status(provider, response)?;
    if response.content_length() == Some(0) {
        return Err(ProviderError::EmptyBody {
            provider: provider.to_string(),
        });
    }

    let (tx, stream) = ApiStream::channel();
    tokio::spawn(pump_sse(provider, response.bytes_stream(), tx, map));
    Ok(stream)
}

/// Turn a non-success status into [`ProviderError::Api`].
pub(crate) fn check_status(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        warn!(provider, status = status.as_u16(), "request rejected");
        Err(ProviderError::api(provider, status))
    }
}
