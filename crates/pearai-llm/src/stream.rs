//! The normalized chunk stream every handler produces.
//!
//! Handlers translate their provider's wire events into [`ApiStreamChunk`]
//! values and push them through a bounded channel. The consumer side is an
//! [`ApiStream`], which implements [`futures_util::Stream`]. Dropping the
//! stream closes the channel, which tells the producer task to stop reading
//! and release the response body.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::Result;

/// Channel capacity between a producer task and its [`ApiStream`].
pub const STREAM_BUFFER: usize = 32;

/// Extra data attached to a text chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Marks a notice meant for the operator, not the conversation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_only: Option<bool>,

    /// Notice text carried alongside a UI-only chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// One unit of normalized model output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ApiStreamChunk {
    /// Assistant-visible text (unless flagged UI-only).
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<ChunkMetadata>,
    },

    /// Output from a model's separate thinking channel.
    Reasoning { text: String },

    /// Token accounting for the request.
    #[serde(rename_all = "camelCase")]
    Usage {
        input_tokens: i64,
        output_tokens: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cache_write_tokens: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cache_read_tokens: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        total_cost: Option<f64>,
    },
}

impl ApiStreamChunk {
    /// Plain assistant text.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            metadata: None,
        }
    }

    /// Reasoning text.
    pub fn reasoning(text: impl Into<String>) -> Self {
        Self::Reasoning { text: text.into() }
    }

    /// A usage chunk with only input and output counts.
    pub fn usage(input_tokens: i64, output_tokens: i64) -> Self {
        Self::Usage {
            input_tokens,
            output_tokens,
            cache_write_tokens: None,
            cache_read_tokens: None,
            total_cost: None,
        }
    }

    /// Returns the notice text when this is a UI-only text chunk.
    pub fn ui_only_notice(&self) -> Option<&str> {
        match self {
            Self::Text {
                metadata: Some(meta),
                ..
            } if meta.ui_only == Some(true) => Some(meta.content.as_deref().unwrap_or("")),
            _ => None,
        }
    }
}

/// Producer half handed to the task that reads a response body.
pub type ChunkSender = mpsc::Sender<Result<ApiStreamChunk>>;

/// A lazy, single-pass sequence of chunks from one `create_message` call.
///
/// Items arrive in provider order. A transport failure after streaming
/// started shows up as an `Err` item, after which the stream ends.
pub struct ApiStream {
    rx: mpsc::Receiver<Result<ApiStreamChunk>>,
}

impl ApiStream {
    /// Create a connected sender/stream pair.
    pub fn channel() -> (ChunkSender, ApiStream) {
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        (tx, ApiStream { rx })
    }

    /// A stream that yields the given chunks and ends.
    pub fn from_chunks(chunks: Vec<ApiStreamChunk>) -> Self {
        let (tx, stream) = Self::channel();
        tokio::spawn(async move {
            for chunk in chunks {
                if tx.send(Ok(chunk)).await.is_err() {
                    break;
                }
            }
        });
        stream
    }

    /// Drain the stream, stopping at the first error.
    pub async fn collect_chunks(mut self) -> Result<Vec<ApiStreamChunk>> {
        let mut chunks = Vec::new();
        while let Some(item) = self.next().await {
            chunks.push(item?);
        }
        Ok(chunks)
    }
}

impl Stream for ApiStream {
    type Item = Result<ApiStreamChunk>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl std::fmt::Debug for ApiStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiStream").finish_non_exhaustive()
    }
}
