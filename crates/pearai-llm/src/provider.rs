//! The core [`ApiHandler`] trait.
//!
//! Every handler (generic OpenAI-compatible, Anthropic, DeepSeek and the
//! PearAI router) implements this trait, so callers can hold a
//! `Box<dyn ApiHandler>` without knowing which protocol is behind it.

use async_trait::async_trait;

use crate::error::Result;
use crate::stream::ApiStream;
use crate::types::{ApiModel, ConversationTurn};

/// A configured connection to one model.
///
/// # Example
///
/// ```rust,ignore
/// use futures_util::StreamExt;
/// use pearai_llm::{build_api_handler, ApiHandlerOptions, ApiStreamChunk, ConversationTurn};
///
/// let handler = build_api_handler(&options)?;
/// let mut stream = handler
///     .create_message("You are helpful.", &[ConversationTurn::user("Hi")])
///     .await?;
/// while let Some(chunk) = stream.next().await {
///     if let ApiStreamChunk::Text { text, .. } = chunk? {
///         print!("{text}");
///     }
/// }
/// ```
#[async_trait]
pub trait ApiHandler: Send + Sync {
    /// Display name used in errors and logs (e.g. "DeepSeek").
    fn name(&self) -> &str;

    /// The model id and metadata this handler sends requests for.
    ///
    /// Concrete handlers answer immediately; the PearAI router first waits
    /// until its delegate is resolved.
    async fn model(&self) -> ApiModel;

    /// Start a streaming request.
    ///
    /// # Errors
    ///
    /// Fails before any chunk is produced on a non-success status or an
    /// empty body. Failures while reading arrive as `Err` stream items.
    async fn create_message(
        &self,
        system_prompt: &str,
        turns: &[ConversationTurn],
    ) -> Result<ApiStream>;

    /// Run a single non-streaming prompt and return the reply text.
    async fn complete_prompt(&self, prompt: &str) -> Result<String>;
}
