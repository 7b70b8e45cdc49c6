//! Unified streaming client over heterogeneous LLM provider APIs.
//!
//! Every handler takes a system prompt plus a list of
//! [`ConversationTurn`]s and returns an [`ApiStream`] of normalized
//! [`ApiStreamChunk`]s (text, reasoning, usage), whatever wire protocol the
//! provider speaks.
//!
//! # Architecture
//!
//! - [`ApiHandler`] trait defines the handler interface
//! - [`OpenAiCompatHandler`], [`AnthropicHandler`] and [`DeepSeekHandler`]
//!   implement it for each protocol; [`ProviderHandler`] is the closed set
//! - [`PearAiHandler`] routes PearAI model ids (including catalog aliases)
//!   to one of those handlers
//! - [`SseDecoder`] turns response bytes into events for all of them
//! - [`build_api_handler`] builds the handler selected in
//!   [`ApiHandlerOptions`]
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use futures_util::StreamExt;
//! use pearai_llm::{build_api_handler, ApiHandlerOptions, ApiProvider, ApiStreamChunk, ConversationTurn};
//!
//! let mut options = ApiHandlerOptions {
//!     api_provider: ApiProvider::DeepSeek,
//!     ..Default::default()
//! };
//! options.apply_env_overrides(|k| std::env::var(k).ok());
//!
//! let handler = build_api_handler(&options)?;
//! let mut stream = handler
//!     .create_message("You are a helpful assistant.", &[ConversationTurn::user("What is Rust?")])
//!     .await?;
//! while let Some(chunk) = stream.next().await {
//!     match chunk? {
//!         ApiStreamChunk::Text { text, .. } => print!("{text}"),
//!         ApiStreamChunk::Reasoning { .. } => {}
//!         ApiStreamChunk::Usage { input_tokens, output_tokens, .. } => {
//!             println!("\n[{input_tokens} in / {output_tokens} out]");
//!         }
//!     }
//! }
//! ```

pub mod anthropic;
pub mod catalog;
pub mod config;
pub mod deepseek;
pub mod error;
pub mod format;
pub mod handler;
pub mod models;
pub mod notify;
pub mod openai_compat;
pub mod pearai;
pub mod provider;
pub mod secret;
pub mod sse;
pub mod stream;
pub mod types;

pub use anthropic::AnthropicHandler;
pub use catalog::{Route, resolve_route};
pub use config::{ApiHandlerOptions, ApiProvider, CatalogEntry, ModelCatalog};
pub use deepseek::DeepSeekHandler;
pub use error::{ProviderError, Result};
pub use handler::{ProviderHandler, build_api_handler};
pub use models::ModelInfo;
pub use notify::{Notice, NoticeAction, Notifier, TracingNotifier};
pub use openai_compat::OpenAiCompatHandler;
pub use pearai::{PearAiHandler, RouterPhase};
pub use provider::ApiHandler;
pub use secret::ApiKey;
pub use sse::SseDecoder;
pub use stream::{ApiStream, ApiStreamChunk, ChunkMetadata};
pub use types::{ApiModel, ContentPart, ConversationTurn, Role};
