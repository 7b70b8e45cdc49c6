//! The closed set of concrete handlers and the top-level factory.

use std::sync::Arc;

use async_trait::async_trait;

use crate::anthropic::AnthropicHandler;
use crate::config::{ApiHandlerOptions, ApiProvider};
use crate::deepseek::DeepSeekHandler;
use crate::error::Result;
use crate::notify::TracingNotifier;
use crate::openai_compat::OpenAiCompatHandler;
use crate::pearai::PearAiHandler;
use crate::provider::ApiHandler;
use crate::stream::ApiStream;
use crate::types::{ApiModel, ConversationTurn};

/// One of the protocol-level handlers. The PearAI router delegates to
/// exactly one of these at a time.
#[derive(Debug)]
pub enum ProviderHandler {
    OpenAiCompat(OpenAiCompatHandler),
    Anthropic(AnthropicHandler),
    DeepSeek(DeepSeekHandler),
}

impl ProviderHandler {
    /// The wrapped handler's model. Never fails.
    pub fn model(&self) -> ApiModel {
        match self {
            ProviderHandler::OpenAiCompat(h) => h.model(),
            ProviderHandler::Anthropic(h) => h.model(),
            ProviderHandler::DeepSeek(h) => h.model(),
        }
    }

    /// Build the protocol handler selected by `options.api_provider`.
    /// Returns `None` for [`ApiProvider::PearAi`], which is a router rather
    /// than a protocol.
    pub fn for_provider(options: &ApiHandlerOptions) -> Result<Option<Self>> {
        Ok(Some(match options.api_provider {
            ApiProvider::OpenAi => ProviderHandler::OpenAiCompat(OpenAiCompatHandler::new(options)?),
            ApiProvider::Anthropic => ProviderHandler::Anthropic(AnthropicHandler::new(options)?),
            ApiProvider::DeepSeek => ProviderHandler::DeepSeek(DeepSeekHandler::new(options)?),
            ApiProvider::PearAi => return Ok(None),
        }))
    }

    fn as_handler(&self) -> &dyn ApiHandler {
        match self {
            ProviderHandler::OpenAiCompat(h) => h,
            ProviderHandler::Anthropic(h) => h,
            ProviderHandler::DeepSeek(h) => h,
        }
    }
}

#[async_trait]
impl ApiHandler for ProviderHandler {
    fn name(&self) -> &str {
        self.as_handler().name()
    }

    async fn model(&self) -> ApiModel {
        ProviderHandler::model(self)
    }

    async fn create_message(
        &self,
        system_prompt: &str,
        turns: &[ConversationTurn],
    ) -> Result<ApiStream> {
        self.as_handler().create_message(system_prompt, turns).await
    }

    async fn complete_prompt(&self, prompt: &str) -> Result<String> {
        self.as_handler().complete_prompt(prompt).await
    }
}

/// Build the handler selected by `options.api_provider`.
///
/// The PearAI router reports through a [`TracingNotifier`]; use
/// [`PearAiHandler::new`] directly to supply another notifier. Building a
/// PearAI handler whose catalog must be fetched requires a Tokio runtime.
///
/// # Errors
///
/// Fails when the selected provider's API key is missing, or when the
/// PearAI router is asked for a model it cannot route.
pub fn build_api_handler(options: &ApiHandlerOptions) -> Result<Box<dyn ApiHandler>> {
    match ProviderHandler::for_provider(options)? {
        Some(handler) => Ok(Box::new(handler)),
        None => Ok(Box::new(PearAiHandler::new(options, Arc::new(TracingNotifier))?)),
    }
}
