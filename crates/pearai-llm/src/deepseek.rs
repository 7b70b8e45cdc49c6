//! DeepSeek handler.
//!
//! DeepSeek speaks the OpenAI chat format with two differences: the
//! `deepseek-reasoner` model rejects a system role (so the collapsed format
//! is used), and usage reports cache hits and misses as separate counters.

use async_trait::async_trait;

use crate::config::{self, ApiHandlerOptions, DEEPSEEK_BASE_URL};
use crate::error::{ProviderError, Result};
use crate::format::{to_collapsed_format, to_standard_format};
use crate::models::{DEEPSEEK_MODELS, lookup};
use crate::openai_compat::{ChatEndpoint, UsageDialect};
use crate::provider::ApiHandler;
use crate::secret;
use crate::stream::ApiStream;
use crate::types::{ApiModel, ChatRequest, ConversationTurn};

const NAME: &str = "DeepSeek";

pub struct DeepSeekHandler {
    endpoint: ChatEndpoint,
    model: ApiModel,
}

impl DeepSeekHandler {
    /// # Errors
    ///
    /// Returns [`ProviderError::NotConfigured`] when no DeepSeek API key is set.
    pub fn new(options: &ApiHandlerOptions) -> Result<Self> {
        let api_key = secret::present(options.deepseek_api_key.as_ref()).ok_or_else(|| {
            ProviderError::NotConfigured(
                "DeepSeek API key is required. Please provide it in the settings.".into(),
            )
        })?;

        let base_url = config::base_url(options.deepseek_base_url.as_deref(), DEEPSEEK_BASE_URL);
        Ok(Self {
            endpoint: ChatEndpoint::new(
                NAME,
                base_url,
                api_key.clone(),
                options.creator_mode_header(),
            ),
            model: lookup(&DEEPSEEK_MODELS, options.api_model_id.as_deref()),
        })
    }

    /// The configured model; unknown ids report the default model's info.
    pub fn model(&self) -> ApiModel {
        self.model.clone()
    }

    fn is_reasoner(&self) -> bool {
        self.model.id.contains("deepseek-reasoner")
    }
}

#[async_trait]
impl ApiHandler for DeepSeekHandler {
    fn name(&self) -> &str {
        NAME
    }

    async fn model(&self) -> ApiModel {
        DeepSeekHandler::model(self)
    }

    async fn create_message(
        &self,
        system_prompt: &str,
        turns: &[ConversationTurn],
    ) -> Result<ApiStream> {
        let messages = if self.is_reasoner() {
            to_collapsed_format(system_prompt, turns)
        } else {
            to_standard_format(system_prompt, turns)
        };

        let mut request = ChatRequest::new(self.model.id.clone(), messages);
        request.stream = true;
        request.max_tokens = self.model.info.max_tokens;

        self.endpoint.stream(&request, UsageDialect::DeepSeek).await
    }

    async fn complete_prompt(&self, prompt: &str) -> Result<String> {
        self.endpoint.complete(&self.model.id, prompt).await
    }
}

impl std::fmt::Debug for DeepSeekHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepSeekHandler")
            .field("model", &self.model.id)
            .finish_non_exhaustive()
    }
}
