//! OpenAI-compatible chat completion handler.
//!
//! [`OpenAiCompatHandler`] works with any endpoint that follows the OpenAI
//! chat completion format, including the PearAI server's generic route.
//! The request plumbing ([`ChatEndpoint`]) and the stream mapping
//! ([`map_stream_event`]) are shared with the DeepSeek handler.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;

use crate::config::{self, ApiHandlerOptions, OPENAI_BASE_URL};
use crate::error::{ProviderError, Result};
use crate::format::{to_collapsed_format, to_standard_format};
use crate::models::{ALL_MODELS, ModelInfo, openai_sane_defaults};
use crate::provider::ApiHandler;
use crate::secret::{self, ApiKey};
use crate::sse::{check_status, stream_response};
use crate::stream::{ApiStream, ApiStreamChunk};
use crate::types::{
    ApiModel, ChatMessage, ChatRequest, ChatResponse, ConversationTurn, StreamEvent, StreamOptions,
};

/// Model id used when the options name none.
pub const OPENAI_DEFAULT_MODEL_ID: &str = "gpt-4o";

/// Where a provider reports prompt-cache hits in its usage object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageDialect {
    /// Only `prompt_cache_hit_tokens` / `prompt_cache_miss_tokens`.
    DeepSeek,
    /// Also falls back to `prompt_tokens_details.cached_tokens`.
    OpenAi,
}

/// Map one OpenAI-style stream event to chunks.
///
/// A `ui` delta becomes a text chunk carrying the delta's metadata and
/// suppresses the delta's regular content. Empty strings produce nothing.
pub fn map_stream_event(event: StreamEvent, dialect: UsageDialect) -> Vec<ApiStreamChunk> {
    let mut chunks = Vec::new();

    if let Some(choice) = event.choices.into_iter().next() {
        let delta = choice.delta;
        if delta.kind.as_deref() == Some("ui") {
            let text = delta
                .metadata
                .as_ref()
                .and_then(|m| m.content.clone())
                .unwrap_or_default();
            chunks.push(ApiStreamChunk::Text {
                text,
                metadata: delta.metadata,
            });
        } else if let Some(text) = delta.content.filter(|t| !t.is_empty()) {
            chunks.push(ApiStreamChunk::text(text));
        }

        if let Some(text) = delta.reasoning_content.filter(|t| !t.is_empty()) {
            chunks.push(ApiStreamChunk::reasoning(text));
        }
    }

    if let Some(usage) = event.usage {
        let cache_hit = match dialect {
            UsageDialect::DeepSeek => usage.prompt_cache_hit_tokens,
            UsageDialect::OpenAi => usage.prompt_cache_hit_tokens.or_else(|| {
                usage
                    .prompt_tokens_details
                    .as_ref()
                    .and_then(|d| d.cached_tokens)
            }),
        };
        chunks.push(ApiStreamChunk::Usage {
            input_tokens: usage.prompt_tokens.unwrap_or(0) - cache_hit.unwrap_or(0),
            output_tokens: usage.completion_tokens.unwrap_or(0),
            cache_write_tokens: usage.prompt_cache_miss_tokens,
            cache_read_tokens: cache_hit,
            total_cost: None,
        });
    }

    chunks
}

/// A `POST {base}/chat/completions` endpoint with bearer authentication.
pub(crate) struct ChatEndpoint {
    provider: &'static str,
    http: reqwest::Client,
    url: String,
    api_key: ApiKey,
    creator_mode: &'static str,
}

impl ChatEndpoint {
    pub(crate) fn new(
        provider: &'static str,
        base_url: String,
        api_key: ApiKey,
        creator_mode: &'static str,
    ) -> Self {
        Self {
            provider,
            http: reqwest::Client::new(),
            url: format!("{base_url}/chat/completions"),
            api_key,
            creator_mode,
        }
    }

    fn post(&self) -> reqwest::RequestBuilder {
        self.http
            .post(&self.url)
            .header(AUTHORIZATION, self.api_key.bearer())
            .header(CONTENT_TYPE, "application/json")
            .header("creator-mode", self.creator_mode)
    }

    /// Send a streaming request and pump its events through the mapper.
    pub(crate) async fn stream(
        &self,
        request: &ChatRequest,
        dialect: UsageDialect,
    ) -> Result<ApiStream> {
        debug!(
            provider = self.provider,
            model = %request.model,
            messages = request.messages.len(),
            "sending streaming chat completion request"
        );

        let response = self.post().json(request).send().await?;
        stream_response(self.provider, response, move |event: StreamEvent| {
            Ok(map_stream_event(event, dialect))
        })
    }

    /// Non-streaming single-prompt completion.
    pub(crate) async fn complete(&self, model: &str, prompt: &str) -> Result<String> {
        self.try_complete(model, prompt)
            .await
            .map_err(|e| e.into_completion(self.provider))
    }

    async fn try_complete(&self, model: &str, prompt: &str) -> Result<String> {
        let request = ChatRequest::new(model, vec![ChatMessage::user(prompt)]);

        debug!(
            provider = self.provider,
            model = %request.model,
            "sending chat completion request"
        );

        let response = self.post().json(&request).send().await?;
        let response = check_status(self.provider, response)?;
        let body: ChatResponse = response.json().await?;

        debug!(
            provider = self.provider,
            choices = body.choices.len(),
            "chat completion response received"
        );

        Ok(body.first_content())
    }
}

/// A handler for any OpenAI-compatible chat completion API.
pub struct OpenAiCompatHandler {
    name: &'static str,
    endpoint: ChatEndpoint,
    model: ApiModel,
}

impl OpenAiCompatHandler {
    /// Build from the `openai_*` options.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotConfigured`] when no OpenAI API key is set.
    pub fn new(options: &ApiHandlerOptions) -> Result<Self> {
        Self::named("OpenAI", options)
    }

    /// Like [`new`](Self::new) but reports errors under `name`.
    pub fn named(name: &'static str, options: &ApiHandlerOptions) -> Result<Self> {
        let api_key = secret::present(options.openai_api_key.as_ref()).ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "{name} API key is required. Please provide it in the settings."
            ))
        })?;

        let id = options
            .openai_model_id
            .clone()
            .or_else(|| options.api_model_id.clone())
            .unwrap_or_else(|| OPENAI_DEFAULT_MODEL_ID.to_string());
        let info = resolve_info(&id, options.openai_custom_model_info.as_ref());

        let base_url = config::base_url(options.openai_base_url.as_deref(), OPENAI_BASE_URL);
        Ok(Self {
            name,
            endpoint: ChatEndpoint::new(
                name,
                base_url,
                api_key.clone(),
                options.creator_mode_header(),
            ),
            model: ApiModel { id, info },
        })
    }

    /// The configured model. Never fails.
    pub fn model(&self) -> ApiModel {
        self.model.clone()
    }

    /// Reasoning models take the collapsed message format.
    fn is_reasoner(&self) -> bool {
        let id = self.model.id.as_str();
        id.contains("deepseek-reasoner") || id.contains("deepseek-r1")
    }
}

/// Custom info wins, then the prefixed registry, then generic defaults.
fn resolve_info(id: &str, custom: Option<&ModelInfo>) -> ModelInfo {
    custom
        .cloned()
        .or_else(|| ALL_MODELS.get(id).cloned())
        .unwrap_or_else(openai_sane_defaults)
}

#[async_trait]
impl ApiHandler for OpenAiCompatHandler {
    fn name(&self) -> &str {
        self.name
    }

    async fn model(&self) -> ApiModel {
        OpenAiCompatHandler::model(self)
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
        request.stream_options = Some(StreamOptions {
            include_usage: true,
        });

        self.endpoint.stream(&request, UsageDialect::OpenAi).await
    }

    async fn complete_prompt(&self, prompt: &str) -> Result<String> {
        self.endpoint.complete(&self.model.id, prompt).await
    }
}

impl std::fmt::Debug for OpenAiCompatHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatHandler")
            .field("name", &self.name)
            .field("url", &self.endpoint.url)
            .field("model", &self.model.id)
            .field("api_key", &self.endpoint.api_key)
            .finish()
    }
}
