//! Anthropic messages API handler.
//!
//! Requests go to `POST {base}/v1/messages`. The stream is a sequence of
//! typed events (`message_start`, `content_block_start`,
//! `content_block_delta`, `message_delta`, ...) that are mapped to text,
//! reasoning and usage chunks.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{self, ANTHROPIC_BASE_URL, ApiHandlerOptions};
use crate::error::{ProviderError, Result};
use crate::format::{AnthropicBlock, AnthropicMessage, to_anthropic_format};
use crate::models::{ANTHROPIC_MODELS, lookup};
use crate::provider::ApiHandler;
use crate::secret::{self, ApiKey};
use crate::sse::{check_status, stream_response};
use crate::stream::{ApiStream, ApiStreamChunk};
use crate::types::{ApiModel, ConversationTurn};

/// Value of the `anthropic-version` header.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// The API requires an output cap; used when the model table has none.
const FALLBACK_MAX_TOKENS: u32 = 8192;

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    system: Vec<AnthropicBlock>,
    messages: Vec<AnthropicMessage>,
    stream: bool,
}

// ── Stream events ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamEvent {
    MessageStart {
        message: MessageStart,
    },
    MessageDelta {
        #[serde(default)]
        usage: Option<Usage>,
    },
    ContentBlockStart {
        #[serde(default)]
        index: u32,
        content_block: ContentBlock,
    },
    ContentBlockDelta {
        delta: BlockDelta,
    },
    Error {
        #[serde(default)]
        error: ErrorBody,
    },
    #[serde(other)]
    Other,
}

/// Payload of an in-stream `error` event, e.g. `overloaded_error`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    message: String,
}

impl ErrorBody {
    fn into_error(self, provider: &str) -> ProviderError {
        let message = match (self.message.is_empty(), self.kind.is_empty()) {
            (false, false) => format!("{} ({})", self.message, self.kind),
            (false, true) => self.message,
            (true, false) => self.kind,
            (true, true) => "unknown error".to_string(),
        };
        ProviderError::Stream {
            provider: provider.to_string(),
            message,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct MessageStart {
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: Option<i64>,
    #[serde(default)]
    output_tokens: Option<i64>,
    #[serde(default)]
    cache_creation_input_tokens: Option<i64>,
    #[serde(default)]
    cache_read_input_tokens: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    Thinking {
        #[serde(default)]
        thinking: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BlockDelta {
    TextDelta { text: String },
    ThinkingDelta { thinking: String },
    #[serde(other)]
    Other,
}

/// Map one event to chunks. An `error` event ends the stream with an error
/// named after `provider`.
fn map_stream_event(provider: &str, event: StreamEvent) -> Result<Vec<ApiStreamChunk>> {
    Ok(match event {
        StreamEvent::MessageStart { message } => {
            let usage = message.usage.unwrap_or_default();
            vec![ApiStreamChunk::Usage {
                input_tokens: usage.input_tokens.unwrap_or(0),
                output_tokens: usage.output_tokens.unwrap_or(0),
                cache_write_tokens: usage.cache_creation_input_tokens,
                cache_read_tokens: usage.cache_read_input_tokens,
                total_cost: None,
            }]
        }
        StreamEvent::MessageDelta { usage: Some(usage) } => {
            vec![ApiStreamChunk::usage(0, usage.output_tokens.unwrap_or(0))]
        }
        StreamEvent::ContentBlockStart {
            index,
            content_block,
        } => {
            let chunk = match content_block {
                ContentBlock::Text { text } => ApiStreamChunk::text(text),
                ContentBlock::Thinking { thinking } => ApiStreamChunk::reasoning(thinking),
                ContentBlock::Other => return Ok(Vec::new()),
            };
            if index > 0 {
                vec![ApiStreamChunk::text("\n"), chunk]
            } else {
                vec![chunk]
            }
        }
        StreamEvent::ContentBlockDelta { delta } => match delta {
            BlockDelta::TextDelta { text } => vec![ApiStreamChunk::text(text)],
            BlockDelta::ThinkingDelta { thinking } => vec![ApiStreamChunk::reasoning(thinking)],
            BlockDelta::Other => Vec::new(),
        },
        StreamEvent::Error { error } => return Err(error.into_error(provider)),
        StreamEvent::MessageDelta { usage: None } | StreamEvent::Other => Vec::new(),
    })
}

// ── Non-streaming response ──────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

// ── Handler ─────────────────────────────────────────────────────────────

/// A handler for the Anthropic messages API.
pub struct AnthropicHandler {
    name: &'static str,
    http: reqwest::Client,
    url: String,
    api_key: ApiKey,
    creator_mode: &'static str,
    model: ApiModel,
}

impl AnthropicHandler {
    /// Build from `api_key`, `anthropic_base_url` and `api_model_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotConfigured`] when no API key is set.
    pub fn new(options: &ApiHandlerOptions) -> Result<Self> {
        Self::named("Anthropic", options)
    }

    /// Like [`new`](Self::new) but reports errors under `name`.
    pub fn named(name: &'static str, options: &ApiHandlerOptions) -> Result<Self> {
        let api_key = secret::present(options.api_key.as_ref()).ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "{name} API key is required. Please provide it in the settings."
            ))
        })?;
        let base_url = config::base_url(options.anthropic_base_url.as_deref(), ANTHROPIC_BASE_URL);

        Ok(Self {
            name,
            http: reqwest::Client::new(),
            url: format!("{base_url}/v1/messages"),
            api_key: api_key.clone(),
            creator_mode: options.creator_mode_header(),
            model: lookup(&ANTHROPIC_MODELS, options.api_model_id.as_deref()),
        })
    }

    pub fn model(&self) -> ApiModel {
        self.model.clone()
    }

    fn post(&self) -> reqwest::RequestBuilder {
        self.http
            .post(&self.url)
            .header("x-api-key", self.api_key.expose())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header(CONTENT_TYPE, "application/json")
            .header("creator-mode", self.creator_mode)
    }

    fn max_tokens(&self) -> u32 {
        self.model.info.max_tokens.unwrap_or(FALLBACK_MAX_TOKENS)
    }

    async fn try_complete(&self, prompt: &str) -> Result<String> {
        let request = MessagesRequest {
            model: &self.model.id,
            max_tokens: self.max_tokens(),
            temperature: 0.0,
            system: Vec::new(),
            messages: vec![AnthropicMessage {
                role: "user",
                content: vec![AnthropicBlock::Text {
                    text: prompt.to_string(),
                    cache_control: None,
                }],
            }],
            stream: false,
        };

        debug!(provider = self.name, model = %self.model.id, "sending messages request");

        let response = self.post().json(&request).send().await?;
        let response = check_status(self.name, response)?;
        let body: MessagesResponse = response.json().await?;

        Ok(body
            .content
            .into_iter()
            .find_map(|block| match block {
                ResponseBlock::Text { text } => Some(text),
                ResponseBlock::Other => None,
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl ApiHandler for AnthropicHandler {
    fn name(&self) -> &str {
        self.name
    }

    async fn model(&self) -> ApiModel {
        AnthropicHandler::model(self)
    }

    async fn create_message(
        &self,
        system_prompt: &str,
        turns: &[ConversationTurn],
    ) -> Result<ApiStream> {
        let prompt = to_anthropic_format(
            system_prompt,
            turns,
            self.model.info.supports_prompt_cache,
        );
        let request = MessagesRequest {
            model: &self.model.id,
            max_tokens: self.max_tokens(),
            temperature: 0.0,
            system: prompt.system,
            messages: prompt.messages,
            stream: true,
        };

        debug!(
            provider = self.name,
            model = %self.model.id,
            messages = request.messages.len(),
            "sending streaming messages request"
        );

        let response = self.post().json(&request).send().await?;
        let provider = self.name;
        stream_response(provider, response, move |event| {
            map_stream_event(provider, event)
        })
    }

    async fn complete_prompt(&self, prompt: &str) -> Result<String> {
        self.try_complete(prompt)
            .await
            .map_err(|e| e.into_completion(self.name))
    }
}

impl std::fmt::Debug for AnthropicHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicHandler")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("model", &self.model.id)
            .field("api_key", &self.api_key)
            .finish()
    }
}
