//! Handler configuration.
//!
//! [`ApiHandlerOptions`] is the flat option bag every handler is built
//! from. It is read once at construction and never mutated afterwards.
//! Field names are snake_case; the camelCase names used by editor settings
//! are accepted as aliases.

use serde::{Deserialize, Serialize};

use crate::models::ModelInfo;
use crate::secret::ApiKey;

/// Default base URL of the OpenAI API.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default base URL of the DeepSeek API.
pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/v1";

/// Default base URL of the Anthropic API.
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// PearAI server endpoint that proxies both protocol families.
pub const PEARAI_URL: &str = "https://server.trypear.ai/pearai-server-api2/integrations/cline";

/// Which handler [`build_api_handler`](crate::handler::build_api_handler)
/// constructs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiProvider {
    #[serde(alias = "openai-compatible")]
    OpenAi,
    Anthropic,
    DeepSeek,
    #[default]
    PearAi,
}

impl ApiProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiProvider::OpenAi => "openai",
            ApiProvider::Anthropic => "anthropic",
            ApiProvider::DeepSeek => "deepseek",
            ApiProvider::PearAi => "pearai",
        }
    }
}

impl std::str::FromStr for ApiProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" | "openai-compatible" => Ok(ApiProvider::OpenAi),
            "anthropic" => Ok(ApiProvider::Anthropic),
            "deepseek" => Ok(ApiProvider::DeepSeek),
            "pearai" => Ok(ApiProvider::PearAi),
            other => Err(format!(
                "unknown provider '{other}' (expected openai, anthropic, deepseek or pearai)"
            )),
        }
    }
}

/// A catalog entry: the concrete model behind an alias plus its metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underlying_model: Option<String>,

    #[serde(flatten)]
    pub info: ModelInfo,
}

/// The PearAI model catalog, as served by `getPearAIAgentModels`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCatalog {
    #[serde(default)]
    pub models: std::collections::BTreeMap<String, CatalogEntry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model_id: Option<String>,
}

/// Settings for every supported handler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiHandlerOptions {
    #[serde(alias = "apiProvider")]
    pub api_provider: ApiProvider,

    /// Selected model id for the Anthropic, DeepSeek and PearAI handlers.
    #[serde(alias = "apiModelId", skip_serializing_if = "Option::is_none")]
    pub api_model_id: Option<String>,

    /// Anthropic API key.
    #[serde(alias = "apiKey", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<ApiKey>,

    #[serde(alias = "anthropicBaseUrl", skip_serializing_if = "Option::is_none")]
    pub anthropic_base_url: Option<String>,

    #[serde(alias = "openAiApiKey", skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<ApiKey>,

    #[serde(alias = "openAiBaseUrl", skip_serializing_if = "Option::is_none")]
    pub openai_base_url: Option<String>,

    #[serde(alias = "openAiModelId", skip_serializing_if = "Option::is_none")]
    pub openai_model_id: Option<String>,

    /// Overrides the metadata the generic handler reports for its model.
    #[serde(alias = "openAiCustomModelInfo", skip_serializing_if = "Option::is_none")]
    pub openai_custom_model_info: Option<ModelInfo>,

    #[serde(alias = "deepSeekApiKey", skip_serializing_if = "Option::is_none")]
    pub deepseek_api_key: Option<ApiKey>,

    #[serde(alias = "deepSeekBaseUrl", skip_serializing_if = "Option::is_none")]
    pub deepseek_base_url: Option<String>,

    #[serde(alias = "pearaiApiKey", skip_serializing_if = "Option::is_none")]
    pub pearai_api_key: Option<ApiKey>,

    #[serde(alias = "pearaiBaseUrl", skip_serializing_if = "Option::is_none")]
    pub pearai_base_url: Option<String>,

    /// Forwarded to every provider as the `creator-mode` header.
    #[serde(alias = "creatorMode", skip_serializing_if = "Option::is_none")]
    pub creator_mode: Option<bool>,

    /// Catalog supplied by the host; skips the remote fetch when present.
    #[serde(alias = "pearaiAgentModels", skip_serializing_if = "Option::is_none")]
    pub pearai_agent_models: Option<ModelCatalog>,
}

/// Environment variables that can supply a missing API key.
const KEY_ENV_VARS: &[(&str, KeySlot)] = &[
    ("PEARAI_API_KEY", KeySlot::PearAi),
    ("ANTHROPIC_API_KEY", KeySlot::Anthropic),
    ("OPENAI_API_KEY", KeySlot::OpenAi),
    ("DEEPSEEK_API_KEY", KeySlot::DeepSeek),
];

#[derive(Clone, Copy)]
enum KeySlot {
    PearAi,
    Anthropic,
    OpenAi,
    DeepSeek,
}

impl ApiHandlerOptions {
    /// Fill missing API keys from the environment.
    ///
    /// `lookup` is normally `|k| std::env::var(k).ok()`. Keys already set
    /// are kept; empty variables are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for (var, slot) in KEY_ENV_VARS {
            let field = match slot {
                KeySlot::PearAi => &mut self.pearai_api_key,
                KeySlot::Anthropic => &mut self.api_key,
                KeySlot::OpenAi => &mut self.openai_api_key,
                KeySlot::DeepSeek => &mut self.deepseek_api_key,
            };
            if crate::secret::present(field.as_ref()).is_some() {
                continue;
            }
            if let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) {
                tracing::debug!(var = *var, "api key taken from environment");
                *field = Some(ApiKey::new(value));
            }
        }
    }

    /// Value of the `creator-mode` header.
    pub fn creator_mode_header(&self) -> &'static str {
        if self.creator_mode.unwrap_or(false) {
            "true"
        } else {
            "false"
        }
    }
}

/// Strip trailing slashes so paths can be appended with `/`.
pub(crate) fn base_url(configured: Option<&str>, default: &str) -> String {
    configured
        .filter(|u| !u.trim().is_empty())
        .unwrap_or(default)
        .trim_end_matches('/')
        .to_string()
}
