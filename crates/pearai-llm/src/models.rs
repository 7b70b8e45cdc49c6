//! Static model capability and price tables.
//!
//! Every handler resolves its model through [`lookup`], which never fails:
//! an unknown id keeps the caller's id but gets the table's default info.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::ApiModel;

/// Capabilities and per-million-token prices of one model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Output cap sent as `max_tokens`; `None` sends no cap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub context_window: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub supports_images: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub supports_prompt_cache: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub supports_computer_use: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_writes_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_reads_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Read an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl ModelInfo {
    /// Multiply every defined price by `factor`; undefined prices stay undefined.
    pub fn with_markup(&self, factor: f64) -> Self {
        Self {
            input_price: self.input_price.map(|p| p * factor),
            output_price: self.output_price.map(|p| p * factor),
            cache_writes_price: self.cache_writes_price.map(|p| p * factor),
            cache_reads_price: self.cache_reads_price.map(|p| p * factor),
            ..self.clone()
        }
    }
}

/// A named table of models with a designated default entry.
pub struct ModelTable {
    pub default_id: &'static str,
    models: BTreeMap<&'static str, ModelInfo>,
}

impl ModelTable {
    fn new(default_id: &'static str, entries: Vec<(&'static str, ModelInfo)>) -> Self {
        Self {
            default_id,
            models: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&ModelInfo> {
        self.models.get(id)
    }

    pub fn default_info(&self) -> &ModelInfo {
        // Tables are built with their default id present.
        self.models
            .get(self.default_id)
            .unwrap_or(&FALLBACK_INFO)
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.models.keys().copied()
    }
}

static FALLBACK_INFO: ModelInfo = ModelInfo {
    max_tokens: None,
    context_window: 128_000,
    supports_images: false,
    supports_prompt_cache: false,
    supports_computer_use: false,
    input_price: None,
    output_price: None,
    cache_writes_price: None,
    cache_reads_price: None,
    description: None,
};

/// Resolve `id` (or the table default when `None`) against `table`.
pub fn lookup(table: &ModelTable, id: Option<&str>) -> ApiModel {
    let id = id.unwrap_or(table.default_id);
    let info = table
        .get(id)
        .unwrap_or_else(|| table.default_info())
        .clone();
    ApiModel {
        id: id.to_string(),
        info,
    }
}

fn priced(
    max_tokens: u32,
    context_window: u32,
    supports_images: bool,
    prices: (f64, f64, Option<f64>, Option<f64>),
) -> ModelInfo {
    ModelInfo {
        max_tokens: Some(max_tokens),
        context_window,
        supports_images,
        supports_prompt_cache: prices.2.is_some() || prices.3.is_some(),
        supports_computer_use: false,
        input_price: Some(prices.0),
        output_price: Some(prices.1),
        cache_writes_price: prices.2,
        cache_reads_price: prices.3,
        description: None,
    }
}

// ── Anthropic ───────────────────────────────────────────────────────────

pub const ANTHROPIC_DEFAULT_MODEL_ID: &str = "claude-3-7-sonnet-20250219";

pub static ANTHROPIC_MODELS: LazyLock<ModelTable> = LazyLock::new(|| {
    ModelTable::new(
        ANTHROPIC_DEFAULT_MODEL_ID,
        vec![
            (
                "claude-3-7-sonnet-20250219",
                ModelInfo {
                    supports_computer_use: true,
                    ..priced(8192, 200_000, true, (3.0, 15.0, Some(3.75), Some(0.3)))
                },
            ),
            (
                "claude-3-5-sonnet-20241022",
                ModelInfo {
                    supports_computer_use: true,
                    ..priced(8192, 200_000, true, (3.0, 15.0, Some(3.75), Some(0.3)))
                },
            ),
            (
                "claude-3-5-haiku-20241022",
                priced(8192, 200_000, false, (1.0, 5.0, Some(1.25), Some(0.1))),
            ),
            (
                "claude-3-opus-20240229",
                priced(4096, 200_000, true, (15.0, 75.0, Some(18.75), Some(1.5))),
            ),
            (
                "claude-3-haiku-20240307",
                priced(4096, 200_000, true, (0.25, 1.25, Some(0.3), Some(0.03))),
            ),
        ],
    )
});

// ── DeepSeek ────────────────────────────────────────────────────────────

pub const DEEPSEEK_DEFAULT_MODEL_ID: &str = "deepseek-chat";

pub static DEEPSEEK_MODELS: LazyLock<ModelTable> = LazyLock::new(|| {
    ModelTable::new(
        DEEPSEEK_DEFAULT_MODEL_ID,
        vec![
            (
                "deepseek-chat",
                ModelInfo {
                    description: Some(
                        "DeepSeek-V3 general chat model with context caching.".into(),
                    ),
                    ..priced(8192, 64_000, false, (0.27, 1.1, Some(0.27), Some(0.07)))
                },
            ),
            (
                "deepseek-reasoner",
                ModelInfo {
                    description: Some(
                        "DeepSeek-R1 reasoning model; streams its chain of thought separately."
                            .into(),
                    ),
                    ..priced(8000, 64_000, false, (0.55, 2.19, Some(0.55), Some(0.14)))
                },
            ),
        ],
    )
});

// ── OpenAI-compatible ───────────────────────────────────────────────────

/// Info used by the generic handler for ids it knows nothing about.
pub fn openai_sane_defaults() -> ModelInfo {
    ModelInfo {
        max_tokens: None,
        context_window: 128_000,
        supports_images: true,
        supports_prompt_cache: false,
        input_price: Some(0.0),
        output_price: Some(0.0),
        ..ModelInfo::default()
    }
}

// ── PearAI ──────────────────────────────────────────────────────────────

pub const PEARAI_DEFAULT_MODEL_ID: &str = "pearai-model";

pub static PEARAI_MODELS: LazyLock<ModelTable> = LazyLock::new(|| {
    ModelTable::new(
        PEARAI_DEFAULT_MODEL_ID,
        vec![(
            PEARAI_DEFAULT_MODEL_ID,
            ModelInfo {
                description: Some(
                    "PearAI Model automatically routes you to the most suitable model on the market. Recommended for most users."
                        .into(),
                ),
                ..priced(8192, 200_000, true, (3.0, 15.0, Some(3.75), Some(0.3)))
            },
        )],
    )
});

/// Provider-prefixed view of every static table (`anthropic/<id>`,
/// `deepseek/<id>`), used by the generic handler when the PearAI server
/// proxies a model by its prefixed name.
pub static ALL_MODELS: LazyLock<BTreeMap<String, ModelInfo>> = LazyLock::new(|| {
    let mut all = BTreeMap::new();
    for (prefix, table) in [
        ("anthropic", &*ANTHROPIC_MODELS),
        ("deepseek", &*DEEPSEEK_MODELS),
    ] {
        for id in table.ids() {
            if let Some(info) = table.get(id) {
                all.insert(format!("{prefix}/{id}"), info.clone());
            }
        }
    }
    all
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deepseek_chat_capabilities() {
        let model = lookup(&DEEPSEEK_MODELS, Some("deepseek-chat"));
        assert_eq!(model.id, "deepseek-chat");
        assert_eq!(model.info.max_tokens, Some(8192));
        assert_eq!(model.info.context_window, 64_000);
        assert!(!model.info.supports_images);
        assert!(model.info.supports_prompt_cache);
    }

    #[test]
    fn unknown_id_keeps_id_and_uses_default_info() {
        let model = lookup(&DEEPSEEK_MODELS, Some("totally-unknown-id"));
        assert_eq!(model.id, "totally-unknown-id");
        assert_eq!(&model.info, DEEPSEEK_MODELS.default_info());
    }

    #[test]
    fn missing_id_uses_table_default() {
        let model = lookup(&ANTHROPIC_MODELS, None);
        assert_eq!(model.id, ANTHROPIC_DEFAULT_MODEL_ID);
        assert!(model.info.supports_computer_use);
    }

    #[test]
    fn markup_scales_defined_prices_only() {
        let info = ModelInfo {
            input_price: Some(3.0),
            output_price: Some(15.0),
            cache_writes_price: None,
            cache_reads_price: Some(0.3),
            ..ModelInfo::default()
        };
        let marked = info.with_markup(1.03);
        assert!((marked.input_price.unwrap() - 3.09).abs() < 1e-9);
        assert!((marked.output_price.unwrap() - 15.45).abs() < 1e-9);
        assert_eq!(marked.cache_writes_price, None);
        assert!((marked.cache_reads_price.unwrap() - 0.309).abs() < 1e-9);
    }

    #[test]
    fn all_models_are_prefixed() {
        assert!(ALL_MODELS.contains_key("deepseek/deepseek-chat"));
        assert!(ALL_MODELS.contains_key("anthropic/claude-3-5-sonnet-20241022"));
        assert!(!ALL_MODELS.contains_key("deepseek-chat"));
    }

    #[test]
    fn model_info_reads_catalog_json() {
        let info: ModelInfo = serde_json::from_str(
            r#"{"maxTokens":4096,"contextWindow":100000,"supportsImages":true,
                "supportsPromptCache":false,"inputPrice":1.5,"outputPrice":2.5}"#,
        )
        .unwrap();
        assert_eq!(info.max_tokens, Some(4096));
        assert_eq!(info.input_price, Some(1.5));
        assert_eq!(info.cache_writes_price, None);
    }

    #[test]
    fn null_fields_take_defaults() {
        let info: ModelInfo = serde_json::from_str(
            r#"{"maxTokens":null,"contextWindow":null,"supportsImages":null,
                "supportsPromptCache":null,"supportsComputerUse":null,"inputPrice":null}"#,
        )
        .unwrap();
        assert_eq!(info, ModelInfo::default());
    }
}
