//! Model routing for the PearAI router.
//!
//! [`resolve_route`] decides, from a requested model id and an optional
//! [`ModelCatalog`], which protocol serves the request and with which
//! concrete model id. It is pure; fetching the catalog is done separately
//! by [`fetch_catalog`].

use tracing::{debug, warn};

use crate::config::ModelCatalog;
use crate::error::{ProviderError, Result};
use crate::models::ModelInfo;

/// Model served when the catalog is unavailable or names nothing usable.
pub const CATALOG_FALLBACK_MODEL_ID: &str = "claude-3-5-sonnet-20241022";

/// Ids starting with this are aliases resolved through the catalog.
pub const ALIAS_PREFIX: &str = "pearai";

/// Path of the catalog endpoint, relative to the PearAI base URL.
pub const CATALOG_PATH: &str = "getPearAIAgentModels";

/// Bare model families served over the OpenAI-compatible route.
const GENERIC_FAMILIES: &[&str] = &["deepseek", "gpt-", "o1", "o3", "gemini", "mistral"];

/// `provider/` prefixes served over the OpenAI-compatible route.
const GENERIC_PROVIDER_PREFIXES: &[&str] = &[
    "openai/",
    "deepseek/",
    "groq/",
    "mistral/",
    "together/",
    "openrouter/",
    "gemini/",
    "google/",
    "xai/",
];

/// Where a request is sent.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// Anthropic messages protocol with a bare Anthropic model id.
    Anthropic { model_id: String },
    /// OpenAI-compatible protocol. `info` comes from the catalog when the
    /// route was resolved through an alias.
    Generic {
        model_id: String,
        info: Option<ModelInfo>,
    },
}

impl Route {
    pub fn model_id(&self) -> &str {
        match self {
            Route::Anthropic { model_id } | Route::Generic { model_id, .. } => model_id,
        }
    }
}

/// Whether `model_id` is an alias that needs the catalog.
pub fn is_alias(model_id: &str) -> bool {
    model_id.starts_with(ALIAS_PREFIX)
}

fn is_anthropic(model_id: &str) -> bool {
    model_id.starts_with("claude") || model_id.starts_with("anthropic/")
}

fn anthropic_route(model_id: &str) -> Route {
    Route::Anthropic {
        model_id: model_id
            .strip_prefix("anthropic/")
            .unwrap_or(model_id)
            .to_string(),
    }
}

fn is_generic(model_id: &str) -> bool {
    GENERIC_FAMILIES.iter().any(|f| model_id.starts_with(f))
        || GENERIC_PROVIDER_PREFIXES
            .iter()
            .any(|p| model_id.starts_with(p))
}

/// Decide the route for `model_id`.
///
/// Aliases are looked up in `catalog` (the alias entry first, then the
/// catalog's default entry); when neither yields an underlying model, the
/// fallback Anthropic model is used. Non-alias ids are routed by family.
///
/// # Errors
///
/// Returns [`ProviderError::UnsupportedModel`] for a non-alias id that
/// belongs to no known family.
pub fn resolve_route(model_id: &str, catalog: Option<&ModelCatalog>) -> Result<Route> {
    if is_alias(model_id) {
        return Ok(route_alias(model_id, catalog));
    }
    if is_anthropic(model_id) {
        return Ok(anthropic_route(model_id));
    }
    if is_generic(model_id) {
        return Ok(Route::Generic {
            model_id: model_id.to_string(),
            info: None,
        });
    }
    Err(ProviderError::UnsupportedModel(model_id.to_string()))
}

fn route_alias(alias: &str, catalog: Option<&ModelCatalog>) -> Route {
    let entry = catalog.and_then(|c| {
        c.models.get(alias).or_else(|| {
            c.default_model_id
                .as_deref()
                .and_then(|id| c.models.get(id))
        })
    });

    let Some((underlying, info)) =
        entry.and_then(|e| e.underlying_model.as_deref().map(|u| (u, &e.info)))
    else {
        debug!(alias, fallback = CATALOG_FALLBACK_MODEL_ID, "alias not in catalog");
        return anthropic_route(CATALOG_FALLBACK_MODEL_ID);
    };

    if is_anthropic(underlying) {
        anthropic_route(underlying)
    } else {
        Route::Generic {
            model_id: underlying.to_string(),
            info: Some(info.clone()),
        }
    }
}

/// Fetch the catalog from `GET {base_url}/getPearAIAgentModels`.
///
/// Never fails: transport errors, non-success statuses and malformed
/// bodies are logged and yield `None`.
pub async fn fetch_catalog(http: &reqwest::Client, base_url: &str) -> Option<ModelCatalog> {
    let url = format!("{base_url}/{CATALOG_PATH}");
    debug!(url = %url, "fetching PearAI model catalog");

    let response = match http.get(&url).send().await {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "model catalog request failed, using fallback model");
            return None;
        }
    };

    let status = response.status();
    if !status.is_success() {
        warn!(status = status.as_u16(), "model catalog unavailable, using fallback model");
        return None;
    }

    match response.json::<ModelCatalog>().await {
        Ok(catalog) => {
            debug!(models = catalog.models.len(), "model catalog loaded");
            Some(catalog)
        }
        Err(e) => {
            warn!(error = %e, "malformed model catalog, using fallback model");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogEntry;

    fn catalog(entries: &[(&str, Option<&str>)], default: Option<&str>) -> ModelCatalog {
        ModelCatalog {
            models: entries
                .iter()
                .map(|(id, underlying)| {
                    (
                        id.to_string(),
                        CatalogEntry {
                            underlying_model: underlying.map(String::from),
                            info: ModelInfo {
                                context_window: 42,
                                input_price: Some(1.0),
                                ..Default::default()
                            },
                        },
                    )
                })
                .collect(),
            default_model_id: default.map(String::from),
        }
    }

    // ── Aliases ─────────────────────────────────────────────────────

    #[test]
    fn alias_to_generic_model_carries_catalog_info() {
        let c = catalog(&[("pearai-model", Some("deepseek/deepseek-chat"))], None);
        let route = resolve_route("pearai-model", Some(&c)).unwrap();
        let Route::Generic { model_id, info } = route else {
            panic!("expected generic route");
        };
        assert_eq!(model_id, "deepseek/deepseek-chat");
        assert_eq!(info.unwrap().context_window, 42);
    }

    #[test]
    fn alias_to_anthropic_strips_prefix() {
        let c = catalog(
            &[("pearai-model", Some("anthropic/claude-3-7-sonnet-20250219"))],
            None,
        );
        assert_eq!(
            resolve_route("pearai-model", Some(&c)).unwrap(),
            Route::Anthropic {
                model_id: "claude-3-7-sonnet-20250219".into()
            }
        );
    }

    #[test]
    fn alias_without_catalog_uses_fallback() {
        assert_eq!(
            resolve_route("pearai-model", None).unwrap(),
            Route::Anthropic {
                model_id: CATALOG_FALLBACK_MODEL_ID.into()
            }
        );
    }

    #[test]
    fn missing_alias_tries_catalog_default() {
        let c = catalog(
            &[("pearai-fast", Some("gemini-2.0-flash"))],
            Some("pearai-fast"),
        );
        assert_eq!(
            resolve_route("pearai-unknown", Some(&c)).unwrap().model_id(),
            "gemini-2.0-flash"
        );
    }

    #[test]
    fn entry_without_underlying_model_uses_fallback() {
        let c = catalog(&[("pearai-model", None)], None);
        assert_eq!(
            resolve_route("pearai-model", Some(&c)).unwrap().model_id(),
            CATALOG_FALLBACK_MODEL_ID
        );
    }

    // ── Direct ids ──────────────────────────────────────────────────

    #[test]
    fn claude_ids_route_to_anthropic() {
        assert_eq!(
            resolve_route("claude-3-5-haiku-20241022", None).unwrap(),
            Route::Anthropic {
                model_id: "claude-3-5-haiku-20241022".into()
            }
        );
        assert_eq!(
            resolve_route("anthropic/claude-3-opus-20240229", None)
                .unwrap()
                .model_id(),
            "claude-3-opus-20240229"
        );
    }

    #[test]
    fn generic_families_route_to_generic() {
        for id in [
            "deepseek-chat",
            "gpt-4o",
            "o1-mini",
            "o3-mini",
            "gemini-2.0-flash",
            "mistral-large-latest",
            "openrouter/meta-llama/llama-3.1-70b",
            "deepseek/deepseek-reasoner",
        ] {
            assert_eq!(
                resolve_route(id, None).unwrap(),
                Route::Generic {
                    model_id: id.into(),
                    info: None
                },
                "{id}"
            );
        }
    }

    #[test]
    fn unknown_family_is_unsupported() {
        let err = resolve_route("llama-local", None).unwrap_err();
        assert!(matches!(err, ProviderError::UnsupportedModel(ref id) if id == "llama-local"));
    }
}
