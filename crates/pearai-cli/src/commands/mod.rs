//! CLI command implementations for `pear`.
//!
//! - [`chat`] -- Stream a reply to one message.
//! - [`complete`] -- Single-shot completion.
//! - [`model`] -- Show the resolved model.

pub mod chat;
pub mod complete;
pub mod model;

use pearai_llm::{ApiHandler, ApiHandlerOptions, ApiProvider, build_api_handler};

/// Apply `--provider` and `--model` on top of the loaded options.
///
/// The generic handler reads `openai_model_id` before `api_model_id`, so a
/// `--model` override is written to both.
pub fn apply_overrides(
    options: &mut ApiHandlerOptions,
    provider: Option<ApiProvider>,
    model: Option<String>,
) {
    if let Some(provider) = provider {
        options.api_provider = provider;
    }
    if let Some(model) = model {
        if options.api_provider == ApiProvider::OpenAi {
            options.openai_model_id = Some(model.clone());
        }
        options.api_model_id = Some(model);
    }
}

/// Build the configured handler, with an `anyhow` error for the binary.
pub fn build_handler(options: &ApiHandlerOptions) -> anyhow::Result<Box<dyn ApiHandler>> {
    tracing::debug!(provider = options.api_provider.as_str(), "building handler");
    Ok(build_api_handler(options)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_override_replaces_configured() {
        let mut options = ApiHandlerOptions {
            api_provider: ApiProvider::Anthropic,
            ..Default::default()
        };
        apply_overrides(&mut options, Some(ApiProvider::DeepSeek), None);
        assert_eq!(options.api_provider, ApiProvider::DeepSeek);
        assert!(options.api_model_id.is_none());
    }

    #[test]
    fn model_override_reaches_generic_handler() {
        let mut options = ApiHandlerOptions {
            openai_model_id: Some("gpt-4o".into()),
            ..Default::default()
        };
        apply_overrides(&mut options, Some(ApiProvider::OpenAi), Some("o3-mini".into()));
        assert_eq!(options.openai_model_id.as_deref(), Some("o3-mini"));
        assert_eq!(options.api_model_id.as_deref(), Some("o3-mini"));
    }

    #[test]
    fn model_override_leaves_generic_id_for_other_providers() {
        let mut options = ApiHandlerOptions {
            openai_model_id: Some("gpt-4o".into()),
            ..Default::default()
        };
        apply_overrides(&mut options, None, Some("pearai-model".into()));
        assert_eq!(options.openai_model_id.as_deref(), Some("gpt-4o"));
        assert_eq!(options.api_model_id.as_deref(), Some("pearai-model"));
    }

    #[test]
    fn no_overrides_is_a_no_op() {
        let mut options = ApiHandlerOptions::default();
        apply_overrides(&mut options, None, None);
        assert_eq!(options.api_provider, ApiProvider::PearAi);
        assert!(options.api_model_id.is_none());
    }
}
