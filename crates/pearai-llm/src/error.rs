//! Provider error types for pearai-llm.
//!
//! All handler operations return [`Result<T>`] which uses [`ProviderError`]
//! as the error type.

use thiserror::Error;

/// Errors that can occur when interacting with an LLM provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The handler has not been configured (e.g. missing API key).
    #[error("{0}")]
    NotConfigured(String),

    /// The requested model id does not belong to any known model family.
    #[error("unsupported model: {0}")]
    UnsupportedModel(String),

    /// The provider answered with a non-success HTTP status.
    #[error("{provider} API error: {status_text}")]
    Api {
        /// Display name of the provider (e.g. "DeepSeek").
        provider: String,
        /// Numeric HTTP status.
        status: u16,
        /// Canonical reason phrase for the status.
        status_text: String,
    },

    /// A streaming response arrived without a body.
    #[error("No response body received from {provider} API")]
    EmptyBody {
        /// Display name of the provider.
        provider: String,
    },

    /// Reading the response body failed after streaming started.
    #[error("{provider} stream error: {message}")]
    Stream {
        /// Display name of the provider.
        provider: String,
        /// Underlying transport message.
        message: String,
    },

    /// A single-shot completion failed for a reason other than an API status.
    #[error("{provider} completion error: {message}")]
    Completion {
        /// Display name of the provider.
        provider: String,
        /// The wrapped error message.
        message: String,
    },

    /// An HTTP-level error from reqwest.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// A JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProviderError {
    /// Build an [`ProviderError::Api`] from a response status.
    pub fn api(provider: &str, status: reqwest::StatusCode) -> Self {
        Self::Api {
            provider: provider.to_string(),
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }

    /// Re-wrap an error raised by a single-shot completion.
    ///
    /// API status errors pass through unchanged; everything else gets the
    /// provider's completion prefix.
    pub fn into_completion(self, provider: &str) -> Self {
        match self {
            err @ (Self::Api { .. } | Self::Completion { .. }) => err,
            other => Self::Completion {
                provider: provider.to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// A convenience type alias for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;
