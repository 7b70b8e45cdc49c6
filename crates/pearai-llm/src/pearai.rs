//! The PearAI meta-provider.
//!
//! [`PearAiHandler`] exposes one [`ApiHandler`] for every model the PearAI
//! server proxies. The requested id is routed with
//! [`resolve_route`](crate::catalog::resolve_route) to an Anthropic or an
//! OpenAI-compatible delegate pointed at the PearAI endpoint.
//!
//! Aliases such as `pearai-model` need the remote catalog. Unless the
//! catalog was preloaded, the router starts in
//! [`RouterPhase::Bootstrapping`], fetches it on a background task and
//! switches to [`RouterPhase::Ready`]. Every method waits for `Ready`;
//! if resolution never completes, the bootstrap delegate is used.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::anthropic::AnthropicHandler;
use crate::catalog::{self, Route, fetch_catalog, resolve_route};
use crate::config::{self, ApiHandlerOptions, PEARAI_URL};
use crate::error::{ProviderError, Result};
use crate::handler::ProviderHandler;
use crate::models::PEARAI_DEFAULT_MODEL_ID;
use crate::notify::{Notice, Notifier};
use crate::openai_compat::OpenAiCompatHandler;
use crate::provider::ApiHandler;
use crate::secret::{self, ApiKey};
use crate::stream::{ApiStream, ChunkSender};
use crate::types::{ApiModel, ConversationTurn};

const NAME: &str = "PearAI";

/// Price multiplier applied to every delegate model.
pub const PRICE_MARKUP: f64 = 1.03;

/// Model served by the bootstrap delegate.
pub const BOOTSTRAP_MODEL_ID: &str = "deepseek/deepseek-chat";

/// Resolution state of a router.
#[derive(Debug, Clone)]
pub enum RouterPhase {
    Bootstrapping,
    Ready(Arc<ProviderHandler>),
}

impl RouterPhase {
    pub fn is_ready(&self) -> bool {
        matches!(self, RouterPhase::Ready(_))
    }
}

/// Shared settings for building delegates against the PearAI endpoint.
#[derive(Clone)]
struct DelegateFactory {
    options: ApiHandlerOptions,
    base_url: String,
    api_key: ApiKey,
}

impl DelegateFactory {
    fn build(&self, route: &Route) -> Result<ProviderHandler> {
        match route {
            Route::Anthropic { model_id } => {
                let options = ApiHandlerOptions {
                    api_key: Some(self.api_key.clone()),
                    anthropic_base_url: Some(self.base_url.clone()),
                    api_model_id: Some(model_id.clone()),
                    ..self.options.clone()
                };
                Ok(ProviderHandler::Anthropic(AnthropicHandler::named(
                    NAME, &options,
                )?))
            }
            Route::Generic { model_id, info } => {
                let options = ApiHandlerOptions {
                    openai_api_key: Some(self.api_key.clone()),
                    openai_base_url: Some(self.base_url.clone()),
                    openai_model_id: Some(model_id.clone()),
                    openai_custom_model_info: info.clone(),
                    ..self.options.clone()
                };
                Ok(ProviderHandler::OpenAiCompat(OpenAiCompatHandler::named(
                    NAME, &options,
                )?))
            }
        }
    }
}

/// Router over the models served by the PearAI server.
pub struct PearAiHandler {
    requested: String,
    phase: watch::Receiver<RouterPhase>,
    bootstrap: Arc<ProviderHandler>,
    notifier: Arc<dyn Notifier>,
}

impl PearAiHandler {
    /// Validate the key, install the bootstrap delegate and start resolving.
    ///
    /// Non-alias ids and aliases with a preloaded catalog are resolved
    /// immediately. Otherwise the catalog is fetched on a spawned task, so
    /// this must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::NotConfigured`] when the PearAI key is missing
    ///   (the notifier's `sign_in_required` is called first).
    /// - [`ProviderError::UnsupportedModel`] when the id belongs to no
    ///   known model family.
    pub fn new(options: &ApiHandlerOptions, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let Some(api_key) = secret::present(options.pearai_api_key.as_ref()).cloned() else {
            notifier.sign_in_required();
            return Err(ProviderError::NotConfigured(
                "PearAI API key not found. Please login to PearAI.".into(),
            ));
        };

        let factory = DelegateFactory {
            options: options.clone(),
            base_url: config::base_url(options.pearai_base_url.as_deref(), PEARAI_URL),
            api_key,
        };
        let bootstrap = Arc::new(factory.build(&Route::Generic {
            model_id: BOOTSTRAP_MODEL_ID.to_string(),
            info: None,
        })?);

        let requested = options
            .api_model_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| PEARAI_DEFAULT_MODEL_ID.to_string());

        let phase = if catalog::is_alias(&requested) && options.pearai_agent_models.is_none() {
            let (tx, rx) = watch::channel(RouterPhase::Bootstrapping);
            tokio::spawn(resolve_in_background(requested.clone(), factory, tx));
            rx
        } else {
            let route = resolve_route(&requested, options.pearai_agent_models.as_ref())?;
            debug!(requested = %requested, model = route.model_id(), "PearAI route resolved");
            let (_, rx) = watch::channel(RouterPhase::Ready(Arc::new(factory.build(&route)?)));
            rx
        };

        Ok(Self {
            requested,
            phase,
            bootstrap,
            notifier,
        })
    }

    /// Build a router and wait until its delegate is resolved.
    pub async fn connect(options: &ApiHandlerOptions, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let handler = Self::new(options, notifier)?;
        handler.delegate().await;
        Ok(handler)
    }

    /// The model id the router was asked for (before resolution).
    pub fn requested_model(&self) -> &str {
        &self.requested
    }

    /// Whether the delegate has been resolved.
    pub fn is_ready(&self) -> bool {
        self.phase.borrow().is_ready()
    }

    /// Wait for resolution and return the delegate.
    async fn delegate(&self) -> Arc<ProviderHandler> {
        let mut phase = self.phase.clone();
        match phase.wait_for(RouterPhase::is_ready).await {
            Ok(ready) => match &*ready {
                RouterPhase::Ready(handler) => handler.clone(),
                RouterPhase::Bootstrapping => self.bootstrap.clone(),
            },
            Err(_) => {
                warn!(
                    requested = %self.requested,
                    "model resolution did not complete, using bootstrap model"
                );
                self.bootstrap.clone()
            }
        }
    }
}

async fn resolve_in_background(
    requested: String,
    factory: DelegateFactory,
    tx: watch::Sender<RouterPhase>,
) {
    let http = reqwest::Client::new();
    let catalog = fetch_catalog(&http, &factory.base_url).await;

    let delegate = resolve_route(&requested, catalog.as_ref()).and_then(|route| {
        debug!(requested = %requested, model = route.model_id(), "PearAI route resolved");
        factory.build(&route)
    });
    match delegate {
        Ok(handler) => {
            tx.send_replace(RouterPhase::Ready(Arc::new(handler)));
        }
        Err(e) => warn!(error = %e, "failed to build PearAI delegate"),
    }
}

/// Forward `inner` to `tx`, diverting UI-only notices. The collected notice
/// is surfaced once after `inner` ends.
async fn forward_filtered(mut inner: ApiStream, tx: ChunkSender, notifier: Arc<dyn Notifier>) {
    let mut notice = String::new();

    loop {
        let item = tokio::select! {
            biased;
            _ = tx.closed() => return,
            item = inner.next() => item,
        };
        let Some(item) = item else {
            break;
        };

        if let Ok(chunk) = &item
            && let Some(text) = chunk.ui_only_notice()
        {
            notice.push_str(text);
            continue;
        }

        if tx.send(item).await.is_err() {
            return;
        }
    }

    if !notice.is_empty() {
        notifier.notify(Notice::from_side_channel(notice));
    }
}

#[async_trait]
impl ApiHandler for PearAiHandler {
    fn name(&self) -> &str {
        NAME
    }

    /// The delegate's model with [`PRICE_MARKUP`] applied to its prices.
    async fn model(&self) -> ApiModel {
        let model = self.delegate().await.model();
        ApiModel {
            info: model.info.with_markup(PRICE_MARKUP),
            id: model.id,
        }
    }

    async fn create_message(
        &self,
        system_prompt: &str,
        turns: &[ConversationTurn],
    ) -> Result<ApiStream> {
        let delegate = self.delegate().await;
        let inner = delegate.create_message(system_prompt, turns).await?;

        let (tx, stream) = ApiStream::channel();
        tokio::spawn(forward_filtered(inner, tx, self.notifier.clone()));
        Ok(stream)
    }

    async fn complete_prompt(&self, prompt: &str) -> Result<String> {
        self.delegate().await.complete_prompt(prompt).await
    }
}

impl std::fmt::Debug for PearAiHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PearAiHandler")
            .field("requested", &self.requested)
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}
