//! Operator notifications raised by the PearAI router.
//!
//! The router never talks to a UI directly. It reports through a
//! [`Notifier`] supplied by the host; [`TracingNotifier`] is the default
//! and just logs.

use tracing::{info, warn};

/// Link offered with a pay-as-you-go notice.
pub const PAY_AS_YOU_GO_URL: &str = "https://trypear.ai/pay-as-you-go";

/// A link the host may render next to a notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeAction {
    pub label: String,
    pub url: String,
}

/// An informational message for the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub action: Option<NoticeAction>,
}

impl Notice {
    /// Build a notice from side-channel text collected during a stream.
    /// Messages about pay-as-you-go billing get a link to the billing page.
    pub fn from_side_channel(message: String) -> Self {
        let action = message
            .contains("pay-as-you-go")
            .then(|| NoticeAction {
                label: "View Pay-As-You-Go".to_string(),
                url: PAY_AS_YOU_GO_URL.to_string(),
            });
        Self { message, action }
    }
}

/// Sink for router notifications.
pub trait Notifier: Send + Sync {
    /// Show an informational notice.
    fn notify(&self, notice: Notice);

    /// The PearAI key is missing; the operator needs to sign in.
    fn sign_in_required(&self);
}

/// Logs notices with `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.action {
            Some(action) => info!(
                action = %action.label,
                url = %action.url,
                "{}",
                notice.message
            ),
            None => info!("{}", notice.message),
        }
    }

    fn sign_in_required(&self) {
        warn!("PearAI API key not found. Please login to PearAI.");
    }
}
