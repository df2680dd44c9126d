//! Lead notification dispatchers.
//!
//! Each delivery channel (email, Telegram) implements a common trait so the
//! fan-out can treat every constructed task uniformly. Delivery is strictly
//! best-effort: a dispatcher reports its own outcome and never retries.

pub mod email;
pub mod telegram;

use async_trait::async_trait;

use crate::models::LeadNotificationPayload;

pub use email::EmailNotifier;
pub use telegram::TelegramNotifier;

/// Result of a single delivery attempt
#[derive(Debug)]
pub struct DeliveryResult {
    pub success: bool,
    /// HTTP status code (if applicable)
    pub http_status: Option<u16>,
    pub error_message: Option<String>,
}

impl DeliveryResult {
    pub fn success(http_status: Option<u16>) -> Self {
        Self {
            success: true,
            http_status,
            error_message: None,
        }
    }

    pub fn failure(error_message: String, http_status: Option<u16>) -> Self {
        Self {
            success: false,
            http_status,
            error_message: Some(error_message),
        }
    }
}

/// A delivery channel for lead notifications
#[async_trait]
pub trait LeadNotifier: Send + Sync {
    /// Channel name used in delivery logs
    fn channel(&self) -> &'static str;

    /// Deliver `lead` to one recipient (an email address or a Telegram
    /// chat id, depending on the channel).
    async fn send(&self, recipient: &str, lead: &LeadNotificationPayload) -> DeliveryResult;
}

/// Truncates to at most `max` characters without panicking on short or
/// empty input, appending an ellipsis when something was cut.
pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push('…');
    out
}
