//! Telegram delivery channel.
//!
//! Posts lead notifications to the Telegram bot API's `sendMessage`
//! endpoint, one request per recipient chat.

use async_trait::async_trait;
use serde_json::json;

use super::{truncate_chars, DeliveryResult, LeadNotifier};
use crate::models::LeadNotificationPayload;

const DESCRIPTION_PREVIEW_CHARS: usize = 200;

/// Telegram notification dispatcher
pub struct TelegramNotifier {
    client: reqwest::Client,
    bot_token: String,
    /// Bot API base, overridable for tests
    api_base: String,
    app_base_url: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, api_base: String, app_base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            bot_token,
            api_base,
            app_base_url,
        }
    }

    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.bot_token
        )
    }

    /// Formats a lead as a Markdown message
    fn format_message(&self, lead: &LeadNotificationPayload) -> String {
        let apply_url = match &lead.url {
            Some(url) if !url.is_empty() => url.clone(),
            _ => format!("{}/leads/{}", self.app_base_url, lead.id),
        };

        let mut message = format!("🔔 *New lead: {}*\n", escape_markdown(&lead.title));
        if let Some(company) = &lead.company {
            message.push_str(&format!("🏢 {}\n", escape_markdown(company)));
        }
        if let Some(budget) = &lead.budget {
            message.push_str(&format!("💰 {}\n", escape_markdown(budget)));
        }
        if let Some(skill) = &lead.skill {
            message.push_str(&format!("🛠 {}\n", escape_markdown(skill)));
        }

        let description = truncate_chars(&lead.description, DESCRIPTION_PREVIEW_CHARS);
        if !description.is_empty() {
            message.push('\n');
            message.push_str(&escape_markdown(&description));
            message.push('\n');
        }

        message.push_str(&format!("\n[Apply now]({})", apply_url));
        message
    }
}

/// Escapes the Markdown control characters Telegram's legacy parse mode
/// treats specially
fn escape_markdown(s: &str) -> String {
    s.replace('_', "\\_")
        .replace('*', "\\*")
        .replace('[', "\\[")
        .replace('`', "\\`")
}

#[async_trait]
impl LeadNotifier for TelegramNotifier {
    fn channel(&self) -> &'static str {
        "telegram"
    }

    async fn send(&self, recipient: &str, lead: &LeadNotificationPayload) -> DeliveryResult {
        let body = json!({
            "chat_id": recipient,
            "text": self.format_message(lead),
            "parse_mode": "Markdown",
            "disable_web_page_preview": true,
        });

        match self.client.post(self.send_message_url()).json(&body).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                if response.status().is_success() {
                    log::debug!("Telegram message sent to chat {}", recipient);
                    DeliveryResult::success(Some(status))
                } else {
                    let error_body = response.text().await.unwrap_or_default();
                    let error_msg = if error_body.is_empty() {
                        format!("HTTP {}", status)
                    } else {
                        format!("HTTP {}: {}", status, error_body)
                    };
                    DeliveryResult::failure(error_msg, Some(status))
                }
            }
            Err(e) => {
                let error_msg = if e.is_timeout() {
                    "Request timed out".to_string()
                } else if e.is_connect() {
                    "Connection failed".to_string()
                } else {
                    format!("Request failed: {}", e)
                };
                DeliveryResult::failure(error_msg, None)
            }
        }
    }
}
