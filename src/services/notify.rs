//! Lead notification fan-out.
//!
//! Given one new lead, delivers a notification to every Pro account over
//! every channel it has configured. All constructed deliveries run
//! concurrently and the fan-out waits for every one to settle; a failed or
//! slow channel never blocks a sibling, and per-delivery failures are
//! logged rather than surfaced to the caller.

use std::sync::Arc;

use futures_util::future::join_all;
use sqlx::PgPool;

use crate::config::Config;
use crate::error::AppResult;
use crate::models::LeadNotificationPayload;
use crate::services::notification::{EmailNotifier, LeadNotifier, TelegramNotifier};
use crate::services::ProfileService;

/// Outcome of a fan-out run
#[derive(Debug, Clone, Copy)]
pub struct FanoutSummary {
    /// Recipients considered, not successful deliveries
    pub notified: usize,
}

/// The set of delivery channels this deployment has configured
pub struct Notifiers {
    email: Option<Arc<EmailNotifier>>,
    telegram: Option<Arc<TelegramNotifier>>,
    admin_email: Option<String>,
    admin_chat_id: Option<String>,
}

impl Notifiers {
    /// Builds the channel set from configuration. A channel missing its
    /// credentials is simply absent and its deliveries are skipped.
    pub fn from_config(config: &Config) -> Self {
        let email = config
            .smtp
            .host
            .as_ref()
            .map(|_| Arc::new(EmailNotifier::new(config.smtp.clone(), config.app_base_url.clone())));

        let telegram = config.telegram.bot_token.as_ref().map(|token| {
            Arc::new(TelegramNotifier::new(
                token.clone(),
                config.telegram.api_base.clone(),
                config.app_base_url.clone(),
            ))
        });

        Self {
            email,
            telegram,
            admin_email: config.smtp.admin_address.clone(),
            admin_chat_id: config.telegram.admin_chat_id.clone(),
        }
    }

    /// Notifies every Pro account with at least one contact channel about
    /// `lead`. Returns the number of recipients considered.
    pub async fn notify_pro_users(
        &self,
        pool: &PgPool,
        lead: &LeadNotificationPayload,
    ) -> AppResult<FanoutSummary> {
        let targets = ProfileService::pro_notification_targets(pool).await?;
        let reachable: Vec<_> = targets.into_iter().filter(|t| t.has_channel()).collect();

        if reachable.is_empty() {
            log::info!("No Pro accounts with contact channels; skipping fan-out");
            return Ok(FanoutSummary { notified: 0 });
        }

        let mut tasks = Vec::new();
        for target in &reachable {
            if let (Some(notifier), Some(address)) = (&self.email, &target.email) {
                tasks.push(deliver(notifier.clone(), address.clone(), lead.clone()));
            }
            if let (Some(notifier), Some(chat_id)) = (&self.telegram, &target.telegram_chat_id) {
                tasks.push(deliver(notifier.clone(), chat_id.clone(), lead.clone()));
            }
        }

        log::info!(
            "Fanning out lead {} to {} recipients over {} deliveries",
            lead.id,
            reachable.len(),
            tasks.len()
        );

        // Settle-all: every delivery finishes (success or failure) before
        // the fan-out reports back.
        join_all(tasks).await;

        Ok(FanoutSummary {
            notified: reachable.len(),
        })
    }

    /// Single-recipient variant: alerts the preconfigured operator chat and
    /// inbox about `lead`, with the same settle-all discipline.
    pub async fn send_lead_alert(&self, lead: &LeadNotificationPayload) {
        let mut tasks = Vec::new();
        if let (Some(notifier), Some(address)) = (&self.email, &self.admin_email) {
            tasks.push(deliver(notifier.clone(), address.clone(), lead.clone()));
        }
        if let (Some(notifier), Some(chat_id)) = (&self.telegram, &self.admin_chat_id) {
            tasks.push(deliver(notifier.clone(), chat_id.clone(), lead.clone()));
        }

        if tasks.is_empty() {
            log::debug!("No operator channels configured; skipping lead alert");
            return;
        }

        join_all(tasks).await;
    }
}

/// Runs one delivery and logs its outcome. Failures stop here by design:
/// notification delivery is a non-critical side channel.
async fn deliver(
    notifier: Arc<dyn LeadNotifier>,
    recipient: String,
    lead: LeadNotificationPayload,
) {
    let result = notifier.send(&recipient, &lead).await;
    if result.success {
        log::debug!(
            "Delivered lead {} via {} to {}",
            lead.id,
            notifier.channel(),
            recipient
        );
    } else {
        log::warn!(
            "Delivery of lead {} via {} to {} failed: {}",
            lead.id,
            notifier.channel(),
            recipient,
            result.error_message.as_deref().unwrap_or("unknown error")
        );
    }
}
