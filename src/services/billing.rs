//! Payment webhook handling.
//!
//! Verifies the gateway's HMAC-SHA256 body signature and flips the paying
//! account to the Pro plan on a capture event. Plan changes are idempotent
//! so redelivered webhooks are harmless.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use sqlx::PgPool;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::PlanTier;
use crate::services::ProfileService;

type HmacSha256 = Hmac<Sha256>;

/// Payment gateway webhook event
#[derive(Debug, Deserialize)]
pub struct PaymentWebhookEvent {
    pub event: String,
    pub payload: PaymentWebhookPayload,
}

#[derive(Debug, Deserialize)]
pub struct PaymentWebhookPayload {
    pub user_id: Uuid,
    pub payment_id: String,
    #[serde(default)]
    pub amount: Option<i64>,
}

pub struct BillingService;

impl BillingService {
    /// Computes the expected hex HMAC-SHA256 signature over the raw body
    pub fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac =
            HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    /// Verifies a webhook signature header against the raw body.
    /// Comparison is constant-time; a `sha256=` prefix is accepted.
    pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
        let provided = signature.strip_prefix("sha256=").unwrap_or(signature);
        let expected = Self::sign(secret, body);
        expected.as_bytes().ct_eq(provided.as_bytes()).into()
    }

    /// Applies one verified webhook event. Unknown event types are
    /// acknowledged without any state change.
    pub async fn handle_event(pool: &PgPool, event: &PaymentWebhookEvent) -> AppResult<()> {
        match event.event.as_str() {
            "payment.captured" => {
                ProfileService::set_plan(pool, event.payload.user_id, PlanTier::Pro).await?;
                log::info!(
                    "Payment {} captured; user {} upgraded to Pro",
                    event.payload.payment_id,
                    event.payload.user_id
                );
                Ok(())
            }
            other => {
                log::debug!("Ignoring payment webhook event '{}'", other);
                Ok(())
            }
        }
    }

    /// Parses a webhook body after its signature has been verified
    pub fn parse_event(body: &[u8]) -> AppResult<PaymentWebhookEvent> {
        serde_json::from_slice(body)
            .map_err(|e| AppError::Validation(format!("Invalid webhook payload: {}", e)))
    }
}
