use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Serialize;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::BillingService;

const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

#[derive(Serialize)]
struct WebhookResponse {
    success: bool,
    message: String,
}

/// POST /api/billing/webhook
/// Payment gateway callback. The raw body is verified against the HMAC
/// signature header before anything is parsed or mutated.
pub async fn payment_webhook(
    pool: web::Data<sqlx::PgPool>,
    config: web::Data<Config>,
    req: HttpRequest,
    body: web::Bytes,
) -> AppResult<impl Responder> {
    let secret = config
        .security
        .payment_webhook_secret
        .as_deref()
        .ok_or_else(|| AppError::Internal("Payment webhook secret not configured".to_string()))?;

    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing webhook signature".to_string()))?;

    if !BillingService::verify_signature(secret, &body, signature) {
        return Err(AppError::Unauthorized(
            "Invalid webhook signature".to_string(),
        ));
    }

    let event = BillingService::parse_event(&body)?;
    BillingService::handle_event(pool.get_ref(), &event).await?;

    Ok(HttpResponse::Ok().json(WebhookResponse {
        success: true,
        message: format!("Processed '{}'", event.event),
    }))
}

/// Configure billing routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api/billing").route("/webhook", web::post().to(payment_webhook)));
}
