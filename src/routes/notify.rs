use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{LeadNotificationPayload, NotifyProRequest, NotifyRequest};
use crate::services::{LeadService, Notifiers};

#[derive(Serialize)]
struct NotifyResponse {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    lead_id: Option<Uuid>,
}

/// Constant-time shared-secret check. A deployment without a configured
/// secret rejects every caller rather than accepting every one.
fn check_secret(config: &Config, provided: &str) -> AppResult<()> {
    let expected = config
        .notify
        .shared_secret
        .as_deref()
        .ok_or_else(|| AppError::Unauthorized("Notify secret not configured".to_string()))?;

    if bool::from(expected.as_bytes().ct_eq(provided.as_bytes())) {
        Ok(())
    } else {
        Err(AppError::Unauthorized("Invalid notify secret".to_string()))
    }
}

/// POST /api/notify
/// Ingestion hook for a newly scraped lead: store it, alert the operator
/// channels and fan out to Pro users. Secret-checked; an invalid secret
/// makes zero outbound calls.
pub async fn notify(
    pool: web::Data<sqlx::PgPool>,
    config: web::Data<Config>,
    notifiers: web::Data<Notifiers>,
    req: web::Json<NotifyRequest>,
) -> AppResult<impl Responder> {
    check_secret(config.get_ref(), &req.secret)?;

    if req.lead.title.is_empty() {
        return Err(AppError::Validation("Lead title is required".to_string()));
    }
    if let Some(url) = &req.lead.url {
        if !url.is_empty() && url::Url::parse(url).is_err() {
            return Err(AppError::Validation(format!("Invalid lead url: {}", url)));
        }
    }

    let lead = LeadService::upsert_from_payload(pool.get_ref(), &req.lead).await?;
    let payload = LeadNotificationPayload::from(&lead);

    notifiers.send_lead_alert(&payload).await;
    let summary = notifiers.notify_pro_users(pool.get_ref(), &payload).await?;

    Ok(HttpResponse::Ok().json(NotifyResponse {
        success: true,
        message: format!("Lead stored, {} Pro users notified", summary.notified),
        lead_id: Some(lead.id),
    }))
}

/// POST /api/notify/pro
/// Admin trigger: fan a synthesized lead out to Pro users. The reference
/// deployment left this unauthenticated; here it requires the same shared
/// secret as the ingestion hook.
pub async fn notify_pro(
    pool: web::Data<sqlx::PgPool>,
    config: web::Data<Config>,
    notifiers: web::Data<Notifiers>,
    req: web::Json<NotifyProRequest>,
) -> AppResult<impl Responder> {
    check_secret(config.get_ref(), &req.secret)?;

    if req.title.is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }

    let payload = LeadNotificationPayload {
        id: Uuid::new_v4(),
        title: req.title.clone(),
        company: None,
        description: req.description.clone(),
        url: req.apply_link.clone(),
        budget: None,
        skill: None,
    };

    let summary = notifiers.notify_pro_users(pool.get_ref(), &payload).await?;

    Ok(HttpResponse::Ok().json(NotifyResponse {
        success: true,
        message: format!("{} Pro users notified", summary.notified),
        lead_id: None,
    }))
}

/// Configure notify routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/notify")
            .route("", web::post().to(notify))
            .route("/pro", web::post().to(notify_pro)),
    );
}
