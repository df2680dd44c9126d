use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::PlanTier;
use crate::services::pitch::PitchUsage;
use crate::services::{
    EntitlementService, GateDecision, LeadService, PitchOptions, PitchService, RateDecision,
    RateLimiter,
};

#[derive(Debug, Deserialize)]
pub struct GeneratePitchRequest {
    pub lead_id: Option<Uuid>,
    #[serde(flatten)]
    pub options: PitchOptions,
}

#[derive(Serialize)]
struct GeneratePitchResponse {
    success: bool,
    pitch: String,
    usage: PitchUsage,
    #[serde(skip_serializing_if = "Option::is_none")]
    remaining: Option<i32>,
}

/// POST /api/pitch
/// Generate an AI outreach pitch for a lead. Rate limited per user on top
/// of the credit gate, since the completion call is the expensive action.
pub async fn generate_pitch(
    pool: web::Data<sqlx::PgPool>,
    config: web::Data<Config>,
    limiter: web::Data<RateLimiter>,
    pitch_service: web::Data<PitchService>,
    user: AuthenticatedUser,
    req: web::Json<GeneratePitchRequest>,
) -> AppResult<impl Responder> {
    let lead_id = req
        .lead_id
        .ok_or_else(|| AppError::Validation("lead_id is required".to_string()))?;

    // Rate limit before anything expensive, and before any credit is spent
    let rate = match limiter.check_and_increment(user.0.id) {
        RateDecision::Allowed { remaining } => remaining,
        RateDecision::Limited { retry_after_secs } => {
            return Err(AppError::RateLimited { retry_after_secs });
        }
    };

    // 404 before the gate so a missing lead never costs a credit
    let lead = LeadService::get_by_id(pool.get_ref(), lead_id).await?;

    if config.credits.pitch_requires_pro && user.0.plan != PlanTier::Pro {
        return Err(AppError::NotEntitled);
    }

    let decision =
        EntitlementService::authorize_and_consume(pool.get_ref(), &config.credits, user.0.id, 1)
            .await?;

    let remaining = match decision {
        GateDecision::Granted { remaining } => remaining,
        GateDecision::Denied => return Err(AppError::LimitReached),
    };

    let generated = pitch_service.generate(&lead, &req.options).await?;

    log::info!(
        "Generated pitch for user {} on lead {} ({} tokens)",
        user.0.id,
        lead.id,
        generated.usage.total_tokens
    );

    Ok(HttpResponse::Ok()
        .insert_header((
            "X-RateLimit-Limit",
            config.rate_limit.max_per_window.to_string(),
        ))
        .insert_header(("X-RateLimit-Remaining", rate.to_string()))
        .json(GeneratePitchResponse {
            success: true,
            pitch: generated.pitch,
            usage: generated.usage,
            remaining,
        }))
}

/// Configure pitch routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api/pitch").route("", web::post().to(generate_pitch)));
}
