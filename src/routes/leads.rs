use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::config::Config;
use crate::error::AppResult;
use crate::models::Lead;
use crate::services::{EntitlementService, GateDecision, LeadService};

const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 200;

#[derive(Deserialize)]
pub struct ListQuery {
    limit: Option<i64>,
}

#[derive(Serialize)]
struct LeadListResponse {
    leads: Vec<Lead>,
}

/// Result of the apply gate, shaped for the client's call-to-action logic
#[derive(Serialize)]
struct ApplyResponse {
    success: bool,
    allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    remaining: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
}

/// GET /api/leads
/// List recently posted leads
pub async fn list_leads(
    pool: web::Data<sqlx::PgPool>,
    _user: AuthenticatedUser,
    query: web::Query<ListQuery>,
) -> AppResult<impl Responder> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    let leads = LeadService::list_recent(pool.get_ref(), limit).await?;
    Ok(HttpResponse::Ok().json(LeadListResponse { leads }))
}

/// GET /api/leads/{id}
pub async fn get_lead(
    pool: web::Data<sqlx::PgPool>,
    _user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> AppResult<impl Responder> {
    let lead = LeadService::get_by_id(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(lead))
}

/// POST /api/leads/{id}/apply
/// The apply gate: allow the action and consume a credit, or deny.
pub async fn apply_to_lead(
    pool: web::Data<sqlx::PgPool>,
    config: web::Data<Config>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> AppResult<impl Responder> {
    let lead_id = path.into_inner();

    // 404 before any credit is touched
    LeadService::get_by_id(pool.get_ref(), lead_id).await?;

    let decision =
        EntitlementService::authorize_and_consume(pool.get_ref(), &config.credits, user.0.id, 1)
            .await?;

    match decision {
        GateDecision::Granted { remaining } => {
            log::info!("User {} applied to lead {}", user.0.id, lead_id);
            Ok(HttpResponse::Ok().json(ApplyResponse {
                success: true,
                allowed: true,
                remaining,
                reason: None,
            }))
        }
        GateDecision::Denied => Ok(HttpResponse::Forbidden().json(ApplyResponse {
            success: false,
            allowed: false,
            remaining: None,
            reason: Some("limit_reached"),
        })),
    }
}

/// Configure lead routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/leads")
            .route("", web::get().to(list_leads))
            .route("/{id}", web::get().to(get_lead))
            .route("/{id}/apply", web::post().to(apply_to_lead)),
    );
}
