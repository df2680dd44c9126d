use actix_session::Session;
use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;

use crate::auth::{self, AuthenticatedUser};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{CreateProfileRequest, LoginRequest, PlanTier, Profile};
use crate::services::{EntitlementService, ProfileService};

#[derive(Serialize)]
struct AuthResponse {
    user: ProfileResponse,
}

#[derive(Serialize)]
struct ProfileResponse {
    id: uuid::Uuid,
    email: String,
    plan: PlanTier,
    /// Remaining daily credits; absent for Pro (unlimited)
    #[serde(skip_serializing_if = "Option::is_none")]
    daily_credits: Option<i32>,
    telegram_linked: bool,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            email: profile.email.clone(),
            plan: profile.plan,
            daily_credits: EntitlementService::displayed_credits(&profile),
            telegram_linked: profile.telegram_chat_id.is_some(),
        }
    }
}

/// Email validation - checks basic format requirements
fn is_valid_email(email: &str) -> bool {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return false;
    }
    let (local, domain) = (parts[0], parts[1]);

    if local.is_empty() || local.len() > 64 {
        return false;
    }

    if domain.is_empty() || domain.len() > 255 || !domain.contains('.') {
        return false;
    }
    if domain.starts_with('.') || domain.ends_with('.') {
        return false;
    }

    let domain_parts: Vec<&str> = domain.split('.').collect();
    if domain_parts.iter().any(|p| p.is_empty()) {
        return false;
    }

    // TLD must be at least 2 chars
    matches!(domain_parts.last(), Some(tld) if tld.len() >= 2)
}

/// POST /api/auth/register
/// Create a FREE account with the full daily allotment
pub async fn register(
    pool: web::Data<sqlx::PgPool>,
    config: web::Data<Config>,
    session: Session,
    req: web::Json<CreateProfileRequest>,
) -> AppResult<impl Responder> {
    if !is_valid_email(&req.email) {
        return Err(AppError::Validation("Invalid email format".to_string()));
    }

    if req.password.is_empty() {
        return Err(AppError::Validation("Password is required".to_string()));
    }

    let profile =
        ProfileService::create(pool.get_ref(), &req, config.credits.daily_allotment).await?;

    auth::set_user_session(&session, profile.id)?;

    Ok(HttpResponse::Created().json(AuthResponse {
        user: profile.into(),
    }))
}

/// POST /api/auth/login
/// Authenticate user and create session
pub async fn login(
    pool: web::Data<sqlx::PgPool>,
    config: web::Data<Config>,
    session: Session,
    req: web::Json<LoginRequest>,
) -> AppResult<impl Responder> {
    let profile = ProfileService::get_by_email(pool.get_ref(), &req.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    if !profile.is_active {
        return Err(AppError::Unauthorized("Account is disabled".to_string()));
    }

    if !profile.verify_password(&req.password)? {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    ProfileService::update_last_login(pool.get_ref(), profile.id).await?;

    // Lazy daily reset so the client sees fresh credits right after login
    EntitlementService::maybe_reset_credits(pool.get_ref(), &config.credits, profile.id).await?;
    let profile = ProfileService::get_by_id(pool.get_ref(), profile.id)
        .await?
        .ok_or(AppError::ProfileNotFound(profile.id))?;

    auth::set_user_session(&session, profile.id)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        user: profile.into(),
    }))
}

/// POST /api/auth/logout
/// Clear session
pub async fn logout(session: Session) -> impl Responder {
    auth::clear_session(&session);
    HttpResponse::NoContent().finish()
}

/// GET /api/auth/me
/// Get current authenticated user with plan and remaining credits
pub async fn get_current_user(
    pool: web::Data<sqlx::PgPool>,
    config: web::Data<Config>,
    user: AuthenticatedUser,
) -> AppResult<impl Responder> {
    let reset =
        EntitlementService::maybe_reset_credits(pool.get_ref(), &config.credits, user.0.id).await?;

    let profile = if reset {
        ProfileService::get_by_id(pool.get_ref(), user.0.id)
            .await?
            .ok_or(AppError::ProfileNotFound(user.0.id))?
    } else {
        user.0
    };

    Ok(HttpResponse::Ok().json(ProfileResponse::from(profile)))
}

/// Configure auth routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/auth")
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .route("/logout", web::post().to(logout))
            .route("/me", web::get().to(get_current_user)),
    );
}
