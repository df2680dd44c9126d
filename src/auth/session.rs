use actix_session::Session;
use actix_web::{dev::Payload, web, Error, FromRequest, HttpRequest};
use std::pin::Pin;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::Profile;
use crate::services::ProfileService;

const SESSION_USER_ID_KEY: &str = "user_id";

/// Store user ID in session
pub fn set_user_session(session: &Session, user_id: Uuid) -> AppResult<()> {
    session
        .insert(SESSION_USER_ID_KEY, user_id)
        .map_err(|e| AppError::Internal(format!("Failed to set session: {}", e)))
}

/// Get user ID from session
pub fn get_user_id_from_session(session: &Session) -> Option<Uuid> {
    session.get::<Uuid>(SESSION_USER_ID_KEY).ok().flatten()
}

/// Clear session (logout)
pub fn clear_session(session: &Session) {
    session.purge();
}

/// Extractor for the authenticated user behind the session cookie.
/// Every gated route takes this; an absent or stale session is a 401
/// before any credit state is touched.
pub struct AuthenticatedUser(pub Profile);

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Pin<Box<dyn std::future::Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let session = Session::extract(&req)
                .await
                .map_err(|_| AppError::Unauthorized("Session error".to_string()))?;

            let user_id = get_user_id_from_session(&session)
                .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?;

            let pool = req
                .app_data::<web::Data<sqlx::PgPool>>()
                .ok_or_else(|| AppError::Internal("Database pool not found".to_string()))?;

            let profile = ProfileService::get_by_id(pool.get_ref(), user_id)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to fetch profile: {}", e)))?
                .ok_or(AppError::ProfileNotFound(user_id))?;

            if !profile.is_active {
                return Err(AppError::Unauthorized("Account is disabled".to_string()).into());
            }

            Ok(AuthenticatedUser(profile))
        })
    }
}
