use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;

/// JSON error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    /// Machine-readable reason code the client UI switches on
    /// (upgrade prompt vs. retry countdown vs. paywall).
    pub reason: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

/// Application errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Profile not found for user {0}")]
    ProfileNotFound(uuid::Uuid),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Daily credit limit reached")]
    LimitReached,

    #[error("This feature requires a Pro plan")]
    NotEntitled,

    #[error("Rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Upstream service unavailable: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Reason code used by the client to pick a call-to-action
    fn reason(&self) -> &'static str {
        match self {
            AppError::NotFound(_) | AppError::ProfileNotFound(_) => "not_found",
            AppError::Validation(_) => "invalid_request",
            AppError::Unauthorized(_) => "not_authenticated",
            AppError::LimitReached => "limit_reached",
            AppError::NotEntitled => "pro_required",
            AppError::RateLimited { .. } => "rate_limited",
            AppError::Upstream(_) => "upstream_unavailable",
            AppError::Database(_) => "database_error",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) | AppError::ProfileNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::LimitReached | AppError::NotEntitled => StatusCode::FORBIDDEN,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let retry_after = match self {
            AppError::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        };

        let response = ErrorResponse {
            success: false,
            error: ErrorDetail {
                reason: self.reason().to_string(),
                message: self.to_string(),
                retry_after,
            },
        };

        let mut builder = HttpResponse::build(self.status_code());
        if let Some(secs) = retry_after {
            builder.insert_header(("Retry-After", secs.to_string()));
        }
        builder.json(response)
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
