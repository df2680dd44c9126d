use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{CreateProfileRequest, NotificationTarget, PlanTier, Profile};

pub struct ProfileService;

impl ProfileService {
    /// Creates a new FREE profile with the full daily allotment
    pub async fn create(
        pool: &PgPool,
        req: &CreateProfileRequest,
        daily_allotment: i32,
    ) -> AppResult<Profile> {
        let password_hash = Profile::hash_password(&req.password)?;

        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (email, password_hash, daily_credits, telegram_chat_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, password_hash, plan, daily_credits, last_credit_reset,
                      telegram_chat_id, email_notifications, is_active, created_at, last_login
            "#,
        )
        .bind(&req.email)
        .bind(&password_hash)
        .bind(daily_allotment)
        .bind(&req.telegram_chat_id)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Validation("Email already exists".to_string())
            }
            _ => AppError::Internal(format!("Failed to create profile: {}", e)),
        })?;

        Ok(profile)
    }

    /// Gets a profile by email
    pub async fn get_by_email(pool: &PgPool, email: &str) -> AppResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, email, password_hash, plan, daily_credits, last_credit_reset,
                   telegram_chat_id, email_notifications, is_active, created_at, last_login
            FROM profiles
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(profile)
    }

    /// Gets a profile by ID
    pub async fn get_by_id(pool: &PgPool, user_id: Uuid) -> AppResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, email, password_hash, plan, daily_credits, last_credit_reset,
                   telegram_chat_id, email_notifications, is_active, created_at, last_login
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(profile)
    }

    /// Updates the last login timestamp
    pub async fn update_last_login(pool: &PgPool, user_id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE profiles SET last_login = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Moves a profile to a plan tier. Idempotent; used by the payment
    /// webhook when a capture event arrives (possibly redelivered).
    pub async fn set_plan(pool: &PgPool, user_id: Uuid, plan: PlanTier) -> AppResult<()> {
        let result = sqlx::query("UPDATE profiles SET plan = $2 WHERE id = $1")
            .bind(user_id)
            .bind(plan)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ProfileNotFound(user_id));
        }

        Ok(())
    }

    /// Loads the fan-out roster: every Pro account, projecting only its
    /// contact channels. Email is masked out for accounts that opted out
    /// of email notifications.
    pub async fn pro_notification_targets(pool: &PgPool) -> AppResult<Vec<NotificationTarget>> {
        let targets = sqlx::query_as::<_, NotificationTarget>(
            r#"
            SELECT id,
                   CASE WHEN email_notifications THEN email END AS email,
                   telegram_chat_id
            FROM profiles
            WHERE plan = 'pro' AND is_active = TRUE
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(targets)
    }
}
