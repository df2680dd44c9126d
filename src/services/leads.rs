use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Lead, LeadNotificationPayload};

pub struct LeadService;

impl LeadService {
    /// Gets a lead by ID
    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> AppResult<Lead> {
        sqlx::query_as::<_, Lead>(
            r#"
            SELECT id, title, company, description, url, budget, skill, is_whale, posted_at
            FROM leads
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Lead {} not found", id)))
    }

    /// Lists the most recently posted leads
    pub async fn list_recent(pool: &PgPool, limit: i64) -> AppResult<Vec<Lead>> {
        let leads = sqlx::query_as::<_, Lead>(
            r#"
            SELECT id, title, company, description, url, budget, skill, is_whale, posted_at
            FROM leads
            ORDER BY posted_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(leads)
    }

    /// Upserts a lead from an ingested notification payload. Redelivered
    /// payloads with the same id refresh the stored fields.
    pub async fn upsert_from_payload(
        pool: &PgPool,
        payload: &LeadNotificationPayload,
    ) -> AppResult<Lead> {
        let lead = sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO leads (id, title, company, description, url, budget, skill)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE
            SET title = EXCLUDED.title,
                company = EXCLUDED.company,
                description = EXCLUDED.description,
                url = EXCLUDED.url,
                budget = EXCLUDED.budget,
                skill = EXCLUDED.skill
            RETURNING id, title, company, description, url, budget, skill, is_whale, posted_at
            "#,
        )
        .bind(payload.id)
        .bind(&payload.title)
        .bind(&payload.company)
        .bind(&payload.description)
        .bind(&payload.url)
        .bind(&payload.budget)
        .bind(&payload.skill)
        .fetch_one(pool)
        .await?;

        Ok(lead)
    }
}
