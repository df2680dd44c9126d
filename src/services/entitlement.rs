//! Entitlement gate: decides whether a gated action is allowed for a user
//! and, on the FREE path, consumes the daily credit that permits it.
//!
//! The decrement is a single conditional UPDATE so two concurrent requests
//! can never spend the same credit or drive the stored count negative.

use sqlx::PgPool;
use uuid::Uuid;

use crate::config::CreditsConfig;
use crate::error::{AppError, AppResult};
use crate::models::{PlanTier, Profile};
use crate::services::ProfileService;

/// Outcome of an authorization check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Action permitted. `remaining` is the credit balance after the
    /// decrement for FREE accounts, `None` for Pro (unlimited).
    Granted { remaining: Option<i32> },
    /// FREE account out of credits for today
    Denied,
}

impl GateDecision {
    pub fn allowed(&self) -> bool {
        matches!(self, GateDecision::Granted { .. })
    }

    pub fn remaining(&self) -> Option<i32> {
        match self {
            GateDecision::Granted { remaining } => *remaining,
            GateDecision::Denied => None,
        }
    }
}

pub struct EntitlementService;

impl EntitlementService {
    /// Authorizes one gated action for `user_id` and consumes `cost` credits
    /// if the account is on the FREE plan.
    ///
    /// Pro accounts are a fast path: allowed immediately, zero writes. FREE
    /// accounts get a lazy daily reset, then an atomic conditional decrement.
    /// Exactly one write happens on the granted FREE path and none on any
    /// deny or error path.
    pub async fn authorize_and_consume(
        pool: &PgPool,
        config: &CreditsConfig,
        user_id: Uuid,
        cost: i32,
    ) -> AppResult<GateDecision> {
        debug_assert!(cost > 0);

        let profile = ProfileService::get_by_id(pool, user_id)
            .await?
            .ok_or(AppError::ProfileNotFound(user_id))?;

        if profile.plan == PlanTier::Pro {
            return Ok(GateDecision::Granted { remaining: None });
        }

        Self::maybe_reset_credits(pool, config, user_id).await?;

        // Decrement only if the balance covers the cost, in one round trip.
        // No row back means the credits are exhausted.
        let remaining: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE profiles
            SET daily_credits = daily_credits - $2
            WHERE id = $1 AND plan = 'free' AND daily_credits >= $2
            RETURNING daily_credits
            "#,
        )
        .bind(user_id)
        .bind(cost)
        .fetch_optional(pool)
        .await?;

        match remaining {
            Some(remaining) => {
                log::debug!(
                    "Granted action for {} (cost {}, {} credits left)",
                    user_id,
                    cost,
                    remaining
                );
                Ok(GateDecision::Granted {
                    remaining: Some(remaining),
                })
            }
            None => Ok(GateDecision::Denied),
        }
    }

    /// Restores the daily allotment if the stored reset marker is from a
    /// previous calendar day. The WHERE clause makes a second call on the
    /// same day a no-op, so the restore happens at most once per day.
    pub async fn maybe_reset_credits(
        pool: &PgPool,
        config: &CreditsConfig,
        user_id: Uuid,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET daily_credits = $2, last_credit_reset = NOW()
            WHERE id = $1 AND plan = 'free' AND last_credit_reset::date < CURRENT_DATE
            "#,
        )
        .bind(user_id)
        .bind(config.daily_allotment)
        .execute(pool)
        .await?;

        let reset = result.rows_affected() > 0;
        if reset {
            log::debug!("Daily credits restored for {}", user_id);
        }
        Ok(reset)
    }

    /// Remaining credits for display. `None` for Pro accounts (unlimited).
    pub fn displayed_credits(profile: &Profile) -> Option<i32> {
        match profile.plan {
            PlanTier::Pro => None,
            PlanTier::Free => Some(profile.daily_credits),
        }
    }
}
