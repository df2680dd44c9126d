use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A scraped opportunity surfaced to users
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Lead {
    pub id: Uuid,
    pub title: String,
    pub company: Option<String>,
    pub description: String,
    pub url: Option<String>,
    pub budget: Option<String>,
    pub skill: Option<String>,
    pub is_whale: bool,
    pub posted_at: DateTime<Utc>,
}

/// Immutable snapshot of a lead handed to the notification fan-out.
/// Built from an ingested payload, never read back from storage mid-dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadNotificationPayload {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub budget: Option<String>,
    #[serde(default)]
    pub skill: Option<String>,
}

impl From<&Lead> for LeadNotificationPayload {
    fn from(lead: &Lead) -> Self {
        Self {
            id: lead.id,
            title: lead.title.clone(),
            company: lead.company.clone(),
            description: lead.description.clone(),
            url: lead.url.clone(),
            budget: lead.budget.clone(),
            skill: lead.skill.clone(),
        }
    }
}

/// Body of the authenticated notify endpoint
#[derive(Debug, Deserialize)]
pub struct NotifyRequest {
    pub secret: String,
    pub lead: LeadNotificationPayload,
}

/// Body of the admin notify-pro trigger
#[derive(Debug, Deserialize)]
pub struct NotifyProRequest {
    pub secret: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub apply_link: Option<String>,
}
