//! Subscriptions and the credit balance they carry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Canceled,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub status: SubscriptionStatus,
    pub credits_remaining: i32,
    pub credits_total: i32,
    pub current_period_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub canceled_at: Option<DateTime<Utc>>,
}

/// A user's current subscription joined with the plan it belongs to.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SubscriptionOverview {
    pub id: Uuid,
    pub status: SubscriptionStatus,
    pub credits_remaining: i32,
    pub credits_total: i32,
    pub current_period_end: Option<DateTime<Utc>>,
    pub plan_id: Uuid,
    pub plan_name: String,
    pub plan_slug: String,
    pub daily_credit_reset: bool,
}
