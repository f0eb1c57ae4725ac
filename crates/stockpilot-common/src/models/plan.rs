//! Pricing plans: the recurring subscription tiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A subscription tier as listed on the pricing page.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PricingPlan {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    /// Monthly price in the smallest currency unit
    pub price_cents: i32,
    /// Base credit allotment granted by the plan
    pub credits: i32,
    /// When set, active subscriptions are topped back up to `credits` every day
    pub daily_credit_reset: bool,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}
