//! Pricing plan repository.

use sqlx::PgPool;
use stockpilot_common::models::PricingPlan;

/// Plans shown on the pricing page.
pub async fn list_active(pool: &PgPool) -> Result<Vec<PricingPlan>, sqlx::Error> {
    sqlx::query_as::<_, PricingPlan>(
        "SELECT * FROM pricing_plans WHERE is_active = TRUE ORDER BY sort_order, price_cents",
    )
    .fetch_all(pool)
    .await
}

/// Plans whose subscriptions get their credits restored every day.
///
/// Inactive plans are included: existing subscribers keep the behaviour
/// even after a plan is withdrawn from sale.
pub async fn list_daily_reset(pool: &PgPool) -> Result<Vec<PricingPlan>, sqlx::Error> {
    sqlx::query_as::<_, PricingPlan>(
        "SELECT * FROM pricing_plans WHERE daily_credit_reset = TRUE ORDER BY sort_order",
    )
    .fetch_all(pool)
    .await
}
