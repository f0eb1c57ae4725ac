//! Subscription repository: credit balances and lifecycle.

use sqlx::PgPool;
use stockpilot_common::models::{Subscription, SubscriptionOverview};
use uuid::Uuid;

/// The user's active subscription joined with its plan.
pub async fn find_active_overview(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<SubscriptionOverview>, sqlx::Error> {
    sqlx::query_as::<_, SubscriptionOverview>(
        r#"
        SELECT s.id, s.status, s.credits_remaining, s.credits_total, s.current_period_end,
               p.id AS plan_id, p.name AS plan_name, p.slug AS plan_slug,
               p.daily_credit_reset
        FROM subscriptions s
        INNER JOIN pricing_plans p ON p.id = s.plan_id
        WHERE s.user_id = $1 AND s.status = 'active'
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Active subscriptions on a plan.
pub async fn list_active_for_plan(
    pool: &PgPool,
    plan_id: Uuid,
) -> Result<Vec<Subscription>, sqlx::Error> {
    sqlx::query_as::<_, Subscription>(
        "SELECT * FROM subscriptions WHERE plan_id = $1 AND status = 'active' ORDER BY created_at",
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await
}

/// Restore a subscription's balance to `credits`. Returns whether a row changed.
///
/// Guarded on `status = 'active'` so a subscription canceled mid-run is left alone.
pub async fn reset_credits(
    pool: &PgPool,
    subscription_id: Uuid,
    credits: i32,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE subscriptions
        SET credits_remaining = $2, credits_total = $2, updated_at = NOW()
        WHERE id = $1 AND status = 'active'
        "#,
    )
    .bind(subscription_id)
    .bind(credits)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Cancel the user's active subscription. Returns the canceled row, if any.
pub async fn cancel_active(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<Subscription>, sqlx::Error> {
    sqlx::query_as::<_, Subscription>(
        r#"
        UPDATE subscriptions
        SET status = 'canceled', canceled_at = NOW(), updated_at = NOW()
        WHERE user_id = $1 AND status = 'active'
        RETURNING *
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}
