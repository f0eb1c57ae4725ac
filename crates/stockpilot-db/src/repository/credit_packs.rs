//! Credit pack repository: catalogue and purchase settlement.

use sqlx::PgPool;
use stockpilot_common::models::{CreditPack, CreditPurchase};
use uuid::Uuid;

/// Result of applying a confirmed purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// Credits added; carries the recorded purchase and the new balance.
    Credited {
        purchase: CreditPurchase,
        credits_remaining: i32,
    },
    /// This payment reference was settled before. Nothing changed.
    AlreadyProcessed,
    /// The user has no active subscription to hold the credits. Nothing changed.
    NoActiveSubscription,
}

/// Packs offered for sale.
pub async fn list_active(pool: &PgPool) -> Result<Vec<CreditPack>, sqlx::Error> {
    sqlx::query_as::<_, CreditPack>(
        "SELECT * FROM credit_packs WHERE is_active = TRUE ORDER BY sort_order, price_cents",
    )
    .fetch_all(pool)
    .await
}

/// Find a pack that is still on sale.
pub async fn find_active(pool: &PgPool, id: Uuid) -> Result<Option<CreditPack>, sqlx::Error> {
    sqlx::query_as::<_, CreditPack>("SELECT * FROM credit_packs WHERE id = $1 AND is_active = TRUE")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Record the purchase and add the pack's credits to the user's active
/// subscription, atomically. Idempotent per `payment_reference`.
pub async fn apply_purchase(
    pool: &PgPool,
    user_id: Uuid,
    pack: &CreditPack,
    payment_reference: &str,
) -> Result<PurchaseOutcome, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let purchase = sqlx::query_as::<_, CreditPurchase>(
        r#"
        INSERT INTO credit_purchases (id, user_id, pack_id, credits, payment_reference, created_at)
        VALUES ($1, $2, $3, $4, $5, NOW())
        ON CONFLICT (payment_reference) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(Uuid::now_v7())
    .bind(user_id)
    .bind(pack.id)
    .bind(pack.credits)
    .bind(payment_reference)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(purchase) = purchase else {
        tx.rollback().await?;
        return Ok(PurchaseOutcome::AlreadyProcessed);
    };

    let balance: Option<(i32,)> = sqlx::query_as(
        r#"
        UPDATE subscriptions
        SET credits_remaining = credits_remaining + $2,
            credits_total = credits_total + $2,
            updated_at = NOW()
        WHERE user_id = $1 AND status = 'active'
        RETURNING credits_remaining
        "#,
    )
    .bind(user_id)
    .bind(pack.credits)
    .fetch_optional(&mut *tx)
    .await?;

    let Some((credits_remaining,)) = balance else {
        tx.rollback().await?;
        return Ok(PurchaseOutcome::NoActiveSubscription);
    };

    tx.commit().await?;
    Ok(PurchaseOutcome::Credited {
        purchase,
        credits_remaining,
    })
}
