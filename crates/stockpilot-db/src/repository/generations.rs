//! Generation repository: completed AI jobs, their marketplace links, and the
//! credit debit that pays for them.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use stockpilot_common::models::{ExpiredGeneration, Generation, GenerationTool};
use uuid::Uuid;

/// Columns of [`Generation`] with the marketplace join rows folded into an array.
const GENERATION_SELECT: &str = r#"
    SELECT g.id, g.user_id, g.tool, g.file_name, g.file_url, g.thumbnail_url,
           g.result, g.credits_used, g.created_at,
           COALESCE(
               array_agg(gm.marketplace ORDER BY gm.marketplace)
                   FILTER (WHERE gm.marketplace IS NOT NULL),
               '{}'::text[]
           ) AS marketplaces
    FROM generations g
    LEFT JOIN generation_marketplaces gm ON gm.generation_id = g.id
"#;

/// Fields of a generation being recorded.
#[derive(Debug, Clone)]
pub struct NewGeneration<'a> {
    pub user_id: Uuid,
    pub tool: GenerationTool,
    pub file_name: &'a str,
    pub file_url: Option<&'a str>,
    pub thumbnail_url: Option<&'a str>,
    pub result: &'a serde_json::Value,
    pub marketplaces: &'a [String],
    pub credits: i32,
}

/// Result of trying to record a generation.
#[derive(Debug)]
pub enum RecordOutcome {
    Recorded(Generation),
    /// The active subscription holds fewer credits than the generation costs.
    InsufficientCredits { available: i32 },
}

// ============================================================
// Create
// ============================================================

/// Debit the user's active subscription and insert the generation in one
/// transaction. The debit is a conditional UPDATE, so concurrent requests
/// cannot push `credits_remaining` below zero.
pub async fn record_generation(
    pool: &PgPool,
    new: NewGeneration<'_>,
) -> Result<RecordOutcome, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let debited = sqlx::query(
        r#"
        UPDATE subscriptions
        SET credits_remaining = credits_remaining - $2, updated_at = NOW()
        WHERE user_id = $1 AND status = 'active' AND credits_remaining >= $2
        "#,
    )
    .bind(new.user_id)
    .bind(new.credits)
    .execute(&mut *tx)
    .await?;

    if debited.rows_affected() == 0 {
        let available: Option<(i32,)> = sqlx::query_as(
            "SELECT credits_remaining FROM subscriptions WHERE user_id = $1 AND status = 'active'",
        )
        .bind(new.user_id)
        .fetch_optional(&mut *tx)
        .await?;
        tx.rollback().await?;
        return Ok(RecordOutcome::InsufficientCredits {
            available: available.map(|r| r.0).unwrap_or(0),
        });
    }

    let id = Uuid::now_v7();
    let created_at: (DateTime<Utc>,) = sqlx::query_as(
        r#"
        INSERT INTO generations (
            id, user_id, tool, file_name, file_url, thumbnail_url,
            result, credits_used, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
        RETURNING created_at
        "#,
    )
    .bind(id)
    .bind(new.user_id)
    .bind(new.tool)
    .bind(new.file_name)
    .bind(new.file_url)
    .bind(new.thumbnail_url)
    .bind(new.result)
    .bind(new.credits)
    .fetch_one(&mut *tx)
    .await?;

    if !new.marketplaces.is_empty() {
        sqlx::query(
            r#"
            INSERT INTO generation_marketplaces (generation_id, marketplace)
            SELECT $1, UNNEST($2::text[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(id)
        .bind(new.marketplaces)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    let mut marketplaces = new.marketplaces.to_vec();
    marketplaces.sort();

    Ok(RecordOutcome::Recorded(Generation {
        id,
        user_id: new.user_id,
        tool: new.tool,
        file_name: new.file_name.to_string(),
        file_url: new.file_url.map(str::to_string),
        thumbnail_url: new.thumbnail_url.map(str::to_string),
        result: new.result.clone(),
        credits_used: new.credits,
        marketplaces,
        created_at: created_at.0,
    }))
}

// ============================================================
// Read
// ============================================================

/// A user's generations, newest first.
pub async fn list_for_user(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<Generation>, sqlx::Error> {
    let sql = format!(
        "{GENERATION_SELECT} WHERE g.user_id = $1 GROUP BY g.id ORDER BY g.created_at DESC LIMIT $2"
    );
    sqlx::query_as::<_, Generation>(&sql)
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await
}

/// Generations created strictly before `cutoff`.
pub async fn list_created_before(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
) -> Result<Vec<ExpiredGeneration>, sqlx::Error> {
    sqlx::query_as::<_, ExpiredGeneration>(
        r#"
        SELECT id, file_url, thumbnail_url, created_at
        FROM generations
        WHERE created_at < $1
        ORDER BY created_at
        "#,
    )
    .bind(cutoff)
    .fetch_all(pool)
    .await
}

// ============================================================
// Delete
// ============================================================

/// Remove the marketplace join rows of the given generations.
pub async fn delete_marketplace_links(pool: &PgPool, ids: &[Uuid]) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM generation_marketplaces WHERE generation_id = ANY($1)")
        .bind(ids)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Remove generation rows. Join rows must already be gone.
pub async fn delete_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM generations WHERE id = ANY($1)")
        .bind(ids)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
