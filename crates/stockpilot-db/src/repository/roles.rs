//! User role lookups.

use sqlx::PgPool;
use uuid::Uuid;

/// Whether the user holds the `admin` role.
pub async fn is_admin(pool: &PgPool, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM user_roles WHERE user_id = $1 AND role = 'admin')",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}
