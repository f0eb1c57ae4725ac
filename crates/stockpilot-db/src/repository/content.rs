//! Site content repository: FAQs and testimonials.

use sqlx::PgPool;
use stockpilot_common::models::{CreateFaqRequest, CreateTestimonialRequest, Faq, Testimonial};
use uuid::Uuid;

// ============================================================
// FAQs
// ============================================================

pub async fn list_faqs(pool: &PgPool) -> Result<Vec<Faq>, sqlx::Error> {
    sqlx::query_as::<_, Faq>("SELECT * FROM faqs ORDER BY sort_order, created_at")
        .fetch_all(pool)
        .await
}

pub async fn create_faq(pool: &PgPool, req: &CreateFaqRequest) -> Result<Faq, sqlx::Error> {
    sqlx::query_as::<_, Faq>(
        r#"
        INSERT INTO faqs (id, question, answer, sort_order, created_at)
        VALUES ($1, $2, $3, $4, NOW())
        RETURNING *
        "#,
    )
    .bind(Uuid::now_v7())
    .bind(req.question.trim())
    .bind(req.answer.trim())
    .bind(req.sort_order)
    .fetch_one(pool)
    .await
}

/// Returns whether a row was deleted.
pub async fn delete_faq(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM faqs WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ============================================================
// Testimonials
// ============================================================

pub async fn list_testimonials(pool: &PgPool) -> Result<Vec<Testimonial>, sqlx::Error> {
    sqlx::query_as::<_, Testimonial>("SELECT * FROM testimonials ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

pub async fn create_testimonial(
    pool: &PgPool,
    req: &CreateTestimonialRequest,
) -> Result<Testimonial, sqlx::Error> {
    sqlx::query_as::<_, Testimonial>(
        r#"
        INSERT INTO testimonials (id, author_name, author_role, content, rating, avatar_url, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, NOW())
        RETURNING *
        "#,
    )
    .bind(Uuid::now_v7())
    .bind(req.author_name.trim())
    .bind(req.author_role.as_deref())
    .bind(req.content.trim())
    .bind(req.rating)
    .bind(req.avatar_url.as_deref())
    .fetch_one(pool)
    .await
}

/// Returns whether a row was deleted.
pub async fn delete_testimonial(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM testimonials WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
