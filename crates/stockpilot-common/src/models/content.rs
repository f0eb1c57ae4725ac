//! Marketing content rows managed by admins: FAQs and testimonials.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Faq {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFaqRequest {
    #[validate(length(min = 1, max = 300, message = "Question must be 1-300 characters"))]
    pub question: String,

    #[validate(length(min = 1, max = 4000, message = "Answer must be 1-4000 characters"))]
    pub answer: String,

    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Testimonial {
    pub id: Uuid,
    pub author_name: String,
    pub author_role: Option<String>,
    pub content: String,
    pub rating: i16,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTestimonialRequest {
    #[validate(length(min = 1, max = 100, message = "Author name must be 1-100 characters"))]
    pub author_name: String,

    #[validate(length(max = 100, message = "Author role must be at most 100 characters"))]
    pub author_role: Option<String>,

    #[validate(length(min = 1, max = 2000, message = "Content must be 1-2000 characters"))]
    pub content: String,

    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i16,

    #[validate(url(message = "avatar_url must be a valid URL"))]
    pub avatar_url: Option<String>,
}
