//! Generations: one completed AI job tied to an uploaded file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Which AI tool produced the generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GenerationTool {
    /// Titles, descriptions and keywords for marketplace submission
    Metadata,
    /// Reverse-engineered text-to-image prompt
    ImageToPrompt,
    /// Pre-submission quality review
    FileReview,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Generation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tool: GenerationTool,
    pub file_name: String,
    pub file_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub result: serde_json::Value,
    pub credits_used: i32,
    /// Marketplace slugs from the `generation_marketplaces` join rows
    pub marketplaces: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// The minimal projection the cleanup job needs.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ExpiredGeneration {
    pub id: Uuid,
    pub file_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateGenerationRequest {
    pub tool: GenerationTool,

    #[validate(length(min = 1, max = 255, message = "file_name must be 1-255 characters"))]
    pub file_name: String,

    #[validate(url(message = "file_url must be a valid URL"))]
    pub file_url: Option<String>,

    #[validate(url(message = "thumbnail_url must be a valid URL"))]
    pub thumbnail_url: Option<String>,

    /// Marketplace slugs the output was produced for; each costs one credit.
    #[validate(length(max = 16, message = "At most 16 marketplaces per generation"))]
    #[serde(default)]
    pub marketplaces: Vec<String>,

    #[serde(default)]
    pub result: serde_json::Value,
}
