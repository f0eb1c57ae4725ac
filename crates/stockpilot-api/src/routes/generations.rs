//! Generation history and metering.
//!
//! GET  /generations : the caller's generations, newest first (`?limit=`)
//! POST /generations : record a completed generation and debit its credits

use axum::{
    Json, Router,
    extract::{Extension, Query, State},
    http::StatusCode,
    middleware,
    routing::get,
};
use serde::Deserialize;
use std::sync::Arc;
use stockpilot_common::{
    error::{StockpilotError, StockpilotResult},
    models::{CreateGenerationRequest, Generation},
    text::{credit_cost, parse_marketplaces},
    validation::{require_non_blank, validate_request},
};
use stockpilot_db::repository::generations::{self, NewGeneration, RecordOutcome};

use crate::{AppState, middleware::AuthContext};

const DEFAULT_PAGE: i64 = 50;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/generations", get(list_generations).post(create_generation))
        .route_layer(middleware::from_fn(crate::middleware::auth_middleware))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    limit: Option<i64>,
}

async fn list_generations(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> StockpilotResult<Json<Vec<Generation>>> {
    let max = stockpilot_common::config::get().limits.max_generations_page;
    let limit = params.limit.unwrap_or(DEFAULT_PAGE).clamp(1, max.max(1));

    let rows = generations::list_for_user(&state.db.pg, auth.user_id, limit).await?;
    Ok(Json(rows))
}

async fn create_generation(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateGenerationRequest>,
) -> StockpilotResult<(StatusCode, Json<Generation>)> {
    validate_request(&body)?;
    require_non_blank("file_name", &body.file_name)?;

    let marketplaces = parse_marketplaces(&body.marketplaces)?;
    let credits = credit_cost(&marketplaces);
    let slugs: Vec<String> = marketplaces.iter().map(|m| m.slug().to_string()).collect();

    let outcome = generations::record_generation(
        &state.db.pg,
        NewGeneration {
            user_id: auth.user_id,
            tool: body.tool,
            file_name: body.file_name.trim(),
            file_url: body.file_url.as_deref(),
            thumbnail_url: body.thumbnail_url.as_deref(),
            result: &body.result,
            marketplaces: &slugs,
            credits,
        },
    )
    .await?;

    match outcome {
        RecordOutcome::Recorded(generation) => {
            tracing::info!(
                user_id = %auth.user_id,
                generation_id = %generation.id,
                credits,
                "Generation recorded"
            );
            Ok((StatusCode::CREATED, Json(generation)))
        }
        RecordOutcome::InsufficientCredits { available } => {
            Err(StockpilotError::InsufficientCredits {
                required: credits,
                available,
            })
        }
    }
}
