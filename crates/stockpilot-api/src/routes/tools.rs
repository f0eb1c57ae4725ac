//! Options for the AI tools.
//!
//! GET  /tools/options            : prompt styles, detail levels, marketplaces
//! POST /tools/prompt-instruction : compose the image-to-prompt instruction

use axum::{
    Json, Router,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use stockpilot_common::{
    error::StockpilotResult,
    text::{Marketplace, PromptDetail, PromptStyle, image_to_prompt_instruction},
};

use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tools/options", get(options))
        .route("/tools/prompt-instruction", post(prompt_instruction))
}

#[derive(Serialize)]
struct StyleOption {
    slug: &'static str,
    label: &'static str,
}

#[derive(Serialize)]
struct DetailOption {
    slug: &'static str,
    label: &'static str,
    word_budget: u32,
}

#[derive(Serialize)]
struct ToolOptions {
    styles: Vec<StyleOption>,
    details: Vec<DetailOption>,
    marketplaces: Vec<&'static str>,
}

async fn options() -> Json<ToolOptions> {
    Json(ToolOptions {
        styles: PromptStyle::ALL
            .iter()
            .map(|s| StyleOption {
                slug: s.slug(),
                label: s.label(),
            })
            .collect(),
        details: PromptDetail::ALL
            .iter()
            .map(|d| DetailOption {
                slug: d.slug(),
                label: d.label(),
                word_budget: d.word_budget(),
            })
            .collect(),
        marketplaces: Marketplace::ALL.iter().map(|m| m.slug()).collect(),
    })
}

#[derive(Deserialize)]
struct InstructionRequest {
    style: String,
    detail: String,
}

#[derive(Serialize)]
struct InstructionResponse {
    instruction: String,
}

async fn prompt_instruction(
    Json(body): Json<InstructionRequest>,
) -> StockpilotResult<Json<InstructionResponse>> {
    let style: PromptStyle = body.style.parse()?;
    let detail: PromptDetail = body.detail.parse()?;
    Ok(Json(InstructionResponse {
        instruction: image_to_prompt_instruction(style, detail),
    }))
}
