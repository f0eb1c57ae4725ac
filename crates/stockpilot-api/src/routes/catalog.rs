//! Public catalogue reads for the landing and pricing pages.
//!
//! GET /plans        : active pricing plans
//! GET /credit-packs : credit packs on sale
//! GET /faqs         : FAQ entries
//! GET /testimonials : testimonials

use axum::{Json, Router, extract::State, routing::get};
use std::sync::Arc;
use stockpilot_common::{
    error::StockpilotResult,
    models::{CreditPack, Faq, PricingPlan, Testimonial},
};
use stockpilot_db::repository::{content, credit_packs, plans};

use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/plans", get(list_plans))
        .route("/credit-packs", get(list_credit_packs))
        .route("/faqs", get(list_faqs))
        .route("/testimonials", get(list_testimonials))
}

async fn list_plans(State(state): State<Arc<AppState>>) -> StockpilotResult<Json<Vec<PricingPlan>>> {
    Ok(Json(plans::list_active(&state.db.pg).await?))
}

async fn list_credit_packs(
    State(state): State<Arc<AppState>>,
) -> StockpilotResult<Json<Vec<CreditPack>>> {
    Ok(Json(credit_packs::list_active(&state.db.pg).await?))
}

async fn list_faqs(State(state): State<Arc<AppState>>) -> StockpilotResult<Json<Vec<Faq>>> {
    Ok(Json(content::list_faqs(&state.db.pg).await?))
}

async fn list_testimonials(
    State(state): State<Arc<AppState>>,
) -> StockpilotResult<Json<Vec<Testimonial>>> {
    Ok(Json(content::list_testimonials(&state.db.pg).await?))
}
