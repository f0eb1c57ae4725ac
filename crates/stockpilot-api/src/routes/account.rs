//! The caller's subscription.
//!
//! GET  /subscription        : active subscription with its plan and balance
//! POST /subscription/cancel : cancel the active subscription

use axum::{
    Json, Router,
    extract::{Extension, State},
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use stockpilot_common::{
    error::{StockpilotError, StockpilotResult},
    models::{Subscription, SubscriptionOverview},
};
use stockpilot_db::repository::subscriptions;

use crate::{AppState, middleware::AuthContext};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/subscription", get(get_subscription))
        .route("/subscription/cancel", post(cancel_subscription))
        .route_layer(middleware::from_fn(crate::middleware::auth_middleware))
}

async fn get_subscription(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
) -> StockpilotResult<Json<SubscriptionOverview>> {
    subscriptions::find_active_overview(&state.db.pg, auth.user_id)
        .await?
        .map(Json)
        .ok_or_else(|| StockpilotError::not_found("Active subscription"))
}

async fn cancel_subscription(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
) -> StockpilotResult<Json<Subscription>> {
    let canceled = subscriptions::cancel_active(&state.db.pg, auth.user_id)
        .await?
        .ok_or_else(|| StockpilotError::not_found("Active subscription"))?;

    tracing::info!(user_id = %auth.user_id, subscription_id = %canceled.id, "Subscription canceled");
    Ok(Json(canceled))
}
