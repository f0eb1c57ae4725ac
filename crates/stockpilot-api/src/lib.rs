//! # stockpilot-api
//!
//! HTTP surface of Stockpilot: the REST API under `/api/v1` and the
//! cron / webhook style function endpoints under `/functions/v1`.

pub mod email;
pub mod middleware;
pub mod routes;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use std::sync::Arc;
use stockpilot_db::{Database, storage::StorageClient};
use stockpilot_media::Preprocessor;

use crate::email::ContactMailer;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// S3-compatible bucket holding uploaded generation files.
    pub storage: StorageClient,
    /// SMTP relay for the contact form; `None` when not configured.
    pub mailer: Option<ContactMailer>,
    pub preprocessor: Preprocessor,
}

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let max_upload = stockpilot_common::config::get().limits.max_upload_bytes as usize;

    let api_routes = Router::new()
        .merge(routes::health::router())
        .merge(routes::catalog::router())
        .merge(routes::admin::router())
        .merge(routes::account::router())
        .merge(routes::generations::router())
        .merge(routes::media::router())
        .merge(routes::uploads::router())
        .merge(routes::tools::router());

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/functions/v1", routes::functions::router())
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::compression::CompressionLayer::new())
        .with_state(Arc::new(state))
}
