//! Site content management, admin role only.
//!
//! POST   /admin/faqs               : create an FAQ entry
//! DELETE /admin/faqs/{id}          : delete an FAQ entry
//! POST   /admin/testimonials       : create a testimonial
//! DELETE /admin/testimonials/{id}  : delete a testimonial

use axum::{
    Json, Router,
    extract::{Extension, Path, State},
    http::StatusCode,
    middleware,
    routing::{delete, post},
};
use std::sync::Arc;
use stockpilot_common::{
    error::{StockpilotError, StockpilotResult},
    models::{CreateFaqRequest, CreateTestimonialRequest, Faq, Testimonial},
    validation::{require_non_blank, validate_request},
};
use stockpilot_db::repository::content;
use uuid::Uuid;

use crate::{
    AppState,
    middleware::{AuthContext, require_admin},
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/faqs", post(create_faq))
        .route("/admin/faqs/{id}", delete(delete_faq))
        .route("/admin/testimonials", post(create_testimonial))
        .route("/admin/testimonials/{id}", delete(delete_testimonial))
        .route_layer(middleware::from_fn(crate::middleware::auth_middleware))
}

async fn create_faq(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateFaqRequest>,
) -> StockpilotResult<(StatusCode, Json<Faq>)> {
    validate_request(&body)?;
    require_non_blank("question", &body.question)?;
    require_admin(&state, &auth).await?;

    let faq = content::create_faq(&state.db.pg, &body).await?;
    tracing::info!(faq_id = %faq.id, admin = %auth.user_id, "FAQ created");
    Ok((StatusCode::CREATED, Json(faq)))
}

async fn delete_faq(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> StockpilotResult<StatusCode> {
    require_admin(&state, &auth).await?;
    if !content::delete_faq(&state.db.pg, id).await? {
        return Err(StockpilotError::not_found("FAQ"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn create_testimonial(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTestimonialRequest>,
) -> StockpilotResult<(StatusCode, Json<Testimonial>)> {
    validate_request(&body)?;
    require_non_blank("content", &body.content)?;
    require_admin(&state, &auth).await?;

    let testimonial = content::create_testimonial(&state.db.pg, &body).await?;
    Ok((StatusCode::CREATED, Json(testimonial)))
}

async fn delete_testimonial(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> StockpilotResult<StatusCode> {
    require_admin(&state, &auth).await?;
    if !content::delete_testimonial(&state.db.pg, id).await? {
        return Err(StockpilotError::not_found("Testimonial"));
    }
    Ok(StatusCode::NO_CONTENT)
}
