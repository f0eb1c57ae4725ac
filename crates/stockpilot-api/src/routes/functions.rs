//! Function endpoints called by the scheduler, the payment gateway and the
//! public contact form. Each is a stateless POST returning `{message, ...}`.
//!
//! POST /cleanup-old-generations : purge expired generations (service secret)
//! POST /daily-credit-reset      : reset daily plans' balances (service secret)
//! POST /purchase-credits        : settle a confirmed credit-pack payment (service secret)
//! POST /send-contact-email      : forward the contact form to support

use axum::{Json, Router, extract::State, middleware, routing::post};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use stockpilot_common::{
    error::{StockpilotError, StockpilotResult},
    models::PurchaseCreditsRequest,
    validation::{require_non_blank, validate_request},
};
use stockpilot_db::repository::credit_packs::{self, PurchaseOutcome};
use stockpilot_jobs::{CleanupReport, CreditResetReport, cleanup, credit_reset};
use uuid::Uuid;
use validator::Validate;

use crate::{AppState, email::ContactMessage};

pub fn router() -> Router<Arc<AppState>> {
    let scheduled = Router::new()
        .route("/cleanup-old-generations", post(cleanup_old_generations))
        .route("/daily-credit-reset", post(daily_credit_reset))
        .route("/purchase-credits", post(purchase_credits))
        .route_layer(middleware::from_fn(crate::middleware::service_auth_middleware));

    Router::new()
        .merge(scheduled)
        .route("/send-contact-email", post(send_contact_email))
}

#[derive(Serialize)]
struct FunctionResponse<T: Serialize> {
    message: String,
    #[serde(flatten)]
    data: T,
}

// ============================================================
// Scheduled jobs
// ============================================================

async fn cleanup_old_generations(
    State(state): State<Arc<AppState>>,
) -> StockpilotResult<Json<FunctionResponse<CleanupReport>>> {
    let retention_days = stockpilot_common::config::get().jobs.retention_days;
    let report = cleanup::run(
        &state.db,
        &state.storage,
        chrono::Utc::now(),
        chrono::Duration::days(retention_days),
    )
    .await?;

    Ok(Json(FunctionResponse {
        message: report.message(),
        data: report,
    }))
}

async fn daily_credit_reset(
    State(state): State<Arc<AppState>>,
) -> StockpilotResult<Json<FunctionResponse<CreditResetReport>>> {
    let report = credit_reset::run(&state.db).await?;
    Ok(Json(FunctionResponse {
        message: report.message(),
        data: report,
    }))
}

// ============================================================
// Payments
// ============================================================

#[derive(Serialize)]
struct PurchaseResult {
    purchase_id: Option<Uuid>,
    credits_added: i32,
    credits_remaining: Option<i32>,
}

async fn purchase_credits(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PurchaseCreditsRequest>,
) -> StockpilotResult<Json<FunctionResponse<PurchaseResult>>> {
    validate_request(&body)?;
    require_non_blank("payment_reference", &body.payment_reference)?;

    let pack = credit_packs::find_active(&state.db.pg, body.pack_id)
        .await?
        .ok_or_else(|| StockpilotError::not_found("Credit pack"))?;

    let outcome = credit_packs::apply_purchase(
        &state.db.pg,
        body.user_id,
        &pack,
        body.payment_reference.trim(),
    )
    .await?;

    match &outcome {
        PurchaseOutcome::Credited { purchase, .. } => tracing::info!(
            user_id = %purchase.user_id,
            pack = %pack.name,
            credits = purchase.credits,
            purchase_id = %purchase.id,
            "Credits purchased"
        ),
        PurchaseOutcome::AlreadyProcessed => {
            tracing::info!(reference = %body.payment_reference, "Purchase already settled")
        }
        PurchaseOutcome::NoActiveSubscription => {
            tracing::warn!(user_id = %body.user_id, "Purchase for a user without an active subscription")
        }
    }

    purchase_response(outcome).map(Json)
}

fn purchase_response(outcome: PurchaseOutcome) -> StockpilotResult<FunctionResponse<PurchaseResult>> {
    match outcome {
        PurchaseOutcome::Credited {
            purchase,
            credits_remaining,
        } => Ok(FunctionResponse {
            message: format!("Added {} credits", purchase.credits),
            data: PurchaseResult {
                purchase_id: Some(purchase.id),
                credits_added: purchase.credits,
                credits_remaining: Some(credits_remaining),
            },
        }),
        PurchaseOutcome::AlreadyProcessed => Ok(FunctionResponse {
            message: "Purchase already processed".into(),
            data: PurchaseResult {
                purchase_id: None,
                credits_added: 0,
                credits_remaining: None,
            },
        }),
        PurchaseOutcome::NoActiveSubscription => Err(StockpilotError::not_found("Active subscription")),
    }
}

// ============================================================
// Contact form
// ============================================================

#[derive(Debug, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(email(message = "A valid email address is required"))]
    pub email: String,

    #[validate(length(max = 200, message = "Subject must be at most 200 characters"))]
    pub subject: Option<String>,

    #[validate(length(min = 10, max = 5000, message = "Message must be 10-5000 characters"))]
    pub message: String,
}

async fn send_contact_email(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ContactRequest>,
) -> StockpilotResult<Json<serde_json::Value>> {
    validate_request(&body)?;
    require_non_blank("name", &body.name)?;
    require_non_blank("message", &body.message)?;

    let mailer = state.mailer.as_ref().ok_or_else(|| {
        StockpilotError::Internal(anyhow::anyhow!("contact email requested but SMTP is not configured"))
    })?;

    mailer
        .send_contact(&ContactMessage {
            name: body.name.trim(),
            email: body.email.trim(),
            subject: body.subject.as_deref(),
            message: &body.message,
        })
        .await
        .map_err(|e| StockpilotError::Internal(e.into()))?;

    Ok(Json(serde_json::json!({ "message": "Your message has been sent" })))
}
