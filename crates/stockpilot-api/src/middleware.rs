//! Middleware: bearer-token authentication, the service secret guarding
//! scheduled and webhook functions, and the admin role check.

use axum::{extract::Request, http::header, middleware::Next, response::Response};
use stockpilot_common::{auth, error::StockpilotError};
use stockpilot_db::repository::roles;

use crate::AppState;

/// Authentication context extracted from the Authorization header.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: uuid::Uuid,
    pub email: Option<String>,
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Validate the JWT issued by the auth provider and attach an [`AuthContext`].
pub async fn auth_middleware(
    mut request: Request,
    next: Next,
) -> Result<Response, StockpilotError> {
    let token = bearer_token(&request).ok_or(StockpilotError::Unauthorized)?;

    let config = stockpilot_common::config::get();
    let claims = auth::validate_token(token, &config.auth.jwt_secret)
        .map_err(|_| StockpilotError::InvalidToken)?;

    let user_id = claims.user_id().ok_or(StockpilotError::InvalidToken)?;

    request.extensions_mut().insert(AuthContext {
        user_id,
        email: claims.email,
    });

    Ok(next.run(request).await)
}

/// Require `Authorization: Bearer <auth.service_secret>`.
///
/// With no secret configured the functions are open, which is only meant for
/// local development.
pub async fn service_auth_middleware(
    request: Request,
    next: Next,
) -> Result<Response, StockpilotError> {
    let config = stockpilot_common::config::get();
    match config.auth.service_secret.as_deref() {
        Some(expected) => {
            let provided = bearer_token(&request).ok_or(StockpilotError::Unauthorized)?;
            if !auth::secret_matches(provided, expected) {
                tracing::warn!(path = %request.uri().path(), "Rejected function call with wrong service secret");
                return Err(StockpilotError::Unauthorized);
            }
        }
        None => {
            tracing::warn!(path = %request.uri().path(), "No service secret configured, function call not authenticated");
        }
    }
    Ok(next.run(request).await)
}

/// Fail with 403 unless the caller holds the `admin` role.
pub async fn require_admin(state: &AppState, auth: &AuthContext) -> Result<(), StockpilotError> {
    if roles::is_admin(&state.db.pg, auth.user_id).await? {
        Ok(())
    } else {
        Err(StockpilotError::Forbidden)
    }
}
