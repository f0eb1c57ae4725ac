//! Media pre-processing ahead of AI analysis.
//!
//! POST /media/preprocess: multipart `file` (+ optional `time` in seconds);
//!                          returns the raster image as base64

use axum::{
    Json, Router,
    extract::{Extension, Multipart, State},
    middleware,
    routing::post,
};
use base64::Engine;
use serde::Serialize;
use std::sync::Arc;
use stockpilot_common::error::{StockpilotError, StockpilotResult};
use stockpilot_media::MediaInput;

use crate::{AppState, middleware::AuthContext, routes::uploads::read_upload_form};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/media/preprocess", post(preprocess))
        .route_layer(middleware::from_fn(crate::middleware::auth_middleware))
}

#[derive(Serialize)]
struct PreprocessResponse {
    /// Base64 of the processed image.
    data: String,
    content_type: String,
    converted: bool,
    /// Seconds into the video the frame was taken from.
    seek_target: Option<f64>,
    width: Option<u32>,
    height: Option<u32>,
}

fn parse_time(raw: Option<&str>, default: f64) -> StockpilotResult<f64> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some(s) => s
            .parse::<f64>()
            .ok()
            .filter(|t| t.is_finite() && *t >= 0.0)
            .ok_or_else(|| StockpilotError::validation(format!("Invalid time '{s}'"))),
    }
}

async fn preprocess(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> StockpilotResult<Json<PreprocessResponse>> {
    let form = read_upload_form(multipart).await?;
    let default_time = stockpilot_common::config::get().media.default_frame_secs;
    let requested = parse_time(form.field("time"), default_time)?;

    let processed = state
        .preprocessor
        .prepare(
            MediaInput {
                filename: &form.filename,
                content_type: form.content_type.as_deref(),
                bytes: &form.bytes,
            },
            requested,
        )
        .await
        .inspect_err(|e| tracing::info!(user_id = %auth.user_id, file = %form.filename, error = %e, "Upload rejected by pre-processor"))?;

    Ok(Json(PreprocessResponse {
        data: base64::engine::general_purpose::STANDARD.encode(&processed.bytes),
        content_type: processed.content_type,
        converted: processed.converted,
        seek_target: processed.seek_secs,
        width: processed.width,
        height: processed.height,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_field_parsing() {
        assert_eq!(parse_time(None, 1.0).unwrap(), 1.0);
        assert_eq!(parse_time(Some(" "), 1.0).unwrap(), 1.0);
        assert_eq!(parse_time(Some("2.5"), 1.0).unwrap(), 2.5);
        assert!(parse_time(Some("-1"), 1.0).is_err());
        assert!(parse_time(Some("soon"), 1.0).is_err());
    }
}
