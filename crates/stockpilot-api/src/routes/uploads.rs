//! File uploads to object storage.
//!
//! POST /uploads: store a file (multipart/form-data) under the caller's
//!                 prefix with an SEO-friendly name, return its public URL

use axum::{
    Json, Router,
    extract::{Extension, Multipart, State},
    http::StatusCode,
    middleware,
    routing::post,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use stockpilot_common::{
    error::{StockpilotError, StockpilotResult},
    text::seo_filename,
};
use uuid::Uuid;

use crate::{AppState, middleware::AuthContext};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/uploads", post(upload_file))
        .route_layer(middleware::from_fn(crate::middleware::auth_middleware))
}

/// Fields of a multipart upload form.
#[derive(Debug, Default)]
pub(crate) struct UploadForm {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    /// Any other text fields, by name.
    pub fields: Vec<(String, String)>,
}

impl UploadForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn extension(&self) -> Option<String> {
        Path::new(&self.filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
    }
}

/// Read a form carrying one `file` part plus optional text fields.
pub(crate) async fn read_upload_form(mut multipart: Multipart) -> StockpilotResult<UploadForm> {
    let max_bytes = stockpilot_common::config::get().limits.max_upload_bytes as usize;
    let mut form = UploadForm::default();
    let mut has_file = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| StockpilotError::validation(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            form.filename = field.file_name().unwrap_or("upload").to_string();
            form.content_type = field.content_type().map(str::to_string);

            let bytes = field
                .bytes()
                .await
                .map_err(|e| StockpilotError::validation(format!("Failed to read file: {e}")))?;
            if bytes.is_empty() {
                return Err(StockpilotError::validation("Uploaded file is empty"));
            }
            if bytes.len() > max_bytes {
                return Err(StockpilotError::validation(format!(
                    "File too large: {} bytes (max {max_bytes} bytes)",
                    bytes.len()
                )));
            }
            form.bytes = bytes.to_vec();
            has_file = true;
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| StockpilotError::validation(format!("Failed to read '{name}': {e}")))?;
            form.fields.push((name, value));
        }
    }

    if !has_file {
        return Err(StockpilotError::validation("Missing 'file' field"));
    }
    Ok(form)
}

#[derive(Serialize)]
struct UploadResponse {
    key: String,
    url: String,
    content_type: String,
    size: usize,
}

/// Object key for an upload: `{user_id}/{uuid}-{seo filename}`.
fn object_key(user_id: Uuid, title: &str, extension: &str) -> String {
    format!("{user_id}/{}-{}", Uuid::new_v4(), seo_filename(title, extension))
}

/// Form fields:
/// - `file` : the binary file (required)
/// - `title`: human title used for the stored filename (optional, defaults
///   to the uploaded file's stem)
async fn upload_file(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> StockpilotResult<(StatusCode, Json<UploadResponse>)> {
    let form = read_upload_form(multipart).await?;

    let stem = Path::new(&form.filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let title = form
        .field("title")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(stem);
    let extension = form.extension().unwrap_or_default();
    let key = object_key(auth.user_id, title, &extension);

    let content_type = form
        .content_type
        .clone()
        .unwrap_or_else(|| "application/octet-stream".into());
    let size = form.bytes.len();

    state
        .storage
        .put_object(&key, form.bytes, &content_type)
        .await?;

    tracing::info!(user_id = %auth.user_id, key = %key, size, "File uploaded");

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            url: state.storage.public_url(&key),
            key,
            content_type,
            size,
        }),
    ))
}
