#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use http_body_util::BodyExt;
use jsonwebtoken::{EncodingKey, Header};
use stockpilot_api::{AppState, build_router};
use stockpilot_common::auth::Claims;
use stockpilot_common::config::{self, AppConfig};
use stockpilot_db::Database;
use stockpilot_db::storage::StorageClient;
use stockpilot_media::Preprocessor;
use tower::ServiceExt;
use uuid::Uuid;

pub const BOUNDARY: &str = "stockpilot-test-boundary";

/// Build the full application router against a lazily-connected pool, so
/// routes that fail before touching the database can be tested without one.
pub fn build_test_app() -> Router {
    let cfg = config::install(AppConfig::for_tests());
    let db = Database::connect_lazy(&cfg.database.url).unwrap();
    let storage = StorageClient::new(&(&cfg.storage).into()).unwrap();

    build_router(AppState {
        db,
        storage,
        mailer: None,
        preprocessor: Preprocessor::default(),
    })
}

/// A signed access token for `user_id`, as the auth provider would issue it.
pub fn token_for(user_id: Uuid) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        email: Some("contributor@example.com".into()),
        role: Some("authenticated".into()),
        exp: chrono::Utc::now().timestamp() + 3600,
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(AppConfig::for_tests().auth.jwt_secret.as_bytes()),
    )
    .unwrap()
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// A multipart/form-data request with one `file` part.
pub fn multipart_request(
    uri: &str,
    token: &str,
    filename: &str,
    content_type: &str,
    bytes: &[u8],
) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap()
}
