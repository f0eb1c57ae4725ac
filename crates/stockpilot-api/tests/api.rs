//! Router-level tests for paths that resolve before any database access:
//! CORS, authentication, the service secret, request validation and media
//! pre-processing.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use common::{body_json, build_test_app, json_request, multipart_request, send, token_for};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn cors_preflight_is_answered() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/functions/v1/send-contact-email")
        .header(header::ORIGIN, "https://app.example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type,authorization")
        .body(Body::empty())
        .unwrap();

    let response = send(build_test_app(), request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn contact_form_rejects_bad_email() {
    let request = json_request(
        "POST",
        "/functions/v1/send-contact-email",
        None,
        json!({
            "name": "Ada",
            "email": "not-an-email",
            "message": "Hello there, I have a question."
        }),
    );

    let response = send(build_test_app(), request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["code"], 400);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert!(body["message"].as_str().unwrap().contains("valid email"));
}

#[tokio::test]
async fn contact_form_rejects_short_message() {
    let request = json_request(
        "POST",
        "/functions/v1/send-contact-email",
        None,
        json!({ "name": "Ada", "email": "ada@example.com", "message": "hi" }),
    );

    let response = send(build_test_app(), request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn scheduled_functions_require_service_secret() {
    for path in [
        "/functions/v1/cleanup-old-generations",
        "/functions/v1/daily-credit-reset",
        "/functions/v1/purchase-credits",
    ] {
        let missing = json_request("POST", path, None, json!({}));
        let response = send(build_test_app(), missing).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{path}");

        let wrong = json_request("POST", path, Some("not-the-secret"), json!({}));
        let response = send(build_test_app(), wrong).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{path}");
    }
}

#[tokio::test]
async fn purchase_credits_validates_reference() {
    let request = json_request(
        "POST",
        "/functions/v1/purchase-credits",
        Some("service-secret"),
        json!({
            "user_id": Uuid::new_v4(),
            "pack_id": Uuid::new_v4(),
            "payment_reference": ""
        }),
    );
    let response = send(build_test_app(), request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn account_routes_require_token() {
    let request = Request::builder()
        .uri("/api/v1/subscription")
        .body(Body::empty())
        .unwrap();
    let response = send(build_test_app(), request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "UNAUTHORIZED");

    let request = Request::builder()
        .uri("/api/v1/generations")
        .header(header::AUTHORIZATION, "Bearer garbage")
        .body(Body::empty())
        .unwrap();
    let response = send(build_test_app(), request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "INVALID_TOKEN");
}

#[tokio::test]
async fn generation_with_unknown_marketplace_is_rejected() {
    let token = token_for(Uuid::new_v4());
    let request = json_request(
        "POST",
        "/api/v1/generations",
        Some(&token),
        json!({
            "tool": "metadata",
            "file_name": "sunset.jpg",
            "marketplaces": ["adobe-stock", "etsy"]
        }),
    );

    let response = send(build_test_app(), request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(
        body_json(response).await["message"]
            .as_str()
            .unwrap()
            .contains("etsy")
    );
}

#[tokio::test]
async fn admin_content_is_validated_first() {
    let token = token_for(Uuid::new_v4());
    let request = json_request(
        "POST",
        "/api/v1/admin/testimonials",
        Some(&token),
        json!({ "author_name": "Bo", "content": "Great", "rating": 9 }),
    );
    let response = send(build_test_app(), request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tool_options_are_public() {
    let request = Request::builder()
        .uri("/api/v1/tools/options")
        .body(Body::empty())
        .unwrap();
    let response = send(build_test_app(), request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["styles"].as_array().unwrap().len(), 7);
    assert_eq!(body["details"].as_array().unwrap().len(), 3);
    assert!(
        body["marketplaces"]
            .as_array()
            .unwrap()
            .contains(&json!("123rf"))
    );
}

#[tokio::test]
async fn prompt_instruction_rejects_unknown_style() {
    let request = json_request(
        "POST",
        "/api/v1/tools/prompt-instruction",
        None,
        json!({ "style": "oil-painting", "detail": "basic" }),
    );
    let response = send(build_test_app(), request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn eps_upload_is_unsupported_media() {
    let token = token_for(Uuid::new_v4());
    let request = multipart_request(
        "/api/v1/media/preprocess",
        &token,
        "poster.eps",
        "application/postscript",
        b"%!PS-Adobe-3.0 EPSF-3.0",
    );

    let response = send(build_test_app(), request).await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body = body_json(response).await;
    assert_eq!(body["error"], "UNSUPPORTED_MEDIA");
    assert!(body["message"].as_str().unwrap().contains("PNG, JPEG or SVG"));
}

#[tokio::test]
async fn svg_upload_is_rasterized() {
    let token = token_for(Uuid::new_v4());
    let request = multipart_request(
        "/api/v1/media/preprocess",
        &token,
        "badge.svg",
        "image/svg+xml",
        br#"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24"/>"#,
    );

    let response = send(build_test_app(), request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["converted"], true);
    assert_eq!(body["content_type"], "image/png");
    assert_eq!(body["width"], 24);
    assert!(!body["data"].as_str().unwrap().is_empty());
}
