//! Liveness and readiness endpoints.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use rinos_integration_tests::{TestApp, body_text};
use wiremock::{
    Mock, ResponseTemplate,
    matchers::{method, path},
};

#[tokio::test]
async fn test_health_is_ok_without_backend() {
    let app = TestApp::spawn().await;

    let response = app.get("/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_ready_when_backend_healthy() {
    let app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&app.backend)
        .await;

    let response = app.get("/health/ready", None).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_not_ready_when_backend_failing() {
    let app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.backend)
        .await;

    let response = app.get("/health/ready", None).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let app = TestApp::spawn().await;

    let response = app.get("/health", None).await;
    let headers = response.headers();

    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert!(headers.contains_key("content-security-policy"));
    assert!(headers.contains_key("x-request-id"));
}
