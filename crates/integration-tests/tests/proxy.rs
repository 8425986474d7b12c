//! `/api/*` pass-through to the backend.

#![allow(clippy::unwrap_used)]

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use rinos_integration_tests::{TestApp, body_text, location, router_for, session_cookie};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::{
    Mock, ResponseTemplate,
    matchers::{body_json, header as header_matcher, method, path, query_param},
};

#[tokio::test]
async fn test_json_passes_through_with_status() {
    let app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .and(path("/api/search/query"))
        .and(query_param("search", "gravel bike"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "products": [{ "articlenr": "GR-100", "articlename": "Gravel 100" }]
        })))
        .mount(&app.backend)
        .await;

    let response = app
        .get("/api/search/query?search=gravel%20bike", None)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["products"][0]["articlenr"], "GR-100");
}

#[tokio::test]
async fn test_post_body_and_error_status_forwarded() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/api/web-orders/"))
        .and(body_json(json!({ "items": [] })))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({ "detail": "Warenkorb ist leer" })),
        )
        .mount(&app.backend)
        .await;

    let request = Request::post("/api/web-orders/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"items":[]}"#))
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["detail"], "Warenkorb ist leer");
}

#[tokio::test]
async fn test_non_json_keeps_content_type() {
    let app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .and(path("/api/invoices/42.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(b"%PDF-1.7 not json".to_vec()),
        )
        .mount(&app.backend)
        .await;

    let response = app.get("/api/invoices/42.pdf", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(body_text(response).await, "%PDF-1.7 not json");
}

#[tokio::test]
async fn test_explicit_authorization_header_forwarded() {
    let app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header_matcher("authorization", "Bearer client-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user_id": 3 })))
        .mount(&app.backend)
        .await;

    let request = Request::get("/api/auth/me")
        .header(header::AUTHORIZATION, "Bearer client-token")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unreachable_backend_is_proxy_error() {
    // Nothing listens on the discard port.
    let router = router_for("http://127.0.0.1:9");
    let request = Request::get("/api/categories/")
        .header("x-forwarded-for", "203.0.113.7")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["type"], "proxy_error");
    assert!(body["error"].is_string());
}

/// `GET /profil` redirects to a plain login once the login is gone.
async fn assert_logged_out(app: &TestApp, cookie: &str) {
    let response = app.get("/profil", Some(cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/login?next=%2Fprofil"));
}

#[tokio::test]
async fn test_proxied_401_with_session_token_ends_login() {
    let app = TestApp::spawn().await;
    let cookie = app.log_in().await;
    Mock::given(method("GET"))
        .and(path("/api/web-orders/"))
        .and(header_matcher("authorization", "Bearer token-anna"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "Token expired" })))
        .mount(&app.backend)
        .await;

    let response = app.get("/api/web-orders/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let cookie = session_cookie(&response).unwrap_or(cookie);
    assert_logged_out(&app, &cookie).await;
}

#[tokio::test]
async fn test_proxied_401_with_explicit_header_ends_login() {
    let app = TestApp::spawn().await;
    let cookie = app.log_in().await;
    Mock::given(method("GET"))
        .and(path("/api/web-orders/"))
        .and(header_matcher("authorization", "Bearer token-anna"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "Token expired" })))
        .mount(&app.backend)
        .await;

    let request = Request::get("/api/web-orders/")
        .header(header::AUTHORIZATION, "Bearer token-anna")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let cookie = session_cookie(&response).unwrap_or(cookie);
    assert_logged_out(&app, &cookie).await;
}
