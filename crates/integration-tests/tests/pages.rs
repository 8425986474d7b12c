//! Content pages, CMS pages and legacy URLs.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use rinos_integration_tests::{TestApp, body_text, location};
use serde_json::json;
use wiremock::{
    Mock, ResponseTemplate,
    matchers::{method, path},
};

#[tokio::test]
async fn test_markdown_content_page() {
    let app = TestApp::spawn().await;

    let response = app.get("/impressum", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("<title>Impressum | RINOS Bikes</title>"));
    assert!(html.contains("Stand: 01.10.2024"));
    assert!(html.contains(r#"<meta name="rinos-api-url" content="/api">"#));
    assert!(!html.contains("stripe-publishable-key"));
}

#[tokio::test]
async fn test_cms_page_renders_blocks_in_order() {
    let app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .and(path("/api/pages/public/werkstatt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page_id": 4,
            "slug": "werkstatt",
            "title": "Werkstatt",
            "meta_description": "Service und Reparatur",
            "blocks": [
                { "block_id": 12, "block_type": "text", "configuration": { "content": "## Inspektion" } },
                { "block_id": 11, "block_type": "hologram", "configuration": {} },
                { "block_id": 10, "block_type": "text", "is_visible": false, "configuration": { "content": "Versteckt" } },
                { "block_id": 9, "block_type": "spacer", "configuration": { "height": "large" } }
            ]
        })))
        .mount(&app.backend)
        .await;

    let response = app.get("/p/werkstatt", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("<title>Werkstatt | RINOS Bikes</title>"));
    let text = html.find(r#"data-block-id="12""#).unwrap();
    let spacer = html.find(r#"data-block-id="9""#).unwrap();
    assert!(text < spacer);
    assert!(html.contains("Inspektion"));
    assert!(!html.contains(r#"data-block-id="11""#));
    assert!(!html.contains("Versteckt"));
}

#[tokio::test]
async fn test_cms_page_without_blocks_renders() {
    let app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .and(path("/api/pages/public/leer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page_id": 5,
            "slug": "leer",
            "title": "Leere Seite",
            "blocks": []
        })))
        .mount(&app.backend)
        .await;

    let response = app.get("/p/leer", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("<title>Leere Seite | RINOS Bikes</title>"));
    assert!(!html.contains("data-block-id"));
}

#[tokio::test]
async fn test_unknown_cms_page_is_not_found() {
    let app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .and(path("/api/pages/public/gibt-es-nicht"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "Page not found" })))
        .mount(&app.backend)
        .await;

    let response = app.get("/p/gibt-es-nicht", None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("Seite nicht gefunden"));
}

#[tokio::test]
async fn test_legacy_urls_redirect_permanently() {
    let app = TestApp::spawn().await;

    let response = app.get("/anmelden", None).await;
    assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
    assert_eq!(location(&response).as_deref(), Some("/login"));

    let response = app.get("/products", None).await;
    assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
    assert_eq!(location(&response).as_deref(), Some("/produkte"));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::spawn().await;

    let response = app.get("/gibt-es-nicht", None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
