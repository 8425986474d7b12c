//! CMS administration: access control, page list and the block editor.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use rinos_integration_tests::{TestApp, body_text, location};
use serde_json::{Value, json};
use wiremock::{
    Mock, ResponseTemplate,
    matchers::{body_json, body_partial_json, header, method, path, query_param},
};

fn werkstatt() -> Value {
    json!({
        "page_id": 4,
        "slug": "werkstatt",
        "title": "Werkstatt",
        "is_published": false,
        "updated_at": "2024-10-01T09:30:00",
        "blocks": [
            { "block_id": 10, "block_type": "text", "block_order": 0, "configuration": { "content": "## Inspektion" } },
            { "block_id": 11, "block_type": "spacer", "block_order": 1, "configuration": { "height": "large" } }
        ]
    })
}

async fn mount_werkstatt(app: &TestApp) {
    Mock::given(method("GET"))
        .and(path("/api/pages/4"))
        .and(header("authorization", "Bearer token-admin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(werkstatt()))
        .mount(&app.backend)
        .await;
}

#[tokio::test]
async fn test_anonymous_visitor_is_sent_to_login() {
    let app = TestApp::spawn().await;

    let response = app.get("/admin/pages", None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response).as_deref(),
        Some("/login?next=%2Fadmin%2Fpages")
    );
}

#[tokio::test]
async fn test_customer_without_admin_flag_is_refused() {
    let app = TestApp::spawn().await;
    let cookie = app.log_in().await;
    Mock::given(method("GET"))
        .and(path("/api/pages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "pages": [] })))
        .expect(0)
        .mount(&app.backend)
        .await;

    let response = app.get("/admin/pages", Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(body_text(response).await.contains("Kein Zugriff"));
}

#[tokio::test]
async fn test_admin_sees_page_list() {
    let app = TestApp::spawn().await;
    let cookie = app.log_in_admin().await;
    Mock::given(method("GET"))
        .and(path("/api/pages"))
        .and(header("authorization", "Bearer token-admin"))
        .and(query_param("search", "werk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pages": [werkstatt()],
            "total": 1
        })))
        .mount(&app.backend)
        .await;

    let response = app.get("/admin/pages?search=werk", Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(r#"<a href="/admin/pages/4">Werkstatt</a>"#));
    assert!(html.contains("Entwurf"));
    assert!(html.contains("01.10.2024"));
    assert!(html.contains(r#"value="werk""#));
}

#[tokio::test]
async fn test_backend_refusal_shows_forbidden_page() {
    let app = TestApp::spawn().await;
    let cookie = app.log_in_admin().await;
    Mock::given(method("GET"))
        .and(path("/api/pages"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({ "detail": "Admin access required" })),
        )
        .mount(&app.backend)
        .await;

    let response = app.get("/admin/pages", Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(body_text(response).await.contains("Kein Zugriff"));
}

#[tokio::test]
async fn test_created_page_opens_in_editor() {
    let app = TestApp::spawn().await;
    let cookie = app.log_in_admin().await;
    Mock::given(method("POST"))
        .and(path("/api/pages"))
        .and(body_partial_json(json!({
            "slug": "werkstatt",
            "title": "Werkstatt",
            "show_in_header": true,
            "is_published": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "page": werkstatt()
        })))
        .expect(1)
        .mount(&app.backend)
        .await;

    let response = app
        .post_form("/admin/pages", "title=Werkstatt&show_in_header=on", Some(&cookie))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/admin/pages/4"));
}

#[tokio::test]
async fn test_duplicate_slug_rerenders_list_with_reason() {
    let app = TestApp::spawn().await;
    let cookie = app.log_in_admin().await;
    Mock::given(method("POST"))
        .and(path("/api/pages"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "detail": "A page with this slug already exists"
        })))
        .mount(&app.backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/pages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pages": [werkstatt()],
            "total": 1
        })))
        .mount(&app.backend)
        .await;

    let response = app
        .post_form("/admin/pages", "title=Werkstatt", Some(&cookie))
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_text(response).await;
    assert!(html.contains("A page with this slug already exists"));
    assert!(html.contains(r#"name="title" value="Werkstatt""#));
}

#[tokio::test]
async fn test_editor_lists_blocks_with_preview() {
    let app = TestApp::spawn().await;
    let cookie = app.log_in_admin().await;
    mount_werkstatt(&app).await;

    let response = app.get("/admin/pages/4", Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(r#"id="block-10""#));
    assert!(html.contains(r#"id="block-11""#));
    assert!(html.contains(r#"data-block-id="10""#));
    assert!(html.contains("Veröffentlichen"));
}

#[tokio::test]
async fn test_invalid_block_json_is_rejected() {
    let app = TestApp::spawn().await;
    let cookie = app.log_in_admin().await;
    mount_werkstatt(&app).await;
    Mock::given(method("PUT"))
        .and(path("/api/pages/4/blocks/10"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.backend)
        .await;

    let response = app
        .post_form(
            "/admin/pages/4/blocks/10",
            "configuration=%7Bcontent&is_visible=on",
            Some(&cookie),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_text(response).await;
    assert!(html.contains("Block 10: Ungültiges JSON in der Konfiguration"));
}

#[tokio::test]
async fn test_saved_block_returns_to_its_anchor() {
    let app = TestApp::spawn().await;
    let cookie = app.log_in_admin().await;
    Mock::given(method("PUT"))
        .and(path("/api/pages/4/blocks/10"))
        .and(body_json(json!({
            "is_visible": false,
            "configuration": { "content": "Neu" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
        .expect(1)
        .mount(&app.backend)
        .await;

    let response = app
        .post_form(
            "/admin/pages/4/blocks/10",
            "configuration=%7B%22content%22%3A+%22Neu%22%7D",
            Some(&cookie),
        )
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/admin/pages/4#block-10"));
}

#[tokio::test]
async fn test_moving_block_down_sends_new_order() {
    let app = TestApp::spawn().await;
    let cookie = app.log_in_admin().await;
    mount_werkstatt(&app).await;
    Mock::given(method("POST"))
        .and(path("/api/pages/4/blocks/reorder"))
        .and(body_json(json!({
            "block_orders": [
                { "block_id": 11, "block_order": 0 },
                { "block_id": 10, "block_order": 1 }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
        .expect(1)
        .mount(&app.backend)
        .await;

    let response = app
        .post_form("/admin/pages/4/blocks/10/move", "direction=down", Some(&cookie))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/admin/pages/4#block-10"));
}

#[tokio::test]
async fn test_moving_last_block_down_is_a_no_op() {
    let app = TestApp::spawn().await;
    let cookie = app.log_in_admin().await;
    mount_werkstatt(&app).await;
    Mock::given(method("POST"))
        .and(path("/api/pages/4/blocks/reorder"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.backend)
        .await;

    let response = app
        .post_form("/admin/pages/4/blocks/11/move", "direction=down", Some(&cookie))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}
