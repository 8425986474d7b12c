//! Same-origin pass-through to the backend API.
//!
//! Browser-side scripts call `/api/...` on the storefront; the request is
//! forwarded to `{backend}/api/...` with the visitor's bearer token and the
//! deployment bypass secret attached server-side.

use axum::{
    Json,
    body::{Body, Bytes},
    extract::State,
    http::{
        HeaderMap, HeaderValue, Method, StatusCode, Uri,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use secrecy::ExposeSecret;
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::BYPASS_HEADER;
use crate::error::clear_sentry_user;
use crate::session::{AuthSession, clear_auth};
use crate::state::AppState;

/// Content type of non-JSON upstream bodies that carry none.
const FALLBACK_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Backend URL for a proxied request: the path after `/api/` and the query
/// string, both untouched.
#[must_use]
pub fn target_url(api_base: &str, uri: &Uri) -> String {
    let path = uri
        .path()
        .strip_prefix("/api/")
        .or_else(|| uri.path().strip_prefix("/api"))
        .unwrap_or_default();

    match uri.query() {
        Some(query) => format!("{api_base}{path}?{query}"),
        None => format!("{api_base}{path}"),
    }
}

/// Forward a request to the backend.
///
/// JSON answers are re-serialized with the upstream status. Anything else is
/// passed through with the upstream status and content type. A transport
/// failure yields `500 {"error": ..., "type": "proxy_error"}`.
#[instrument(skip(state, session, headers, body), fields(method = %method, path = %uri.path()))]
pub async fn proxy(
    State(state): State<AppState>,
    session: Session,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let backend = state.backend();
    let url = target_url(backend.api_base(), &uri);

    let content_type = headers
        .get(CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));

    let mut request = backend
        .http()
        .request(method, &url)
        .header(CONTENT_TYPE, content_type);

    // An explicit Authorization header wins over the session login.
    let auth = AuthSession::load(&session).await;
    if let Some(authorization) = headers.get(AUTHORIZATION) {
        request = request.header(AUTHORIZATION, authorization.clone());
    } else if let Some(token) = &auth.token {
        request = request.bearer_auth(token.expose_secret());
    }

    if let Some(secret) = backend.bypass_secret() {
        request = request.header(BYPASS_HEADER, secret.expose_secret());
    }

    if !body.is_empty() {
        request = request.body(body);
    }

    let upstream = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, url = %url, "Proxy request failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string(), "type": "proxy_error" })),
            )
                .into_response();
        }
    };

    let status = upstream.status();
    let upstream_type = upstream.headers().get(CONTENT_TYPE).cloned();

    // Any 401 ends the login, whichever token the request carried.
    if status == StatusCode::UNAUTHORIZED && (auth.token.is_some() || auth.user.is_some()) {
        tracing::info!("Backend rejected proxied request, clearing login");
        if let Err(e) = clear_auth(&session).await {
            tracing::error!(error = %e, "Failed to clear expired session");
        }
        clear_sentry_user();
    }

    let bytes = match upstream.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, url = %url, "Failed to read proxied response");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string(), "type": "proxy_error" })),
            )
                .into_response();
        }
    };

    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&bytes) {
        return (status, Json(value)).into_response();
    }

    let content_type =
        upstream_type.unwrap_or_else(|| HeaderValue::from_static(FALLBACK_CONTENT_TYPE));
    let mut response = (status, Body::from(bytes)).into_response();
    response.headers_mut().insert(CONTENT_TYPE, content_type);
    response
}
