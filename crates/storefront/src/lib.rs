//! RINOS Bikes storefront library.
//!
//! This crate provides the storefront as a library so the router can be
//! driven by integration tests without binding a socket.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod blocks;
pub mod config;
pub mod content;
pub mod error;
pub mod filters;
pub mod layout;
pub mod middleware;
pub mod routes;
pub mod search;
pub mod session;
pub mod state;

use axum::{
    Router,
    extract::State,
    http::{StatusCode, Uri},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::state::AppState;

/// Build the complete storefront router.
///
/// Layers, outermost first: trace, request id, security headers, session,
/// session expiry. The login/registration POSTs and the `/api` proxy carry
/// their own rate limits.
pub fn build_router(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());
    let static_dir = state.config().static_dir.clone();

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .merge(routes::auth_form_routes().layer(middleware::auth_rate_limiter()))
        .merge(routes::proxy_routes().layer(middleware::api_rate_limiter()))
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(not_found)
        .layer(from_fn(middleware::session_expiry_middleware))
        .layer(session_layer)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::security_headers_middleware,
        ))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Render the 404 page for unmatched routes.
async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the backend API is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.backend().health_check().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Backend not ready");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
