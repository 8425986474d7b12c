//! Client for the RINOS backend REST API.
//!
//! # Architecture
//!
//! - JSON over HTTP with `reqwest`; one shared connection pool
//! - The backend is the source of truth for catalog, carts, orders and users
//! - Public reads (categories, CMS pages, menu) are cached in memory via
//!   `moka` with a 5 minute TTL
//! - Calls made on behalf of a customer carry their bearer token; a 401 is
//!   reported as [`BackendError::Unauthorized`] so handlers can end the
//!   session
//!
//! # Example
//!
//! ```rust,ignore
//! use rinos_storefront::backend::BackendClient;
//!
//! let client = BackendClient::new(&config.backend)?;
//!
//! let page = client.list_products(1, 20).await?;
//! let cart = client.add_to_cart(&cart_session.session_id, "SM40X", 1, None).await?;
//! ```

mod cache;
mod client;

pub use client::{AuthResponse, BYPASS_HEADER, BackendClient, CartCount, RegisterRequest};

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport failure (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A request URL could not be built.
    #[error("Invalid backend URL: {0}")]
    Url(#[from] url::ParseError),

    /// The bearer token was missing, expired or revoked.
    #[error("Unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success status.
    #[error("Backend returned {status}: {detail}")]
    Status {
        /// HTTP status returned by the backend.
        status: StatusCode,
        /// The backend's `detail` message, or a body excerpt.
        detail: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl BackendError {
    /// Build the error for a non-success response.
    pub(crate) fn from_status(status: StatusCode, body: &str, resource: &str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::NOT_FOUND => Self::NotFound(resource.to_string()),
            _ => Self::Status {
                status,
                detail: extract_detail(body),
            },
        }
    }

    /// Message that is safe to show a customer, for errors caused by their
    /// input (e.g. wrong password, unknown article).
    #[must_use]
    pub fn client_message(&self) -> Option<&str> {
        match self {
            Self::Status { status, detail } if status.is_client_error() && !detail.is_empty() => {
                Some(detail)
            }
            _ => None,
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// The backend answers errors as `{"detail": "..."}`, or for validation
/// failures as `{"detail": [{"msg": "..."}, ...]}`.
fn extract_detail(body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| match value.get("detail")? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Array(items) => items
                .iter()
                .find_map(|item| item.get("msg")?.as_str().map(str::to_string)),
            _ => None,
        });

    detail.unwrap_or_else(|| body.chars().take(200).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            BackendError::from_status(StatusCode::UNAUTHORIZED, "", "orders"),
            BackendError::Unauthorized
        ));
        assert!(matches!(
            BackendError::from_status(StatusCode::NOT_FOUND, "", "page ueber-uns"),
            BackendError::NotFound(ref r) if r == "page ueber-uns"
        ));
        assert!(matches!(
            BackendError::from_status(StatusCode::BAD_GATEWAY, "oops", "x"),
            BackendError::Status { status: StatusCode::BAD_GATEWAY, .. }
        ));
    }

    #[test]
    fn test_extract_detail_string() {
        assert_eq!(
            extract_detail(r#"{"detail": "Incorrect email or password"}"#),
            "Incorrect email or password"
        );
    }

    #[test]
    fn test_extract_detail_validation_list() {
        assert_eq!(
            extract_detail(r#"{"detail": [{"loc": ["body", "email"], "msg": "value is not a valid email address"}]}"#),
            "value is not a valid email address"
        );
    }

    #[test]
    fn test_extract_detail_falls_back_to_body_excerpt() {
        let body = "x".repeat(500);
        assert_eq!(extract_detail(&body).len(), 200);
        assert_eq!(extract_detail("<html>Bad Gateway</html>"), "<html>Bad Gateway</html>");
    }

    #[test]
    fn test_client_message_only_for_client_errors() {
        let err = BackendError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"detail": "Email already registered"}"#,
            "register",
        );
        assert_eq!(err.client_message(), Some("Email already registered"));

        let err = BackendError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "{}", "register");
        assert_eq!(err.client_message(), None);
    }

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::NotFound("product SM40X".to_string());
        assert_eq!(err.to_string(), "Not found: product SM40X");
    }
}
