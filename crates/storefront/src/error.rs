//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before a localized error page is rendered; internal
//! details never reach the customer.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::backend::BackendError;
use crate::filters;
use crate::layout::Layout;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend call failed (transport, unexpected status, bad payload).
    #[error("Backend error: {0}")]
    Backend(BackendError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend rejected the customer's token.
    #[error("Session expired")]
    SessionExpired,

    /// Logged in, but not allowed to see this.
    #[error("Forbidden")]
    Forbidden,

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Unauthorized => Self::SessionExpired,
            BackendError::NotFound(resource) => Self::NotFound(resource),
            BackendError::Status { status, .. } if status == reqwest::StatusCode::FORBIDDEN => {
                Self::Forbidden
            }
            other => Self::Backend(other),
        }
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Internal(format!("session: {err}"))
    }
}

/// Response marker telling the session middleware to drop the login.
#[derive(Debug, Clone, Copy)]
pub struct SessionExpired;

/// Generic error page.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub layout: Layout,
    pub status: u16,
    pub title: &'static str,
    pub message: String,
}

/// 404 page.
#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub layout: Layout,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Backend(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::SessionExpired => StatusCode::SEE_OTHER,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Self::Backend(BackendError::Http(_)) => "Server nicht erreichbar",
            Self::Backend(_) | Self::Internal(_) => "Ein Fehler ist aufgetreten",
            Self::BadRequest(_) => "Ungültige Anfrage",
            Self::Forbidden => "Kein Zugriff",
            Self::RateLimited => "Zu viele Anfragen",
            Self::NotFound(_) | Self::SessionExpired => "",
        }
    }

    // Don't expose internal error details to clients
    fn public_message(&self) -> String {
        match self {
            Self::Backend(BackendError::Http(_)) => {
                "Der Server ist momentan nicht erreichbar. Bitte versuchen Sie es in Kürze erneut."
                    .to_string()
            }
            Self::Backend(err) => err.client_message().map_or_else(
                || "Die Daten konnten nicht geladen werden. Bitte versuchen Sie es erneut.".to_string(),
                String::from,
            ),
            Self::BadRequest(msg) => msg.clone(),
            Self::Forbidden => "Für diesen Bereich fehlt Ihrem Konto die Berechtigung.".to_string(),
            Self::RateLimited => {
                "Bitte warten Sie einen Moment, bevor Sie es erneut versuchen.".to_string()
            }
            Self::Internal(_) => {
                "Ein unerwarteter Fehler ist aufgetreten. Bitte versuchen Sie es erneut.".to_string()
            }
            Self::NotFound(_) | Self::SessionExpired => String::new(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Backend(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        match self {
            Self::SessionExpired => {
                tracing::info!("Backend rejected session token");
                let mut response = axum::response::Redirect::to(&crate::session::login_url(None, true))
                    .into_response();
                response.extensions_mut().insert(SessionExpired);
                response
            }
            Self::NotFound(ref resource) => {
                tracing::debug!(resource = %resource, "Not found");
                (
                    StatusCode::NOT_FOUND,
                    NotFoundTemplate {
                        layout: Layout::default(),
                    },
                )
                    .into_response()
            }
            _ => {
                let status = self.status();
                (
                    status,
                    ErrorTemplate {
                        layout: Layout::default(),
                        status: status.as_u16(),
                        title: self.title(),
                        message: self.public_message(),
                    },
                )
                    .into_response()
            }
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context after login.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context on logout or session expiry.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("articlenr", "SM40X")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
