//! Authentication extractors and session expiry handling.
//!
//! The backend is the only authority on tokens. Whenever it answers a
//! customer request with 401, the handler surfaces `AppError::SessionExpired`
//! and [`session_expiry_middleware`] wipes the login from the session.

use axum::{
    extract::{FromRequestParts, OriginalUri, Request},
    http::{HeaderValue, StatusCode, header::LOCATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use tower_sessions::Session;

use rinos_core::User;

use crate::error::{AppError, SessionExpired, clear_sentry_user};
use crate::session::{AuthSession, clear_auth, login_url};

/// HTMX header asking the client to perform a full-page redirect.
const HX_REDIRECT: &str = "hx-redirect";

/// Extractor that requires a logged-in customer.
///
/// Anonymous visitors are redirected to `/login?next=<current path>`.
///
/// # Example
///
/// ```rust,ignore
/// async fn profile(RequireAuth { user, token }: RequireAuth) -> impl IntoResponse {
///     format!("Hallo {}!", user.display_name())
/// }
/// ```
pub struct RequireAuth {
    pub user: User,
    pub token: SecretString,
}

/// Extractor that requires a logged-in user with the admin flag.
///
/// Anonymous visitors go to the login page like with [`RequireAuth`];
/// customers without the flag get a 403 page.
pub struct RequireAdmin {
    pub user: User,
    pub token: SecretString,
}

/// Rejection for [`RequireAuth`] and [`RequireAdmin`].
pub enum AuthRejection {
    /// Redirect to the login page (HTML requests).
    RedirectToLogin(String),
    /// Unauthorized response (API requests).
    Unauthorized,
    /// Logged in, but not an admin.
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(target) => Redirect::to(&target).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => AppError::Forbidden.into_response(),
        }
    }
}

/// User and token of the current login, or the matching rejection.
async fn current_login(parts: &Parts) -> Result<(User, SecretString), AuthRejection> {
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AuthRejection::Unauthorized)?;

    match AuthSession::load(session).await {
        AuthSession {
            user: Some(user),
            token: Some(token),
        } => Ok((user, token)),
        _ => {
            // Nested routers see a stripped URI.
            let uri = parts
                .extensions
                .get::<OriginalUri>()
                .map_or(&parts.uri, |original| &original.0);
            if uri.path().starts_with("/api/") {
                Err(AuthRejection::Unauthorized)
            } else {
                let next = uri
                    .path_and_query()
                    .map_or_else(|| uri.path(), |pq| pq.as_str());
                Err(AuthRejection::RedirectToLogin(login_url(Some(next), false)))
            }
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let (user, token) = current_login(parts).await?;
        Ok(Self { user, token })
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let (user, token) = current_login(parts).await?;
        if !user.is_admin {
            tracing::warn!(user_id = %user.user_id, path = %parts.uri.path(), "Admin area refused");
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self { user, token })
    }
}

/// Clear the login when a handler reports an expired session.
///
/// Rewrites the redirect to carry the original page as `next` for GET
/// requests. HTMX fragment requests get an `HX-Redirect` instead so the
/// whole page navigates.
pub async fn session_expiry_middleware(session: Session, request: Request, next: Next) -> Response {
    let is_get = request.method() == axum::http::Method::GET;
    let is_htmx = request.headers().contains_key("hx-request");
    let origin = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string());

    let mut response = next.run(request).await;

    if response.extensions().get::<SessionExpired>().is_none() {
        return response;
    }

    if let Err(e) = clear_auth(&session).await {
        tracing::error!(error = %e, "Failed to clear expired session");
    }
    clear_sentry_user();

    let return_to = if is_get && !is_htmx {
        origin.as_deref()
    } else {
        None
    };
    let Ok(location) = HeaderValue::from_str(&login_url(return_to, true)) else {
        return response;
    };

    // XHR follows a 303 silently, so HTMX gets a 200 carrying the target.
    if is_htmx {
        let mut htmx = StatusCode::OK.into_response();
        htmx.headers_mut().insert(HX_REDIRECT, location);
        return htmx;
    }

    response.headers_mut().insert(LOCATION, location);
    response
}
