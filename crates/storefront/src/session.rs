//! Per-visitor session state.
//!
//! Two pieces of state live in the `rinos_session` cookie session:
//!
//! - [`AuthSession`]: the backend access token and the logged-in user
//! - [`CartSession`]: the guest cart id and the last known item count
//!
//! Both are axum extractors, so handlers never touch raw session keys.

use axum::{extract::FromRequestParts, http::request::Parts};
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use tower_sessions::Session;

use rinos_core::User;

use crate::error::AppError;

/// Session keys.
pub mod keys {
    /// Backend bearer token of the logged-in user.
    pub const AUTH_TOKEN: &str = "auth_token";

    /// Cached profile of the logged-in user.
    pub const AUTH_USER: &str = "auth_user";

    /// Guest cart correlation id (`session_<millis>_<base36>`).
    pub const CART_SESSION_ID: &str = "cart_session_id";

    /// Item count shown in the header badge.
    pub const CART_ITEM_COUNT: &str = "cart_item_count";
}

/// Length of the random suffix of a cart session id.
const CART_ID_RANDOM_LEN: usize = 13;

/// Authentication state of the current visitor.
#[derive(Debug, Clone, Default)]
pub struct AuthSession {
    pub user: Option<User>,
    pub token: Option<SecretString>,
}

impl AuthSession {
    /// Both a user and a token are present.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }

    /// Token to forward to the backend, if any.
    #[must_use]
    pub const fn bearer(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    /// Read the auth state from the session. Unreadable values count as absent.
    pub async fn load(session: &Session) -> Self {
        let token = session
            .get::<String>(keys::AUTH_TOKEN)
            .await
            .ok()
            .flatten()
            .map(SecretString::from);
        let user = session.get::<User>(keys::AUTH_USER).await.ok().flatten();
        Self { user, token }
    }
}

impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(match parts.extensions.get::<Session>() {
            Some(session) => Self::load(session).await,
            None => Self::default(),
        })
    }
}

/// Store a fresh login.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn store_auth(
    session: &Session,
    token: &SecretString,
    user: &User,
) -> Result<(), tower_sessions::session::Error> {
    // New privilege level, new session id.
    session.cycle_id().await?;
    session
        .insert(keys::AUTH_TOKEN, token.expose_secret())
        .await?;
    session.insert(keys::AUTH_USER, user).await
}

/// Replace the cached user profile.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn update_user(
    session: &Session,
    user: &User,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::AUTH_USER, user).await
}

/// Forget the token and user. The cart session survives.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_auth(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<String>(keys::AUTH_TOKEN).await?;
    session.remove::<User>(keys::AUTH_USER).await?;
    Ok(())
}

/// Guest cart state of the current visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSession {
    pub session_id: String,
    pub item_count: u32,
}

impl CartSession {
    /// Read the cart state, creating a cart session id on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read or written.
    pub async fn load_or_create(session: &Session) -> Result<Self, tower_sessions::session::Error> {
        let session_id = match session.get::<String>(keys::CART_SESSION_ID).await? {
            Some(id) => id,
            None => {
                let id = generate_cart_session_id();
                session.insert(keys::CART_SESSION_ID, &id).await?;
                tracing::debug!(cart_session_id = %id, "Created cart session");
                id
            }
        };
        let item_count = session
            .get::<u32>(keys::CART_ITEM_COUNT)
            .await?
            .unwrap_or_default();

        Ok(Self {
            session_id,
            item_count,
        })
    }
}

impl<S> FromRequestParts<S> for CartSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;
        Self::load_or_create(session)
            .await
            .map_err(|e| AppError::Internal(format!("cart session: {e}")))
    }
}

/// Remember the cart badge count.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_cart_count(
    session: &Session,
    count: u32,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CART_ITEM_COUNT, count).await
}

/// Cart badge count without creating a cart session.
pub async fn cart_count(session: &Session) -> u32 {
    session
        .get::<u32>(keys::CART_ITEM_COUNT)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// New guest cart id: `session_<unix millis>_<13 base36 chars>`.
#[must_use]
pub fn generate_cart_session_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();

    let mut rng = rand::rng();
    let suffix: String = (0..CART_ID_RANDOM_LEN)
        .filter_map(|_| char::from_digit(rng.random_range(0..36), 36))
        .collect();

    format!("session_{millis}_{suffix}")
}

/// Login URL, optionally returning to `next` afterwards.
#[must_use]
pub fn login_url(next: Option<&str>, expired: bool) -> String {
    let mut params = Vec::new();
    if expired {
        params.push("expired=1".to_string());
    }
    if let Some(next) = next.filter(|n| is_local_path(n)) {
        params.push(format!("next={}", urlencoding::encode(next)));
    }

    if params.is_empty() {
        "/login".to_string()
    } else {
        format!("/login?{}", params.join("&"))
    }
}

/// Only same-site paths are valid redirect targets.
#[must_use]
pub fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn test_session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn test_user() -> User {
        serde_json::from_value(serde_json::json!({
            "user_id": 7,
            "email": "anna@example.de",
            "first_name": "Anna",
        }))
        .unwrap()
    }

    #[test]
    fn test_cart_session_id_format() {
        let id = generate_cart_session_id();
        let mut parts = id.splitn(3, '_');

        assert_eq!(parts.next(), Some("session"));
        let millis = parts.next().unwrap();
        assert!(!millis.is_empty());
        assert!(millis.chars().all(|c| c.is_ascii_digit()));
        let suffix = parts.next().unwrap();
        assert_eq!(suffix.len(), CART_ID_RANDOM_LEN);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        );
    }

    #[test]
    fn test_cart_session_id_uses_current_millis() {
        let before = chrono::Utc::now().timestamp_millis();
        let id = generate_cart_session_id();
        let after = chrono::Utc::now().timestamp_millis();

        let millis: i64 = id.split('_').nth(1).unwrap().parse().unwrap();
        assert!((before..=after).contains(&millis));
    }

    #[test]
    fn test_cart_session_ids_differ() {
        assert_ne!(generate_cart_session_id(), generate_cart_session_id());
    }

    #[tokio::test]
    async fn test_cart_session_is_stable() {
        let session = test_session();
        let first = CartSession::load_or_create(&session).await.unwrap();
        let second = CartSession::load_or_create(&session).await.unwrap();

        assert_eq!(first.session_id, second.session_id);
        assert_eq!(first.item_count, 0);
    }

    #[tokio::test]
    async fn test_cart_count_roundtrip() {
        let session = test_session();
        set_cart_count(&session, 3).await.unwrap();

        assert_eq!(cart_count(&session).await, 3);
        assert_eq!(
            CartSession::load_or_create(&session).await.unwrap().item_count,
            3
        );
    }

    #[tokio::test]
    async fn test_auth_session_lifecycle() {
        let session = test_session();
        assert!(!AuthSession::load(&session).await.is_authenticated());

        store_auth(&session, &SecretString::from("tok-123"), &test_user())
            .await
            .unwrap();
        let auth = AuthSession::load(&session).await;
        assert!(auth.is_authenticated());
        assert_eq!(auth.bearer().unwrap().expose_secret(), "tok-123");
        assert_eq!(auth.user.unwrap().email, "anna@example.de");

        clear_auth(&session).await.unwrap();
        let auth = AuthSession::load(&session).await;
        assert!(auth.user.is_none());
        assert!(auth.token.is_none());
    }

    #[tokio::test]
    async fn test_clear_auth_keeps_cart() {
        let session = test_session();
        let cart = CartSession::load_or_create(&session).await.unwrap();
        store_auth(&session, &SecretString::from("tok"), &test_user())
            .await
            .unwrap();

        clear_auth(&session).await.unwrap();

        assert_eq!(
            CartSession::load_or_create(&session).await.unwrap().session_id,
            cart.session_id
        );
    }

    #[test]
    fn test_login_url() {
        assert_eq!(login_url(None, false), "/login");
        assert_eq!(login_url(None, true), "/login?expired=1");
        assert_eq!(
            login_url(Some("/profil"), false),
            "/login?next=%2Fprofil"
        );
        assert_eq!(
            login_url(Some("/order/5?x=1"), true),
            "/login?expired=1&next=%2Forder%2F5%3Fx%3D1"
        );
    }

    #[test]
    fn test_login_url_drops_foreign_targets() {
        assert_eq!(login_url(Some("https://evil.example"), false), "/login");
        assert_eq!(login_url(Some("//evil.example"), false), "/login");
    }
}
