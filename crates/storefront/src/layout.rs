//! Shared page chrome: header navigation, account link and cart badge.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::session::{self, AuthSession};
use crate::state::AppState;

/// Link in the header or footer navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub label: String,
    pub href: String,
}

/// Data every full page template renders in `base.html`.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    /// Display name of the logged-in user.
    pub user_name: Option<String>,
    pub cart_count: u32,
    /// CMS pages flagged for the main menu.
    pub menu: Vec<NavLink>,
    /// API base for browser scripts, exposed as a `<meta>` tag.
    pub api_url: String,
    pub stripe_key: Option<String>,
}

impl Layout {
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.user_name.is_some()
    }
}

impl FromRequestParts<AppState> for Layout {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (user_name, cart_count) = match parts.extensions.get::<Session>() {
            Some(session) => {
                let auth = AuthSession::load(session).await;
                (
                    auth.user.map(|u| u.display_name()),
                    session::cart_count(session).await,
                )
            }
            None => (None, 0),
        };

        let menu = match state.backend().get_menu_pages().await {
            Ok(pages) => pages
                .iter()
                .map(|page| NavLink {
                    label: page.label().to_string(),
                    href: page.href(),
                })
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load menu pages");
                Vec::new()
            }
        };

        let config = state.config();
        Ok(Self {
            user_name,
            cart_count,
            menu,
            api_url: config.public_api_url.clone(),
            stripe_key: config.stripe_publishable_key.clone(),
        })
    }
}
