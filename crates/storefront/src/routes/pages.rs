//! Static content page route handlers.
//!
//! Serves the markdown legal and service pages (Impressum, AGB,
//! Datenschutz, ...) bundled with the storefront.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, extract::State, routing::get};
use chrono::NaiveDate;

use crate::error::{AppError, Result};
use crate::filters;
use crate::layout::Layout;
use crate::state::AppState;

/// Slugs served at the site root, each backed by `content/pages/<slug>.md`.
pub const CONTENT_PAGES: &[&str] = &[
    "impressum",
    "agb",
    "datenschutz",
    "widerrufsrecht",
    "versand",
    "rueckgabe",
    "zahlungsoptionen",
    "cookies",
    "ueber-uns",
    "kontakt",
    "montageservice",
];

/// Content page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/content.html")]
pub struct ContentPageTemplate {
    pub layout: Layout,
    pub title: String,
    pub description: String,
    pub updated_at: Option<NaiveDate>,
    pub content_html: String,
}

impl ContentPageTemplate {
    /// `Stand: 01.03.2025` line for legal pages.
    #[must_use]
    pub fn updated_label(&self) -> Option<String> {
        self.updated_at
            .map(|date| format!("Stand: {}", date.format("%d.%m.%Y")))
    }
}

/// Serve a content page by slug.
///
/// # Errors
///
/// Returns `NotFound` if no page with that slug was loaded.
pub fn serve_content_page(state: &AppState, layout: Layout, slug: &str) -> Result<ContentPageTemplate> {
    let page = state
        .content()
        .get_page(slug)
        .ok_or_else(|| AppError::NotFound(format!("content page {slug}")))?;

    Ok(ContentPageTemplate {
        layout,
        title: page.meta.title.clone(),
        description: page.meta.description.clone().unwrap_or_default(),
        updated_at: page.meta.updated_at,
        content_html: page.content_html.clone(),
    })
}

/// Create the pages routes router.
pub fn router() -> Router<AppState> {
    CONTENT_PAGES.iter().fold(Router::new(), |router, &slug| {
        router.route(
            &format!("/{slug}"),
            get(move |State(state): State<AppState>, layout: Layout| async move {
                tracing::debug!(slug, "Serving content page");
                serve_content_page(&state, layout, slug)
            }),
        )
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_updated_label_uses_german_date() {
        let page = ContentPageTemplate {
            layout: Layout::default(),
            title: "AGB".to_string(),
            description: String::new(),
            updated_at: NaiveDate::from_ymd_opt(2025, 3, 1),
            content_html: String::new(),
        };
        assert_eq!(page.updated_label().as_deref(), Some("Stand: 01.03.2025"));
    }

    #[test]
    fn test_every_route_has_bundled_content() {
        let dir = std::path::Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/content/pages"));
        for slug in CONTENT_PAGES {
            assert!(dir.join(format!("{slug}.md")).exists(), "missing {slug}.md");
        }
    }
}
