//! Search route handlers.
//!
//! `/suche` renders the full search page. The search box also requests
//! `/suche/results` on every keystroke; only the newest of those requests
//! per visitor renders, older ones answer `204 No Content` so HTMX leaves
//! the current results in place.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rinos_core::ProductPage;
use serde::Deserialize;
use tracing::instrument;

use crate::backend::BackendError;
use crate::error::{AppError, Result};
use crate::filters;
use crate::layout::Layout;
use crate::routes::products::{self, Pagination, ProductCard};
use crate::session::CartSession;
use crate::state::AppState;

/// Shortest query that is sent to the backend.
pub const MIN_QUERY_LEN: usize = 2;

/// Search query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub page: Option<u32>,
}

impl SearchQuery {
    /// Trimmed query, or `None` when it is too short to search.
    #[must_use]
    pub fn term(&self) -> Option<&str> {
        let term = self.q.trim();
        (term.chars().count() >= MIN_QUERY_LEN).then_some(term)
    }

    fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }
}

/// Search results of one query.
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub query: String,
    pub products: Vec<ProductCard>,
    pub total: u64,
    pub pagination: Pagination,
    /// A search ran (the query was long enough).
    pub searched: bool,
}

impl SearchResults {
    fn new(query: &str, page: u32, listing: &ProductPage) -> Self {
        let base = format!("/suche?q={}&", urlencoding::encode(query));
        Self {
            query: query.to_string(),
            products: products::cards(&listing.products),
            total: listing.total,
            pagination: Pagination::new(&base, page, listing.total_pages),
            searched: true,
        }
    }

    /// `1 Produkt gefunden` / `12 Produkte gefunden`.
    #[must_use]
    pub fn summary(&self) -> String {
        let noun = if self.total == 1 { "Produkt" } else { "Produkte" };
        format!("{} {noun} gefunden für „{}“", self.total, self.query)
    }
}

/// Full search page template.
#[derive(Template, WebTemplate)]
#[template(path = "search/page.html")]
pub struct SearchPageTemplate {
    pub layout: Layout,
    pub query: String,
    pub results: SearchResults,
    pub min_length: usize,
}

/// Search results template (HTMX fragment).
#[derive(Template, WebTemplate)]
#[template(path = "partials/search_results.html")]
pub struct SearchResultsTemplate {
    pub results: SearchResults,
    pub error: Option<String>,
}

fn search_failed(err: &BackendError) -> String {
    tracing::warn!(error = %err, "Product search failed");
    "Die Suche ist momentan nicht verfügbar. Bitte versuchen Sie es erneut.".to_string()
}

/// Full search page.
#[instrument(skip(state, layout))]
pub async fn search_page(
    State(state): State<AppState>,
    layout: Layout,
    Query(query): Query<SearchQuery>,
) -> Result<SearchPageTemplate> {
    let results = match query.term() {
        Some(term) => {
            let page = query.page();
            let listing = state.backend().search_products(term, page).await?;
            SearchResults::new(term, page, &listing)
        }
        None => SearchResults::default(),
    };

    Ok(SearchPageTemplate {
        layout,
        query: query.q.trim().to_string(),
        results,
        min_length: MIN_QUERY_LEN,
    })
}

/// Search results fragment (HTMX), latest request per visitor only.
#[instrument(skip(state, cart_session))]
pub async fn results(
    State(state): State<AppState>,
    cart_session: CartSession,
    Query(query): Query<SearchQuery>,
) -> Response {
    let Some(term) = query.term() else {
        return SearchResultsTemplate {
            results: SearchResults::default(),
            error: None,
        }
        .into_response();
    };
    let page = query.page();

    let outcome = state
        .search()
        .run(
            &cart_session.session_id,
            state.backend().search_products(term, page),
        )
        .await;

    match outcome {
        None => {
            tracing::debug!(query = %term, "Search superseded by a newer one");
            StatusCode::NO_CONTENT.into_response()
        }
        Some(Ok(listing)) => SearchResultsTemplate {
            results: SearchResults::new(term, page, &listing),
            error: None,
        }
        .into_response(),
        Some(Err(BackendError::Unauthorized)) => AppError::SessionExpired.into_response(),
        Some(Err(e)) => SearchResultsTemplate {
            results: SearchResults::default(),
            error: Some(search_failed(&e)),
        }
        .into_response(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn query(q: &str) -> SearchQuery {
        SearchQuery {
            q: q.to_string(),
            page: None,
        }
    }

    #[test]
    fn test_short_queries_do_not_search() {
        assert_eq!(query("").term(), None);
        assert_eq!(query(" a ").term(), None);
        assert_eq!(query(" ö").term(), None);
        assert_eq!(query(" odin ").term(), Some("odin"));
    }

    #[test]
    fn test_results_summary() {
        let mut results = SearchResults {
            query: "gravel".to_string(),
            total: 1,
            ..SearchResults::default()
        };
        assert_eq!(results.summary(), "1 Produkt gefunden für „gravel“");
        results.total = 12;
        assert_eq!(results.summary(), "12 Produkte gefunden für „gravel“");
    }

    #[test]
    fn test_results_pagination_keeps_query() {
        let listing = ProductPage {
            total: 45,
            page: 1,
            page_size: 20,
            total_pages: 3,
            products: Vec::new(),
        };
        let results = SearchResults::new("e bike", 1, &listing);
        assert!(results.searched);
        assert_eq!(
            results.pagination.next_href.as_deref(),
            Some("/suche?q=e%20bike&page=2")
        );
    }
}
