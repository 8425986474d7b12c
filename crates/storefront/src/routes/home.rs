//! Home page route handler.
//!
//! The home page is the CMS page `home` when one is published. Without it
//! (or when the CMS is unreachable) a default home with featured products
//! and the top-level categories is shown.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use crate::backend::BackendError;
use crate::filters;
use crate::layout::Layout;
use crate::routes::categories::CategoryLink;
use crate::routes::cms::CmsPageTemplate;
use crate::routes::products::{self, ProductCard};
use crate::state::AppState;

/// Slug of the CMS page used as home page.
pub const HOME_SLUG: &str = "home";

/// Number of products on the default home page.
const FEATURED_COUNT: u32 = 8;

/// Default home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub products: Vec<ProductCard>,
    pub categories: Vec<CategoryLink>,
}

/// Display the home page.
#[instrument(skip(state, layout))]
pub async fn home(State(state): State<AppState>, layout: Layout) -> Response {
    match state.backend().get_public_page(HOME_SLUG).await {
        Ok(page) => {
            let template = CmsPageTemplate::new(&state, layout, &page);
            if !template.blocks.is_empty() {
                return template.into_response();
            }
            tracing::debug!("CMS home page has no renderable blocks");
            default_home(&state, template.layout).await.into_response()
        }
        Err(BackendError::NotFound(_)) => default_home(&state, layout).await.into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load CMS home page");
            default_home(&state, layout).await.into_response()
        }
    }
}

/// Featured products and categories. Failures leave their section empty.
async fn default_home(state: &AppState, layout: Layout) -> HomeTemplate {
    let products = match state.backend().list_products(1, FEATURED_COUNT).await {
        Ok(page) => products::cards(&page.products),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load featured products");
            Vec::new()
        }
    };

    let categories = match state.backend().category_tree().await {
        Ok(tree) => tree
            .top_level()
            .map(|(_, node)| CategoryLink::from(&node.category))
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load categories");
            Vec::new()
        }
    };

    HomeTemplate {
        layout,
        products,
        categories,
    }
}
