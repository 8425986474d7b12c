//! CMS page route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use rinos_core::Page;
use tracing::instrument;

use crate::blocks::RenderedBlock;
use crate::error::Result;
use crate::filters;
use crate::layout::Layout;
use crate::state::AppState;

/// CMS page template.
#[derive(Template, WebTemplate)]
#[template(path = "cms/page.html")]
pub struct CmsPageTemplate {
    pub layout: Layout,
    pub title: String,
    pub description: String,
    pub blocks: Vec<RenderedBlock>,
}

impl CmsPageTemplate {
    /// Render a page's blocks.
    #[must_use]
    pub fn new(state: &AppState, layout: Layout, page: &Page) -> Self {
        Self {
            layout,
            title: page.document_title().to_string(),
            description: page.meta_description.clone().unwrap_or_default(),
            blocks: state.blocks().render_blocks(&page.blocks),
        }
    }
}

/// Display a published CMS page.
#[instrument(skip(state, layout))]
pub async fn show(
    State(state): State<AppState>,
    layout: Layout,
    Path(slug): Path<String>,
) -> Result<CmsPageTemplate> {
    let page = state.backend().get_public_page(&slug).await?;
    Ok(CmsPageTemplate::new(&state, layout, &page))
}
