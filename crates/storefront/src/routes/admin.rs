//! CMS administration: pages and their blocks.
//!
//! Every handler takes [`RequireAdmin`], so anonymous visitors are sent to
//! the login and customers without the admin flag get a 403 page. The
//! backend checks the flag again on each call.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use rinos_core::page::{move_block as reorder, next_block_order};
use rinos_core::slug::generate_category_slug;
use rinos_core::{
    BlockChanges, BlockDraft, BlockId, MoveDirection, Page, PageBlock, PageDraft, PageId,
};
use secrecy::SecretString;
use serde::Deserialize;
use tracing::instrument;

use crate::backend::BackendError;
use crate::blocks::RenderedBlock;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::layout::Layout;
use crate::middleware::auth::RequireAdmin;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Page list query.
#[derive(Debug, Default, Deserialize)]
pub struct PageListQuery {
    pub search: Option<String>,
}

/// Page metadata form. Checkboxes are only sent when ticked.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageFormInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub meta_title: String,
    #[serde(default)]
    pub meta_description: String,
    #[serde(default)]
    pub menu_label: String,
    #[serde(default)]
    pub menu_position: String,
    pub show_in_header: Option<String>,
    pub is_published: Option<String>,
}

/// New block form.
#[derive(Debug, Deserialize)]
pub struct NewBlockInput {
    pub block_type: String,
}

/// Block edit form.
#[derive(Debug, Deserialize)]
pub struct BlockFormInput {
    #[serde(default)]
    pub configuration: String,
    pub is_visible: Option<String>,
}

/// Block move form.
#[derive(Debug, Deserialize)]
pub struct MoveBlockInput {
    pub direction: MoveDirection,
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl PageFormInput {
    /// Validate into a page draft. An empty slug is derived from the title.
    ///
    /// # Errors
    ///
    /// Returns a German message for a missing title or a non-numeric menu
    /// position.
    pub fn to_draft(&self) -> std::result::Result<PageDraft, String> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err("Titel ist erforderlich".to_string());
        }

        let slug = match self.slug.trim() {
            "" => generate_category_slug(title),
            slug => generate_category_slug(slug),
        };
        if slug.is_empty() {
            return Err("Der Slug darf nicht leer sein".to_string());
        }

        let menu_position = match self.menu_position.trim() {
            "" => None,
            position => Some(
                position
                    .parse::<i32>()
                    .map_err(|_| "Menüposition muss eine ganze Zahl sein".to_string())?,
            ),
        };

        Ok(PageDraft {
            slug,
            title: title.to_string(),
            show_in_header: self.show_in_header.is_some(),
            menu_position,
            menu_label: optional(&self.menu_label),
            meta_title: optional(&self.meta_title),
            meta_description: optional(&self.meta_description),
            is_published: self.is_published.is_some(),
        })
    }
}

impl From<&Page> for PageFormInput {
    fn from(page: &Page) -> Self {
        let checked = |flag: bool| flag.then(|| "on".to_string());
        Self {
            title: page.title.clone(),
            slug: page.slug.clone(),
            meta_title: page.meta_title.clone().unwrap_or_default(),
            meta_description: page.meta_description.clone().unwrap_or_default(),
            menu_label: page.menu_label.clone().unwrap_or_default(),
            menu_position: page.menu_position.map(|p| p.to_string()).unwrap_or_default(),
            show_in_header: checked(page.show_in_header),
            is_published: checked(page.is_published),
        }
    }
}

// =============================================================================
// View Types
// =============================================================================

/// Page list row.
#[derive(Debug, Clone)]
pub struct PageRow {
    pub id: PageId,
    pub title: String,
    pub slug: String,
    pub is_published: bool,
    pub show_in_header: bool,
    pub updated: String,
}

impl From<&Page> for PageRow {
    fn from(page: &Page) -> Self {
        Self {
            id: page.page_id,
            title: page.title.clone(),
            slug: page.slug.clone(),
            is_published: page.is_published,
            show_in_header: page.show_in_header,
            updated: page.updated_date().unwrap_or_default(),
        }
    }
}

impl PageRow {
    #[must_use]
    pub fn href(&self) -> String {
        format!("/p/{}", self.slug)
    }
}

/// Block in the editor list.
#[derive(Debug, Clone)]
pub struct BlockView {
    pub id: BlockId,
    pub block_type: String,
    pub is_visible: bool,
    /// Pretty-printed configuration for the textarea.
    pub configuration: String,
    /// The storefront has a renderer for this type.
    pub renderable: bool,
    pub is_first: bool,
    pub is_last: bool,
}

impl BlockView {
    fn list(state: &AppState, blocks: &[PageBlock]) -> Vec<Self> {
        let last = blocks.len().saturating_sub(1);
        blocks
            .iter()
            .enumerate()
            .map(|(index, block)| Self {
                id: block.block_id,
                block_type: block.block_type.clone(),
                is_visible: block.is_visible,
                configuration: serde_json::to_string_pretty(&block.configuration)
                    .unwrap_or_else(|_| "{}".to_string()),
                renderable: state.blocks().contains(&block.block_type),
                is_first: index == 0,
                is_last: index == last,
            })
            .collect()
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Page list.
#[derive(Template, WebTemplate)]
#[template(path = "admin/pages.html")]
pub struct AdminPagesTemplate {
    pub layout: Layout,
    pub current_path: &'static str,
    pub pages: Vec<PageRow>,
    pub total: u64,
    pub search: String,
    pub form: PageFormInput,
    pub error: Option<String>,
}

/// Page editor.
#[derive(Template, WebTemplate)]
#[template(path = "admin/page_edit.html")]
pub struct AdminPageEditTemplate {
    pub layout: Layout,
    pub current_path: &'static str,
    pub page: PageRow,
    pub form: PageFormInput,
    pub block_list: Vec<BlockView>,
    pub block_types: Vec<String>,
    pub preview: Vec<RenderedBlock>,
    pub error: Option<String>,
}

// =============================================================================
// Helpers
// =============================================================================

const PAGES_PATH: &str = "/admin/pages";

fn editor_path(page_id: PageId) -> String {
    format!("{PAGES_PATH}/{page_id}")
}

/// Message to show the admin for a rejected write, or the error to raise.
fn rejection_message(err: BackendError) -> std::result::Result<String, AppError> {
    match AppError::from(err) {
        AppError::Backend(e) => {
            let message = e.client_message().map(str::to_string);
            match message {
                Some(message) => {
                    tracing::info!(error = %e, "Admin change rejected");
                    Ok(message)
                }
                None => Err(AppError::Backend(e)),
            }
        }
        other => Err(other),
    }
}

/// Re-render the editor with the page as the backend has it.
///
/// `form` replaces the metadata form when the submitted values should be
/// kept.
async fn render_editor(
    state: &AppState,
    layout: Layout,
    token: &SecretString,
    page_id: PageId,
    form: Option<PageFormInput>,
    error: Option<String>,
    status: StatusCode,
) -> Result<Response> {
    let page = state.backend().admin_get_page(page_id, token).await?;
    let template = AdminPageEditTemplate {
        layout,
        current_path: PAGES_PATH,
        form: form.unwrap_or_else(|| PageFormInput::from(&page)),
        block_list: BlockView::list(state, &page.blocks),
        block_types: state
            .blocks()
            .tags()
            .into_iter()
            .map(str::to_string)
            .collect(),
        preview: state.blocks().render_blocks(&page.blocks),
        page: PageRow::from(&page),
        error,
    };
    Ok((status, template).into_response())
}

async fn render_list(
    state: &AppState,
    layout: Layout,
    token: &SecretString,
    search: Option<String>,
    form: PageFormInput,
    error: Option<String>,
    status: StatusCode,
) -> Result<Response> {
    let list = state
        .backend()
        .admin_list_pages(search.as_deref(), token)
        .await?;
    let template = AdminPagesTemplate {
        layout,
        current_path: PAGES_PATH,
        pages: list.pages.iter().map(PageRow::from).collect(),
        total: list.total,
        search: search.unwrap_or_default(),
        form,
        error,
    };
    Ok((status, template).into_response())
}

// =============================================================================
// Page Routes
// =============================================================================

/// `/admin` lands on the page list.
pub async fn index(_admin: RequireAdmin) -> Redirect {
    Redirect::to(PAGES_PATH)
}

/// Page list with search and the new page form.
#[instrument(skip(admin, state, layout), fields(user_id = %admin.user.user_id))]
pub async fn pages(
    admin: RequireAdmin,
    State(state): State<AppState>,
    layout: Layout,
    Query(query): Query<PageListQuery>,
) -> Result<Response> {
    let search = query.search.and_then(|s| optional(&s));
    render_list(
        &state,
        layout,
        &admin.token,
        search,
        PageFormInput::default(),
        None,
        StatusCode::OK,
    )
    .await
}

/// Create a page and open it in the editor.
#[instrument(skip(admin, state, layout, input), fields(user_id = %admin.user.user_id))]
pub async fn create_page(
    admin: RequireAdmin,
    State(state): State<AppState>,
    layout: Layout,
    Form(input): Form<PageFormInput>,
) -> Result<Response> {
    let draft = match input.to_draft() {
        Ok(draft) => draft,
        Err(message) => {
            return render_list(
                &state,
                layout,
                &admin.token,
                None,
                input,
                Some(message),
                StatusCode::UNPROCESSABLE_ENTITY,
            )
            .await;
        }
    };

    match state.backend().admin_create_page(&draft, &admin.token).await {
        Ok(page) => {
            tracing::info!(page_id = %page.page_id, slug = %page.slug, "Page created");
            add_breadcrumb("admin", "Page created", Some(&[("slug", page.slug.as_str())]));
            Ok(Redirect::to(&editor_path(page.page_id)).into_response())
        }
        Err(e) => {
            let message = rejection_message(e)?;
            render_list(
                &state,
                layout,
                &admin.token,
                None,
                input,
                Some(message),
                StatusCode::UNPROCESSABLE_ENTITY,
            )
            .await
        }
    }
}

/// Page editor.
#[instrument(skip(admin, state, layout), fields(user_id = %admin.user.user_id))]
pub async fn edit_page(
    admin: RequireAdmin,
    State(state): State<AppState>,
    layout: Layout,
    Path(page_id): Path<PageId>,
) -> Result<Response> {
    render_editor(&state, layout, &admin.token, page_id, None, None, StatusCode::OK).await
}

/// Save page metadata.
#[instrument(skip(admin, state, layout, input), fields(user_id = %admin.user.user_id))]
pub async fn update_page(
    admin: RequireAdmin,
    State(state): State<AppState>,
    layout: Layout,
    Path(page_id): Path<PageId>,
    Form(input): Form<PageFormInput>,
) -> Result<Response> {
    let result = match input.to_draft() {
        Ok(draft) => state
            .backend()
            .admin_update_page(page_id, &draft, &admin.token)
            .await
            .map_err(rejection_message),
        Err(message) => Err(Ok(message)),
    };

    match result {
        Ok(()) => {
            tracing::info!(page_id = %page_id, "Page updated");
            Ok(Redirect::to(&editor_path(page_id)).into_response())
        }
        Err(Ok(message)) => {
            render_editor(
                &state,
                layout,
                &admin.token,
                page_id,
                Some(input),
                Some(message),
                StatusCode::UNPROCESSABLE_ENTITY,
            )
            .await
        }
        Err(Err(e)) => Err(e),
    }
}

/// Delete a page.
#[instrument(skip(admin, state), fields(user_id = %admin.user.user_id))]
pub async fn delete_page(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Path(page_id): Path<PageId>,
) -> Result<Redirect> {
    state
        .backend()
        .admin_delete_page(page_id, &admin.token)
        .await?;
    tracing::info!(page_id = %page_id, "Page deleted");
    add_breadcrumb("admin", "Page deleted", None);
    Ok(Redirect::to(PAGES_PATH))
}

async fn set_published(
    admin: &RequireAdmin,
    state: &AppState,
    page_id: PageId,
    published: bool,
) -> Result<Redirect> {
    state
        .backend()
        .admin_set_published(page_id, published, &admin.token)
        .await?;
    tracing::info!(page_id = %page_id, published, "Page publishing changed");
    Ok(Redirect::to(&editor_path(page_id)))
}

/// Publish a page.
#[instrument(skip(admin, state), fields(user_id = %admin.user.user_id))]
pub async fn publish_page(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Path(page_id): Path<PageId>,
) -> Result<Redirect> {
    set_published(&admin, &state, page_id, true).await
}

/// Take a page offline.
#[instrument(skip(admin, state), fields(user_id = %admin.user.user_id))]
pub async fn unpublish_page(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Path(page_id): Path<PageId>,
) -> Result<Redirect> {
    set_published(&admin, &state, page_id, false).await
}

// =============================================================================
// Block Routes
// =============================================================================

/// Append a block of a known type with an empty configuration.
#[instrument(skip(admin, state, layout), fields(user_id = %admin.user.user_id))]
pub async fn add_block(
    admin: RequireAdmin,
    State(state): State<AppState>,
    layout: Layout,
    Path(page_id): Path<PageId>,
    Form(input): Form<NewBlockInput>,
) -> Result<Response> {
    let block_type = input.block_type.trim();
    if !state.blocks().contains(block_type) {
        return render_editor(
            &state,
            layout,
            &admin.token,
            page_id,
            None,
            Some(format!("Unbekannter Blocktyp: {block_type}")),
            StatusCode::UNPROCESSABLE_ENTITY,
        )
        .await;
    }

    let page = state.backend().admin_get_page(page_id, &admin.token).await?;
    let draft = BlockDraft {
        block_type: block_type.to_string(),
        block_order: next_block_order(&page.blocks),
        is_visible: true,
        configuration: serde_json::Value::Object(serde_json::Map::new()),
    };

    match state
        .backend()
        .admin_add_block(page_id, &draft, &admin.token)
        .await
    {
        Ok(()) => {
            tracing::info!(page_id = %page_id, block_type = %draft.block_type, "Block added");
            Ok(Redirect::to(&editor_path(page_id)).into_response())
        }
        Err(e) => {
            let message = rejection_message(e)?;
            render_editor(
                &state,
                layout,
                &admin.token,
                page_id,
                None,
                Some(message),
                StatusCode::UNPROCESSABLE_ENTITY,
            )
            .await
        }
    }
}

/// Parse the configuration textarea. Blocks are configured by JSON objects.
fn parse_configuration(raw: &str) -> std::result::Result<serde_json::Value, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(serde_json::Value::Object(serde_json::Map::new()));
    }
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value) if value.is_object() => Ok(value),
        Ok(_) => Err("Die Konfiguration muss ein JSON-Objekt sein".to_string()),
        Err(e) => Err(format!("Ungültiges JSON in der Konfiguration: {e}")),
    }
}

/// Save a block's visibility and configuration.
#[instrument(skip(admin, state, layout, input), fields(user_id = %admin.user.user_id))]
pub async fn update_block(
    admin: RequireAdmin,
    State(state): State<AppState>,
    layout: Layout,
    Path((page_id, block_id)): Path<(PageId, BlockId)>,
    Form(input): Form<BlockFormInput>,
) -> Result<Response> {
    let result = match parse_configuration(&input.configuration) {
        Ok(configuration) => {
            let changes = BlockChanges {
                is_visible: Some(input.is_visible.is_some()),
                configuration: Some(configuration),
            };
            state
                .backend()
                .admin_update_block(page_id, block_id, &changes, &admin.token)
                .await
                .map_err(rejection_message)
        }
        Err(message) => Err(Ok(message)),
    };

    match result {
        Ok(()) => {
            tracing::info!(page_id = %page_id, block_id = %block_id, "Block updated");
            Ok(Redirect::to(&format!("{}#block-{block_id}", editor_path(page_id))).into_response())
        }
        Err(Ok(message)) => {
            render_editor(
                &state,
                layout,
                &admin.token,
                page_id,
                None,
                Some(format!("Block {block_id}: {message}")),
                StatusCode::UNPROCESSABLE_ENTITY,
            )
            .await
        }
        Err(Err(e)) => Err(e),
    }
}

/// Remove a block.
#[instrument(skip(admin, state), fields(user_id = %admin.user.user_id))]
pub async fn delete_block(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Path((page_id, block_id)): Path<(PageId, BlockId)>,
) -> Result<Redirect> {
    state
        .backend()
        .admin_delete_block(page_id, block_id, &admin.token)
        .await?;
    tracing::info!(page_id = %page_id, block_id = %block_id, "Block deleted");
    Ok(Redirect::to(&editor_path(page_id)))
}

/// Move a block one step up or down. Moving past either end is a no-op.
#[instrument(skip(admin, state), fields(user_id = %admin.user.user_id))]
pub async fn move_block(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Path((page_id, block_id)): Path<(PageId, BlockId)>,
    Form(input): Form<MoveBlockInput>,
) -> Result<Redirect> {
    let page = state.backend().admin_get_page(page_id, &admin.token).await?;
    if let Some(orders) = reorder(&page.blocks, block_id, input.direction) {
        state
            .backend()
            .admin_reorder_blocks(page_id, &orders, &admin.token)
            .await?;
        tracing::info!(page_id = %page_id, block_id = %block_id, "Block moved");
    }
    Ok(Redirect::to(&format!("{}#block-{block_id}", editor_path(page_id))))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_draft_derives_slug_from_title() {
        let input = PageFormInput {
            title: " Über uns ".to_string(),
            menu_position: "3".to_string(),
            show_in_header: Some("on".to_string()),
            ..PageFormInput::default()
        };
        let draft = input.to_draft().unwrap();
        assert_eq!(draft.title, "Über uns");
        assert_eq!(draft.slug, "uber-uns");
        assert_eq!(draft.menu_position, Some(3));
        assert!(draft.show_in_header);
        assert!(!draft.is_published);
        assert_eq!(draft.meta_title, None);
    }

    #[test]
    fn test_draft_rejects_missing_title_and_bad_position() {
        assert_eq!(
            PageFormInput::default().to_draft().unwrap_err(),
            "Titel ist erforderlich"
        );
        let input = PageFormInput {
            title: "Werkstatt".to_string(),
            menu_position: "oben".to_string(),
            ..PageFormInput::default()
        };
        assert!(input.to_draft().unwrap_err().starts_with("Menüposition"));
    }

    #[test]
    fn test_form_round_trips_page_flags() {
        let page: Page = serde_json::from_value(json!({
            "page_id": 4, "slug": "werkstatt", "title": "Werkstatt",
            "is_published": true, "menu_position": 2
        }))
        .unwrap();
        let draft = PageFormInput::from(&page).to_draft().unwrap();
        assert_eq!(draft, PageDraft::from(&page));
    }

    #[test]
    fn test_configuration_must_be_an_object() {
        assert_eq!(parse_configuration("  ").unwrap(), json!({}));
        assert_eq!(
            parse_configuration(r#"{"content": "Hallo"}"#).unwrap(),
            json!({ "content": "Hallo" })
        );
        assert!(parse_configuration("[1, 2]").unwrap_err().contains("JSON-Objekt"));
        assert!(parse_configuration("{content").unwrap_err().starts_with("Ungültiges JSON"));
    }

    #[test]
    fn test_rejection_message_keeps_client_errors() {
        let duplicate = BackendError::Status {
            status: reqwest::StatusCode::BAD_REQUEST,
            detail: "A page with this slug already exists".to_string(),
        };
        assert_eq!(
            rejection_message(duplicate).unwrap(),
            "A page with this slug already exists"
        );

        let forbidden = BackendError::Status {
            status: reqwest::StatusCode::FORBIDDEN,
            detail: "Admin access required".to_string(),
        };
        assert!(matches!(rejection_message(forbidden), Err(AppError::Forbidden)));
        assert!(matches!(
            rejection_message(BackendError::Unauthorized),
            Err(AppError::SessionExpired)
        ));
    }
}
