//! CMS pages assembled from ordered content blocks.

use serde::{Deserialize, Serialize};

use crate::account::format_backend_date;
use crate::catalog::null_as_default;
use crate::types::{BlockId, PageId};

/// A CMS page.
///
/// The public endpoint only returns published pages; the admin endpoints
/// also fill in the publishing and menu fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub page_id: PageId,
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_published: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub show_in_header: bool,
    #[serde(default)]
    pub menu_position: Option<i32>,
    #[serde(default)]
    pub menu_label: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Render order is the order of this list, not `block_order`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub blocks: Vec<PageBlock>,
}

impl Page {
    /// `<title>` text: the explicit meta title, else the page title.
    #[must_use]
    pub fn document_title(&self) -> &str {
        self.meta_title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&self.title)
    }

    /// Last change as `dd.mm.yyyy`.
    #[must_use]
    pub fn updated_date(&self) -> Option<String> {
        self.updated_at.as_deref().and_then(format_backend_date)
    }
}

/// One content block of a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageBlock {
    pub block_id: BlockId,
    #[serde(default)]
    pub page_id: Option<PageId>,
    /// Block type tag, e.g. `hero` or `faq`.
    pub block_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub block_order: i32,
    #[serde(default = "visible_by_default")]
    pub is_visible: bool,
    /// Type-specific payload, decoded by the block renderer.
    #[serde(default)]
    pub configuration: serde_json::Value,
}

const fn visible_by_default() -> bool {
    true
}

/// Navigation entry for a page that opted into the header menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuPage {
    pub page_id: PageId,
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub menu_label: Option<String>,
    #[serde(default)]
    pub menu_position: Option<i32>,
}

impl MenuPage {
    #[must_use]
    pub fn label(&self) -> &str {
        self.menu_label
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(&self.title)
    }

    #[must_use]
    pub fn href(&self) -> String {
        format!("/p/{}", self.slug)
    }
}

/// One page of the admin page list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PageList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub pages: Vec<Page>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total: u64,
}

/// Page metadata for create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageDraft {
    pub slug: String,
    pub title: String,
    pub show_in_header: bool,
    pub menu_position: Option<i32>,
    pub menu_label: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub is_published: bool,
}

impl From<&Page> for PageDraft {
    fn from(page: &Page) -> Self {
        Self {
            slug: page.slug.clone(),
            title: page.title.clone(),
            show_in_header: page.show_in_header,
            menu_position: page.menu_position,
            menu_label: page.menu_label.clone(),
            meta_title: page.meta_title.clone(),
            meta_description: page.meta_description.clone(),
            is_published: page.is_published,
        }
    }
}

/// New block appended to a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockDraft {
    pub block_type: String,
    pub block_order: i32,
    pub is_visible: bool,
    pub configuration: serde_json::Value,
}

/// Partial block update. Absent fields stay untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BlockChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<serde_json::Value>,
}

/// Position of one block in a reorder request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockOrder {
    pub block_id: BlockId,
    pub block_order: i32,
}

/// Direction to move a block in the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

/// Order for the next block appended to `blocks`.
#[must_use]
pub fn next_block_order(blocks: &[PageBlock]) -> i32 {
    blocks
        .iter()
        .map(|b| b.block_order)
        .max()
        .map_or(0, |max| max.saturating_add(1))
}

/// New block positions after moving `block_id` one step.
///
/// Positions are renumbered from zero in list order. Returns `None` when the
/// block is unknown or already at that end.
#[must_use]
pub fn move_block(
    blocks: &[PageBlock],
    block_id: BlockId,
    direction: MoveDirection,
) -> Option<Vec<BlockOrder>> {
    let index = blocks.iter().position(|b| b.block_id == block_id)?;
    let target = match direction {
        MoveDirection::Up => index.checked_sub(1)?,
        MoveDirection::Down => Some(index + 1).filter(|t| *t < blocks.len())?,
    };

    let mut ids: Vec<BlockId> = blocks.iter().map(|b| b.block_id).collect();
    ids.swap(index, target);
    Some(
        ids.into_iter()
            .zip(0..)
            .map(|(block_id, block_order)| BlockOrder {
                block_id,
                block_order,
            })
            .collect(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blocks_keep_payload_order() {
        let page: Page = serde_json::from_value(json!({
            "page_id": 1,
            "slug": "ueber-rinos",
            "title": "Über RINOS",
            "blocks": [
                { "block_id": 9, "block_type": "text", "block_order": 2, "configuration": {} },
                { "block_id": 3, "block_type": "hero", "block_order": 1, "configuration": {} }
            ]
        }))
        .unwrap();

        let ids: Vec<i64> = page.blocks.iter().map(|b| b.block_id.as_i64()).collect();
        assert_eq!(ids, vec![9, 3]);
        assert!(page.blocks.iter().all(|b| b.is_visible));
    }

    #[test]
    fn test_document_title_prefers_meta_title() {
        let mut page: Page = serde_json::from_value(json!({
            "page_id": 1, "slug": "s", "title": "Titel", "meta_title": "  "
        }))
        .unwrap();
        assert_eq!(page.document_title(), "Titel");
        page.meta_title = Some("SEO Titel".to_string());
        assert_eq!(page.document_title(), "SEO Titel");
    }

    #[test]
    fn test_menu_label_falls_back_to_title() {
        let entry: MenuPage = serde_json::from_value(json!({
            "page_id": 2, "slug": "sponsoring", "title": "Sponsoring", "menu_label": null
        }))
        .unwrap();
        assert_eq!(entry.label(), "Sponsoring");
        assert_eq!(entry.href(), "/p/sponsoring");
    }

    fn blocks(ids: &[i64]) -> Vec<PageBlock> {
        ids.iter()
            .zip(0..)
            .map(|(id, order)| {
                serde_json::from_value(json!({
                    "block_id": id, "block_type": "text", "block_order": order * 10
                }))
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_admin_fields_default_when_absent() {
        let page: Page = serde_json::from_value(json!({
            "page_id": 3, "slug": "s", "title": "T", "is_published": null,
            "updated_at": "2024-10-01T09:30:00"
        }))
        .unwrap();
        assert!(!page.is_published);
        assert!(!page.show_in_header);
        assert_eq!(page.updated_date().as_deref(), Some("01.10.2024"));
        assert_eq!(PageDraft::from(&page).slug, "s");
    }

    #[test]
    fn test_next_block_order() {
        assert_eq!(next_block_order(&[]), 0);
        assert_eq!(next_block_order(&blocks(&[4, 5, 6])), 21);
    }

    #[test]
    fn test_move_block_renumbers() {
        let list = blocks(&[4, 5, 6]);
        let moved = move_block(&list, BlockId::new(6), MoveDirection::Up).unwrap();
        let ids: Vec<(i64, i32)> = moved
            .iter()
            .map(|o| (o.block_id.as_i64(), o.block_order))
            .collect();
        assert_eq!(ids, vec![(4, 0), (6, 1), (5, 2)]);
    }

    #[test]
    fn test_move_block_stops_at_the_ends() {
        let list = blocks(&[4, 5]);
        assert!(move_block(&list, BlockId::new(4), MoveDirection::Up).is_none());
        assert!(move_block(&list, BlockId::new(5), MoveDirection::Down).is_none());
        assert!(move_block(&list, BlockId::new(9), MoveDirection::Down).is_none());
    }

    #[test]
    fn test_block_changes_skip_absent_fields() {
        let changes = BlockChanges {
            is_visible: Some(false),
            ..BlockChanges::default()
        };
        assert_eq!(serde_json::to_value(&changes).unwrap(), json!({ "is_visible": false }));
    }
}
