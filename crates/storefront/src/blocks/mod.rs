//! CMS block rendering.
//!
//! A page is a list of blocks, each a type tag plus a JSON configuration.
//! [`BlockRegistry`] maps tags to renderers that decode the configuration
//! into a typed struct and render its template. Blocks render independently:
//! one malformed block is logged and left out, the rest of the page still
//! renders.

pub mod content;
pub mod scroll;
pub mod style;
pub mod video;

use std::collections::HashMap;

use askama::Template;
use rinos_core::{BlockId, PageBlock};
use serde::de::DeserializeOwned;
use serde_json::Value;

use self::content::{
    ComparisonTableBlock, CtaBlock, CustomHtmlBlock, DividerBlock, FaqBlock, FeatureGridBlock,
    HeroBlock, ImageGalleryBlock, ProductShowcaseBlock, SpacerBlock, TextBlock, VideoBlock,
};
use self::scroll::{
    HorizontalGalleryScrollBlock, PinnedScrollSectionBlock, ScrollParallaxSectionBlock,
    ScrollRevealImageBlock, ScrollTimelineBlock,
};

/// Why a single block could not be rendered.
#[derive(Debug, thiserror::Error)]
pub enum BlockError {
    #[error("invalid block configuration: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("template error: {0}")]
    Render(#[from] askama::Error),
}

/// Renders one block configuration to HTML.
pub type BlockRenderer = fn(&Value) -> Result<String, BlockError>;

/// Decode `config` into `T` and render it.
///
/// A `null` configuration is treated as an empty object so blocks with only
/// defaults still render.
pub fn render_template<T>(config: &Value) -> Result<String, BlockError>
where
    T: DeserializeOwned + Template,
{
    let block: T = if config.is_null() {
        serde_json::from_value(Value::Object(serde_json::Map::new()))?
    } else {
        T::deserialize(config)?
    };
    Ok(block.render()?)
}

/// A block that rendered successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBlock {
    pub block_id: BlockId,
    pub block_type: String,
    pub html: String,
}

/// Tag to renderer map.
#[derive(Clone)]
pub struct BlockRegistry {
    renderers: HashMap<String, BlockRenderer>,
}

impl std::fmt::Debug for BlockRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}

impl Default for BlockRegistry {
    /// Registry with every built-in block type.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("hero", render_template::<HeroBlock>);
        registry.register("text", render_template::<TextBlock>);
        registry.register("feature_grid", render_template::<FeatureGridBlock>);
        registry.register("cta", render_template::<CtaBlock>);
        registry.register("faq", render_template::<FaqBlock>);
        registry.register("video", render_template::<VideoBlock>);
        registry.register("product_showcase", render_template::<ProductShowcaseBlock>);
        registry.register("featured_products", render_template::<ProductShowcaseBlock>);
        registry.register("image_gallery", render_template::<ImageGalleryBlock>);
        registry.register("spacer", render_template::<SpacerBlock>);
        registry.register("divider", render_template::<DividerBlock>);
        registry.register("custom_html", render_template::<CustomHtmlBlock>);
        registry.register("comparison_table", render_template::<ComparisonTableBlock>);
        registry.register("scroll_reveal_image", render_template::<ScrollRevealImageBlock>);
        registry.register(
            "scroll_parallax_section",
            render_template::<ScrollParallaxSectionBlock>,
        );
        registry.register(
            "pinned_scroll_section",
            render_template::<PinnedScrollSectionBlock>,
        );
        registry.register(
            "horizontal_gallery_scroll",
            render_template::<HorizontalGalleryScrollBlock>,
        );
        registry.register("scroll_timeline", render_template::<ScrollTimelineBlock>);
        registry
    }
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().to_ascii_lowercase().replace('-', "_")
}

impl BlockRegistry {
    /// Registry without any renderers.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            renderers: HashMap::new(),
        }
    }

    /// Register a renderer for `tag`.
    ///
    /// Returns `false` and leaves the registry unchanged when the tag is
    /// already taken.
    pub fn register(&mut self, tag: &str, renderer: BlockRenderer) -> bool {
        let tag = normalize_tag(tag);
        if self.renderers.contains_key(&tag) {
            return false;
        }
        self.renderers.insert(tag, renderer);
        true
    }

    /// Registered tags, sorted. The admin offers these when adding a block.
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.renderers.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.renderers.contains_key(&normalize_tag(tag))
    }

    /// Render `blocks` in the order given.
    ///
    /// Hidden blocks and unknown tags are skipped. A block whose
    /// configuration fails to decode or render is logged and skipped, as is
    /// one that renders to whitespace only.
    #[must_use]
    pub fn render_blocks(&self, blocks: &[PageBlock]) -> Vec<RenderedBlock> {
        blocks
            .iter()
            .filter(|block| block.is_visible)
            .filter_map(|block| self.render_block(block))
            .collect()
    }

    fn render_block(&self, block: &PageBlock) -> Option<RenderedBlock> {
        let tag = normalize_tag(&block.block_type);
        let Some(renderer) = self.renderers.get(&tag) else {
            tracing::debug!(
                block_id = %block.block_id,
                block_type = %block.block_type,
                "Skipping block with unknown type"
            );
            return None;
        };

        match renderer(&block.configuration) {
            Ok(html) if html.trim().is_empty() => None,
            Ok(html) => Some(RenderedBlock {
                block_id: block.block_id,
                block_type: tag,
                html,
            }),
            Err(e) => {
                tracing::warn!(
                    block_id = %block.block_id,
                    block_type = %block.block_type,
                    error = %e,
                    "Failed to render block"
                );
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn block(id: i64, block_type: &str, configuration: Value) -> PageBlock {
        serde_json::from_value(json!({
            "block_id": id,
            "block_type": block_type,
            "configuration": configuration,
        }))
        .unwrap()
    }

    fn ids(rendered: &[RenderedBlock]) -> Vec<i64> {
        rendered.iter().map(|b| b.block_id.as_i64()).collect()
    }

    #[test]
    fn test_default_registry_knows_all_builtin_tags() {
        let registry = BlockRegistry::default();
        for tag in [
            "hero",
            "text",
            "feature_grid",
            "cta",
            "faq",
            "video",
            "product_showcase",
            "image_gallery",
            "spacer",
            "divider",
            "custom_html",
            "comparison_table",
            "scroll_reveal_image",
            "scroll_parallax_section",
            "pinned_scroll_section",
            "horizontal_gallery_scroll",
            "scroll_timeline",
        ] {
            assert!(registry.contains(tag), "missing {tag}");
        }
        assert!(registry.contains("scroll-reveal-image"));
        assert!(!registry.contains("newsletter"));
    }

    #[test]
    fn test_tags_are_sorted() {
        let mut registry = BlockRegistry::empty();
        registry.register("text", render_template::<TextBlock>);
        registry.register("Hero", render_template::<HeroBlock>);
        assert_eq!(registry.tags(), vec!["hero", "text"]);
    }

    #[test]
    fn test_empty_page_renders_nothing() {
        assert!(BlockRegistry::default().render_blocks(&[]).is_empty());
    }

    #[test]
    fn test_renders_in_input_order() {
        let registry = BlockRegistry::default();
        let mut blocks = vec![
            block(7, "text", json!({ "content": "zweiter" })),
            block(3, "hero", json!({ "title": "erster" })),
        ];
        blocks[0].block_order = 2;
        blocks[1].block_order = 1;

        let rendered = registry.render_blocks(&blocks);
        assert_eq!(ids(&rendered), vec![7, 3]);
        assert!(rendered[0].html.contains("zweiter"));
        assert_eq!(rendered[1].block_type, "hero");
    }

    #[test]
    fn test_skips_hidden_and_unknown_blocks() {
        let registry = BlockRegistry::default();
        let mut hidden = block(1, "hero", json!({ "title": "Versteckt" }));
        hidden.is_visible = false;
        let blocks = vec![
            hidden,
            block(2, "newsletter_signup", json!({})),
            block(3, "spacer", json!({})),
        ];

        assert_eq!(ids(&registry.render_blocks(&blocks)), vec![3]);
    }

    #[test]
    fn test_malformed_block_is_isolated() {
        let registry = BlockRegistry::default();
        let blocks = vec![
            block(1, "hero", json!({ "title": "Vorher" })),
            block(2, "faq", json!({ "faqs": "keine Liste" })),
            block(3, "cta", json!({ "title": "Nachher" })),
        ];

        let rendered = registry.render_blocks(&blocks);
        assert_eq!(ids(&rendered), vec![1, 3]);
    }

    #[test]
    fn test_empty_output_is_dropped() {
        let registry = BlockRegistry::default();
        let blocks = vec![block(1, "faq", json!({ "title": "FAQ", "faqs": [] }))];
        assert!(registry.render_blocks(&blocks).is_empty());
    }

    #[test]
    fn test_null_configuration_uses_defaults() {
        let registry = BlockRegistry::default();
        let rendered = registry.render_blocks(&[block(5, "divider", Value::Null)]);

        assert_eq!(ids(&rendered), vec![5]);
        assert!(rendered[0].html.contains("divider--full"));
    }

    #[test]
    fn test_dashed_tags_and_alias() {
        let registry = BlockRegistry::default();
        let blocks = vec![
            block(1, "Scroll-Timeline", json!({ "items": [{ "date": "2020", "title": "Start" }] })),
            block(2, "featured_products", json!({ "products": [{ "articlenr": "SM40X" }] })),
        ];

        let rendered = registry.render_blocks(&blocks);
        assert_eq!(ids(&rendered), vec![1, 2]);
        assert_eq!(rendered[0].block_type, "scroll_timeline");
    }

    fn render_banner(config: &Value) -> Result<String, BlockError> {
        Ok(format!(
            "<aside>{}</aside>",
            config["text"].as_str().unwrap_or_default()
        ))
    }

    #[test]
    fn test_register_does_not_replace() {
        let mut registry = BlockRegistry::empty();
        assert!(registry.register("banner", render_banner));
        assert!(!registry.register("banner", render_template::<SpacerBlock>));

        let rendered = registry.render_blocks(&[block(1, "banner", json!({ "text": "Sale" }))]);
        assert_eq!(rendered[0].html, "<aside>Sale</aside>");
    }
}
