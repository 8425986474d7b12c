//! Content blocks: hero, text, grids, calls to action and embeds.
//!
//! Each struct is both the decoded block configuration and the askama
//! template that renders it. All fields are optional; the page editor omits
//! keys it has no value for and sometimes writes `null`.

use askama::Template;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use rinos_core::slug::generate_product_slug;

use super::style::{self, lenient_u32};
use super::video::VideoEmbed;
use crate::content::render_markdown;
use crate::filters;

/// `null` or missing lists decode as empty.
fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

/// A button shown only when it has both a label and a usable link.
pub struct ButtonLink<'a> {
    pub text: &'a str,
    pub href: &'a str,
}

impl<'a> ButtonLink<'a> {
    fn new(text: Option<&'a String>, link: Option<&'a str>) -> Option<Self> {
        Some(Self {
            text: non_empty(text)?,
            href: style::href(link)?,
        })
    }
}

/// Grid column classes for 1 to 4 columns.
fn grid_class(columns: Option<u32>, default: u32) -> &'static str {
    match columns.unwrap_or(default) {
        1 => "grid grid--1",
        2 => "grid grid--2",
        4 => "grid grid--4",
        _ => "grid grid--3",
    }
}

fn alignment_class(alignment: Option<&str>, default: &'static str) -> &'static str {
    match alignment {
        Some("left") => "align-left",
        Some("center") => "align-center",
        Some("right") => "align-right",
        _ => default,
    }
}

// =============================================================================
// Hero
// =============================================================================

#[derive(Debug, Deserialize, Template)]
#[template(path = "blocks/hero.html")]
pub struct HeroBlock {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub overlay_color: Option<String>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub overlay_opacity: Option<u32>,
    #[serde(default)]
    pub text_color: Option<String>,
    #[serde(default)]
    pub text_alignment: Option<String>,
    #[serde(default)]
    pub height: Option<String>,
    #[serde(default)]
    pub button_text: Option<String>,
    #[serde(default)]
    pub button_link: Option<String>,
    #[serde(default)]
    pub button_style: Option<String>,
}

impl HeroBlock {
    fn height_class(&self) -> &'static str {
        match self.height.as_deref() {
            Some("small") => "hero--small",
            Some("medium") => "hero--medium",
            Some("full") => "hero--full",
            _ => "hero--large",
        }
    }

    fn alignment_class(&self) -> &'static str {
        alignment_class(self.text_alignment.as_deref(), "align-center")
    }

    fn background_image(&self) -> Option<&str> {
        style::image(self.image_url.as_deref())
    }

    fn overlay_style(&self) -> String {
        let opacity = f64::from(self.overlay_opacity.unwrap_or(40).min(100)) / 100.0;
        format!(
            "background-color: {}; opacity: {opacity}",
            style::color(self.overlay_color.as_deref(), "#000000")
        )
    }

    fn text_color(&self) -> &str {
        style::color(self.text_color.as_deref(), "#ffffff")
    }

    fn button(&self) -> Option<ButtonLink<'_>> {
        ButtonLink::new(self.button_text.as_ref(), self.button_link.as_deref())
    }

    fn button_class(&self) -> &'static str {
        match self.button_style.as_deref() {
            Some("outline") => "btn btn--outline-light",
            Some("dark") => "btn btn--dark",
            _ => "btn btn--light",
        }
    }
}

// =============================================================================
// Text
// =============================================================================

#[derive(Debug, Deserialize, Template)]
#[template(path = "blocks/text.html")]
pub struct TextBlock {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub alignment: Option<String>,
    #[serde(default)]
    pub text_size: Option<String>,
    #[serde(default)]
    pub padding: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub text_color: Option<String>,
}

impl TextBlock {
    /// Editor HTML and markdown both pass through the markdown renderer.
    fn content_html(&self) -> String {
        non_empty(self.content.as_ref())
            .map(render_markdown)
            .unwrap_or_default()
    }

    fn classes(&self) -> String {
        let size = match self.text_size.as_deref() {
            Some("small") => "prose--small",
            Some("large") => "prose--large",
            Some("xl") => "prose--xl",
            _ => "prose--normal",
        };
        let padding = match self.padding.as_deref() {
            Some("none") => "pad-none",
            Some("small") => "pad-small",
            Some("large") => "pad-large",
            _ => "pad-medium",
        };
        format!(
            "{size} {padding} {}",
            alignment_class(self.alignment.as_deref(), "align-left")
        )
    }

    fn section_style(&self) -> String {
        format!(
            "background-color: {}; color: {}",
            style::color(self.background_color.as_deref(), "transparent"),
            style::color(self.text_color.as_deref(), "inherit"),
        )
    }
}

// =============================================================================
// Feature grid
// =============================================================================

/// Icons available to feature grid entries.
const FEATURE_ICONS: [&str; 15] = [
    "award", "zap", "messagecircle", "shield", "heart", "star", "truck", "clock", "target",
    "users", "sparkles", "trophy", "leaf", "globe2", "palette",
];

#[derive(Debug, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Feature {
    fn icon_class(&self) -> String {
        let name = self
            .icon
            .as_deref()
            .map(str::to_ascii_lowercase)
            .filter(|icon| FEATURE_ICONS.contains(&icon.as_str()))
            .unwrap_or_else(|| "award".to_string());
        format!("icon icon--{name}")
    }
}

#[derive(Debug, Deserialize, Template)]
#[template(path = "blocks/feature_grid.html")]
pub struct FeatureGridBlock {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default, deserialize_with = "list")]
    pub features: Vec<Feature>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub columns: Option<u32>,
    #[serde(default)]
    pub icon_style: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
}

impl FeatureGridBlock {
    fn grid_class(&self) -> &'static str {
        grid_class(self.columns, 3)
    }

    fn icon_style_class(&self) -> &'static str {
        match self.icon_style.as_deref() {
            Some("plain") => "feature__icon--plain",
            Some("square") => "feature__icon--square",
            _ => "feature__icon--circle",
        }
    }

    fn background(&self) -> &str {
        style::color(self.background_color.as_deref(), "transparent")
    }
}

// =============================================================================
// Call to action
// =============================================================================

#[derive(Debug, Deserialize, Template)]
#[template(path = "blocks/cta.html")]
pub struct CtaBlock {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub button_text: Option<String>,
    #[serde(default)]
    pub button_link: Option<String>,
    #[serde(default)]
    pub button_style: Option<String>,
    #[serde(default)]
    pub alignment: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub text_color: Option<String>,
}

impl CtaBlock {
    fn section_style(&self) -> String {
        format!(
            "background-color: {}; color: {}",
            style::color(self.background_color.as_deref(), "#f9fafb"),
            style::color(self.text_color.as_deref(), "inherit"),
        )
    }

    fn alignment_class(&self) -> &'static str {
        alignment_class(self.alignment.as_deref(), "align-center")
    }

    fn button(&self) -> Option<ButtonLink<'_>> {
        ButtonLink::new(self.button_text.as_ref(), self.button_link.as_deref())
    }

    fn button_class(&self) -> &'static str {
        match self.button_style.as_deref() {
            Some("outline") => "btn btn--outline",
            _ => "btn btn--dark",
        }
    }
}

// =============================================================================
// FAQ
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct FaqEntry {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

#[derive(Debug, Deserialize, Template)]
#[template(path = "blocks/faq.html")]
pub struct FaqBlock {
    #[serde(default)]
    pub title: Option<String>,
    /// Older pages store the entries as `items`.
    #[serde(default, alias = "items", deserialize_with = "list")]
    pub faqs: Vec<FaqEntry>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
}

impl FaqBlock {
    /// `list` style shows all answers; the default collapses them.
    fn is_list(&self) -> bool {
        self.style.as_deref() == Some("list")
    }

    fn background(&self) -> &str {
        style::color(self.background_color.as_deref(), "transparent")
    }
}

// =============================================================================
// Video
// =============================================================================

#[derive(Debug, Deserialize, Template)]
#[template(path = "blocks/video.html")]
pub struct VideoBlock {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub layout: Option<String>,
    #[serde(default)]
    pub aspect_ratio: Option<String>,
    #[serde(default)]
    pub max_width: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub text_color: Option<String>,
    #[serde(default, deserialize_with = "list")]
    pub features: Vec<String>,
    #[serde(default)]
    pub button_text: Option<String>,
    #[serde(default)]
    pub button_link: Option<String>,
}

impl VideoBlock {
    fn embed(&self) -> Option<VideoEmbed> {
        VideoEmbed::from_url(self.video_url.as_deref()?)
    }

    fn frame_src(&self) -> Option<String> {
        match self.embed()? {
            VideoEmbed::Frame(src) => Some(src),
            VideoEmbed::File(_) => None,
        }
    }

    fn frame_title(&self) -> &str {
        non_empty(self.title.as_ref()).unwrap_or("Video")
    }

    fn file_src(&self) -> Option<String> {
        match self.embed()? {
            VideoEmbed::File(src) => Some(src),
            VideoEmbed::Frame(_) => None,
        }
    }

    /// `horizontal` (default), `vertical_left` or `vertical_right`.
    fn layout_class(&self) -> &'static str {
        match self.layout.as_deref() {
            Some("vertical_left") => "video--vertical",
            Some("vertical_right") => "video--vertical video--reverse",
            _ => "video--horizontal",
        }
    }

    fn is_horizontal(&self) -> bool {
        !matches!(
            self.layout.as_deref(),
            Some("vertical_left" | "vertical_right")
        )
    }

    fn aspect_class(&self) -> &'static str {
        match self.aspect_ratio.as_deref() {
            Some("4:3") => "aspect-4-3",
            Some("1:1") => "aspect-1-1",
            Some("9:16") => "aspect-9-16",
            _ => "aspect-16-9",
        }
    }

    fn frame_style(&self) -> String {
        let default = if self.is_horizontal() { "700px" } else { "320px" };
        format!(
            "max-width: {}",
            style::length(self.max_width.as_deref(), default)
        )
    }

    fn section_style(&self) -> String {
        format!(
            "background-color: {}; color: {}",
            style::color(self.background_color.as_deref(), "transparent"),
            style::color(self.text_color.as_deref(), "inherit"),
        )
    }

    fn button(&self) -> Option<ButtonLink<'_>> {
        ButtonLink::new(self.button_text.as_ref(), self.button_link.as_deref())
    }

    fn bullet_points(&self) -> Vec<&str> {
        self.features
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .collect()
    }
}

// =============================================================================
// Product showcase
// =============================================================================

/// A product picked in the editor, stored inline in the block.
#[derive(Debug, Deserialize)]
pub struct ShowcaseProduct {
    pub articlenr: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub articlename: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub primary_image: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
}

impl ShowcaseProduct {
    fn display_name(&self) -> &str {
        non_empty(self.name.as_ref())
            .or_else(|| non_empty(self.articlename.as_ref()))
            .unwrap_or(&self.articlenr)
    }

    fn image_src(&self) -> Option<&str> {
        style::image(self.image.as_deref()).or_else(|| style::image(self.primary_image.as_deref()))
    }

    fn href(&self) -> String {
        let name = non_empty(self.name.as_ref())
            .or_else(|| non_empty(self.articlename.as_ref()))
            .unwrap_or_default();
        format!(
            "/produkte/{}",
            urlencoding::encode(&generate_product_slug(name, &self.articlenr))
        )
    }

    fn shown_price(&self) -> Option<Decimal> {
        self.price.filter(|p| !p.is_zero())
    }
}

#[derive(Debug, Deserialize, Template)]
#[template(path = "blocks/product_showcase.html")]
pub struct ProductShowcaseBlock {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "list")]
    pub products: Vec<ShowcaseProduct>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub columns: Option<u32>,
    #[serde(default)]
    pub show_price: Option<bool>,
    #[serde(default)]
    pub card_style: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
}

impl ProductShowcaseBlock {
    fn grid_class(&self) -> &'static str {
        grid_class(self.columns, 4)
    }

    fn show_price(&self) -> bool {
        self.show_price.unwrap_or(true)
    }

    fn card_class(&self) -> &'static str {
        match self.card_style.as_deref() {
            Some("minimal") => "product-card product-card--minimal",
            Some("bordered") => "product-card product-card--bordered",
            _ => "product-card",
        }
    }

    fn background(&self) -> &str {
        style::color(self.background_color.as_deref(), "transparent")
    }
}

// =============================================================================
// Image gallery
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct GalleryImage {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

impl GalleryImage {
    fn src(&self) -> Option<&str> {
        style::image(self.url.as_deref())
    }

    fn alt(&self) -> &str {
        self.alt.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Deserialize, Template)]
#[template(path = "blocks/image_gallery.html")]
pub struct ImageGalleryBlock {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "list")]
    pub images: Vec<GalleryImage>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub columns: Option<u32>,
    #[serde(default)]
    pub gap: Option<String>,
    #[serde(default)]
    pub aspect_ratio: Option<String>,
    #[serde(default)]
    pub rounded: Option<String>,
    #[serde(default)]
    pub enable_lightbox: Option<bool>,
    #[serde(default)]
    pub background_color: Option<String>,
}

impl ImageGalleryBlock {
    fn visible_images(&self) -> Vec<&GalleryImage> {
        self.images.iter().filter(|img| img.src().is_some()).collect()
    }

    fn grid_class(&self) -> String {
        let gap = match self.gap.as_deref() {
            Some("small") => "gap-small",
            Some("large") => "gap-large",
            _ => "gap-medium",
        };
        format!("{} {gap}", grid_class(self.columns, 3))
    }

    fn tile_class(&self) -> String {
        let aspect = match self.aspect_ratio.as_deref() {
            Some("landscape") => "aspect-4-3",
            Some("portrait") => "aspect-3-4",
            Some("wide") => "aspect-16-9",
            _ => "aspect-1-1",
        };
        let rounded = match self.rounded.as_deref() {
            Some("none") => "rounded-none",
            Some("small") => "rounded-small",
            Some("large") => "rounded-large",
            _ => "rounded-medium",
        };
        format!("gallery__tile {aspect} {rounded}")
    }

    /// Without a lightbox script, enlarging opens the image itself.
    fn links_to_image(&self) -> bool {
        self.enable_lightbox.unwrap_or(true)
    }

    fn background(&self) -> &str {
        style::color(self.background_color.as_deref(), "transparent")
    }
}

// =============================================================================
// Spacer & divider
// =============================================================================

/// Tallest spacer the editor may configure, in pixels.
const MAX_SPACER_HEIGHT: u32 = 400;

#[derive(Debug, Deserialize, Template)]
#[template(path = "blocks/spacer.html")]
pub struct SpacerBlock {
    #[serde(default)]
    pub height: Option<String>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub custom_height: Option<u32>,
    #[serde(default)]
    pub show_line: Option<bool>,
}

impl SpacerBlock {
    /// Height in pixels.
    #[must_use]
    pub fn pixels(&self) -> u32 {
        let px = match self.height.as_deref() {
            Some("small") => 24,
            Some("large") => 96,
            Some("xl") => 144,
            Some("custom") => self.custom_height.unwrap_or(48),
            _ => 48,
        };
        px.min(MAX_SPACER_HEIGHT)
    }

    fn show_line(&self) -> bool {
        self.show_line.unwrap_or(false)
    }
}

#[derive(Debug, Deserialize, Template)]
#[template(path = "blocks/divider.html")]
pub struct DividerBlock {
    #[serde(default)]
    pub width: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub thickness: Option<u32>,
}

impl DividerBlock {
    fn width_class(&self) -> &'static str {
        match self.width.as_deref() {
            Some("medium") => "divider--medium",
            Some("small") => "divider--small",
            _ => "divider--full",
        }
    }

    fn line_style(&self) -> String {
        let border = match self.style.as_deref() {
            Some("dashed") => "dashed",
            Some("dotted") => "dotted",
            _ => "solid",
        };
        format!(
            "border-style: {border}; border-color: {}; border-width: {}px 0 0 0",
            style::color(self.color.as_deref(), "#e5e7eb"),
            self.thickness.unwrap_or(1).clamp(1, 10),
        )
    }
}

// =============================================================================
// Custom HTML
// =============================================================================

/// Raw HTML written by an editor. Trusted as-is, like the text block.
#[derive(Debug, Deserialize, Template)]
#[template(path = "blocks/custom_html.html")]
pub struct CustomHtmlBlock {
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
}

impl CustomHtmlBlock {
    fn html(&self) -> &str {
        non_empty(self.html.as_ref()).unwrap_or_default()
    }

    fn background(&self) -> &str {
        style::color(self.background_color.as_deref(), "transparent")
    }
}

// =============================================================================
// Comparison table
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ComparisonColumn {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub highlighted: bool,
}

/// A table cell: booleans render as check marks, everything else as text.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct ComparisonCell(Value);

impl ComparisonCell {
    fn flag(&self) -> Option<bool> {
        self.0.as_bool()
    }

    fn text(&self) -> String {
        match &self.0 {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ComparisonRow {
    #[serde(default)]
    pub label: String,
    #[serde(default, deserialize_with = "list")]
    pub values: Vec<ComparisonCell>,
    #[serde(default)]
    pub highlighted: bool,
}

#[derive(Debug, Deserialize, Template)]
#[template(path = "blocks/comparison_table.html")]
pub struct ComparisonTableBlock {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "list")]
    pub columns: Vec<ComparisonColumn>,
    #[serde(default, deserialize_with = "list")]
    pub rows: Vec<ComparisonRow>,
}
