//! Scroll animation blocks.
//!
//! These render static markup annotated with `data-*` attributes
//! (animation, duration, trigger, ...). The page is complete without
//! JavaScript; an animation script may pick the attributes up.
//!
//! Configuration keys are camelCase, as written by the page editor.

use askama::Template;
use serde::{Deserialize, Deserializer};

use super::style::{self, lenient_f64, lenient_u32, list_or_json_string};

fn animation(value: Option<&str>, default: &'static str) -> &'static str {
    match value {
        Some("fade") => "fade",
        Some("slide-up") => "slide-up",
        Some("slide-down") => "slide-down",
        Some("slide-left") => "slide-left",
        Some("slide-right") => "slide-right",
        Some("scale") => "scale",
        Some("rotate") => "rotate",
        Some("blur") => "blur",
        _ => default,
    }
}

fn flag(value: Option<bool>, default: bool) -> &'static str {
    if value.unwrap_or(default) { "true" } else { "false" }
}

/// Seconds, clamped to something an editor could mean.
fn seconds(value: Option<f64>, default: f64) -> f64 {
    value.unwrap_or(default).clamp(0.0, 10.0)
}

// =============================================================================
// Scroll reveal image
// =============================================================================

#[derive(Debug, Deserialize, Template)]
#[serde(rename_all = "camelCase")]
#[template(path = "blocks/scroll_reveal_image.html")]
pub struct ScrollRevealImageBlock {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub animation: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub duration: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub delay: Option<f64>,
    #[serde(default)]
    pub easing: Option<String>,
    #[serde(default)]
    pub trigger: Option<String>,
    #[serde(default)]
    pub once: Option<bool>,
    #[serde(default)]
    pub aspect_ratio: Option<String>,
}

impl ScrollRevealImageBlock {
    fn src(&self) -> Option<&str> {
        style::image(self.image.as_deref())
    }

    fn alt(&self) -> &str {
        self.alt
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or("Bild")
    }

    fn animation(&self) -> &'static str {
        animation(self.animation.as_deref(), "fade")
    }

    fn duration(&self) -> f64 {
        seconds(self.duration, 0.8)
    }

    fn delay(&self) -> f64 {
        seconds(self.delay, 0.0)
    }

    fn easing(&self) -> &str {
        self.easing
            .as_deref()
            .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric() || c == '.'))
            .unwrap_or("power3")
    }

    /// Viewport position that starts the animation, e.g. `75%`.
    fn trigger(&self) -> &str {
        style::length(self.trigger.as_deref(), "75%")
    }

    fn once(&self) -> &'static str {
        flag(self.once, true)
    }

    fn aspect_class(&self) -> &'static str {
        match self.aspect_ratio.as_deref() {
            Some("16/9" | "16:9") => "aspect-16-9",
            Some("4/3" | "4:3") => "aspect-4-3",
            Some("1/1" | "1:1") => "aspect-1-1",
            Some("3/4" | "3:4") => "aspect-3-4",
            _ => "",
        }
    }
}

// =============================================================================
// Parallax section
// =============================================================================

#[derive(Debug, Deserialize, Template)]
#[serde(rename_all = "camelCase")]
#[template(path = "blocks/scroll_parallax_section.html")]
pub struct ScrollParallaxSectionBlock {
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub overlay_color: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub parallax_speed: Option<f64>,
    #[serde(default)]
    pub height: Option<String>,
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub subheading: Option<String>,
    #[serde(default)]
    pub content_animation: Option<String>,
    #[serde(default)]
    pub text_align: Option<String>,
    #[serde(default)]
    pub text_color: Option<String>,
}

impl ScrollParallaxSectionBlock {
    fn section_style(&self) -> String {
        format!(
            "min-height: {}; color: {}",
            style::length(self.height.as_deref(), "75vh"),
            style::color(self.text_color.as_deref(), "#ffffff"),
        )
    }

    fn background_image(&self) -> Option<&str> {
        style::image(self.background_image.as_deref())
    }

    fn overlay_color(&self) -> &str {
        style::color(self.overlay_color.as_deref(), "rgba(0,0,0,0.4)")
    }

    fn speed(&self) -> f64 {
        self.parallax_speed.unwrap_or(0.5).clamp(0.0, 2.0)
    }

    fn animation(&self) -> &'static str {
        animation(self.content_animation.as_deref(), "slide-up")
    }

    fn text_align(&self) -> &'static str {
        match self.text_align.as_deref() {
            Some("left") => "left",
            Some("right") => "right",
            _ => "center",
        }
    }
}

// =============================================================================
// Pinned section
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct Panel {
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl Panel {
    fn image_src(&self) -> Option<&str> {
        style::image(self.image.as_deref())
    }
}

#[derive(Debug, Deserialize, Template)]
#[serde(rename_all = "camelCase")]
#[template(path = "blocks/pinned_scroll_section.html")]
pub struct PinnedScrollSectionBlock {
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub text_color: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub pin_duration: Option<f64>,
    #[serde(default, deserialize_with = "list_or_json_string")]
    pub panels: Vec<Panel>,
    #[serde(default)]
    pub transition_type: Option<String>,
    #[serde(default)]
    pub progress_indicator: Option<bool>,
}

impl PinnedScrollSectionBlock {
    fn section_style(&self) -> String {
        format!(
            "background-color: {}; color: {}",
            style::color(self.background_color.as_deref(), "#000000"),
            style::color(self.text_color.as_deref(), "#ffffff"),
        )
    }

    fn duration(&self) -> f64 {
        seconds(self.pin_duration, 2.0)
    }

    fn transition(&self) -> &'static str {
        match self.transition_type.as_deref() {
            Some("slide") => "slide",
            Some("scale") => "scale",
            _ => "fade",
        }
    }

    fn show_progress(&self) -> bool {
        self.progress_indicator.unwrap_or(true)
    }
}

// =============================================================================
// Horizontal gallery
// =============================================================================

/// A gallery entry: either a bare URL or `{src, alt, caption}`.
#[derive(Debug)]
pub struct HorizontalImage {
    pub src: String,
    pub alt: Option<String>,
    pub caption: Option<String>,
}

impl<'de> Deserialize<'de> for HorizontalImage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Url(String),
            Full {
                src: String,
                #[serde(default)]
                alt: Option<String>,
                #[serde(default)]
                caption: Option<String>,
            },
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Url(src) => Self {
                src,
                alt: None,
                caption: None,
            },
            Raw::Full { src, alt, caption } => Self { src, alt, caption },
        })
    }
}

impl HorizontalImage {
    fn image_src(&self) -> Option<&str> {
        style::image(Some(&self.src))
    }

    fn caption(&self) -> Option<&str> {
        self.caption.as_deref().filter(|c| !c.trim().is_empty())
    }
}

#[derive(Debug, Deserialize, Template)]
#[serde(rename_all = "camelCase")]
#[template(path = "blocks/horizontal_gallery_scroll.html")]
pub struct HorizontalGalleryScrollBlock {
    #[serde(default, deserialize_with = "list_or_json_string")]
    pub images: Vec<HorizontalImage>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub image_size: Option<String>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub gap: Option<u32>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub scroll_speed: Option<f64>,
    #[serde(default)]
    pub show_captions: Option<bool>,
    #[serde(default)]
    pub direction: Option<String>,
}

impl HorizontalGalleryScrollBlock {
    fn visible_images(&self) -> Vec<&HorizontalImage> {
        self.images
            .iter()
            .filter(|img| img.image_src().is_some())
            .collect()
    }

    fn section_style(&self) -> String {
        format!(
            "background-color: {}; --gallery-gap: {}px",
            style::color(self.background_color.as_deref(), "#fafafa"),
            self.gap.unwrap_or(24).min(200),
        )
    }

    fn image_size(&self) -> &'static str {
        match self.image_size.as_deref() {
            Some("small") => "small",
            Some("large") => "large",
            _ => "medium",
        }
    }

    fn speed(&self) -> f64 {
        self.scroll_speed.unwrap_or(1.0).clamp(0.1, 5.0)
    }

    fn direction(&self) -> &'static str {
        if self.direction.as_deref() == Some("right") {
            "right"
        } else {
            "left"
        }
    }

    fn show_captions(&self) -> bool {
        self.show_captions.unwrap_or(false)
    }
}

// =============================================================================
// Timeline
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct TimelineItem {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl TimelineItem {
    fn image_src(&self) -> Option<&str> {
        style::image(self.image.as_deref())
    }
}

#[derive(Debug, Deserialize, Template)]
#[serde(rename_all = "camelCase")]
#[template(path = "blocks/scroll_timeline.html")]
pub struct ScrollTimelineBlock {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "list_or_json_string")]
    pub items: Vec<TimelineItem>,
    #[serde(default)]
    pub layout: Option<String>,
    #[serde(default)]
    pub line_color: Option<String>,
    #[serde(default)]
    pub dot_color: Option<String>,
    #[serde(default)]
    pub item_animation: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub stagger: Option<f64>,
    #[serde(default)]
    pub progress_line: Option<bool>,
    #[serde(default)]
    pub background_color: Option<String>,
}

impl ScrollTimelineBlock {
    fn layout(&self) -> &'static str {
        match self.layout.as_deref() {
            Some("left") => "left",
            Some("right") => "right",
            _ => "alternating",
        }
    }

    fn section_style(&self) -> String {
        format!(
            "background-color: {}; --timeline-line-color: {}; --timeline-dot-color: {}",
            style::color(self.background_color.as_deref(), "transparent"),
            style::color(self.line_color.as_deref(), "#000000"),
            style::color(self.dot_color.as_deref(), "#000000"),
        )
    }

    fn animation(&self) -> &'static str {
        animation(self.item_animation.as_deref(), "slide-up")
    }

    fn stagger(&self) -> f64 {
        seconds(self.stagger, 0.1)
    }

    fn progress_line(&self) -> bool {
        self.progress_line.unwrap_or(true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn decode<T: serde::de::DeserializeOwned>(config: Value) -> T {
        serde_json::from_value(config).unwrap()
    }

    #[test]
    fn test_reveal_image_data_attributes() {
        let block: ScrollRevealImageBlock = decode(json!({
            "image": "https://cdn.rinosbike.eu/sandman.jpg",
            "animation": "slide-left",
            "duration": "1.2",
            "once": false,
            "aspectRatio": "16/9",
        }));
        let html = block.render().unwrap();

        assert!(html.contains("data-animation=\"slide-left\""));
        assert!(html.contains("data-duration=\"1.2\""));
        assert!(html.contains("data-once=\"false\""));
        assert!(html.contains("data-trigger=\"75%\""));
        assert!(html.contains("aspect-16-9"));
    }

    #[test]
    fn test_reveal_image_without_image_renders_nothing() {
        let block: ScrollRevealImageBlock = decode(json!({ "image": "javascript:alert(1)" }));
        assert!(block.render().unwrap().trim().is_empty());
    }

    #[test]
    fn test_parallax_section() {
        let block: ScrollParallaxSectionBlock = decode(json!({
            "backgroundImage": "/static/img/trail.jpg",
            "heading": "Raus in die Natur",
            "height": "100vh",
            "textAlign": "left",
        }));
        let html = block.render().unwrap();

        assert!(html.contains("min-height: 100vh"));
        assert!(html.contains("url('/static/img/trail.jpg')"));
        assert!(html.contains("text-align: left"));
        assert!(html.contains("Raus in die Natur"));
    }

    #[test]
    fn test_pinned_panels_from_json_string() {
        let block: PinnedScrollSectionBlock = decode(json!({
            "panels": "[{\"heading\":\"Rahmen\",\"text\":\"Carbon\"},{\"heading\":\"Antrieb\",\"text\":\"1x12\"}]",
            "progressIndicator": false,
        }));
        let html = block.render().unwrap();

        assert_eq!(block.panels.len(), 2);
        assert!(html.contains("Rahmen"));
        assert!(html.contains("Antrieb"));
        assert!(!html.contains("scroll-pin__progress"));
    }

    #[test]
    fn test_pinned_without_panels_renders_nothing() {
        let block: PinnedScrollSectionBlock = decode(json!({ "panels": "" }));
        assert!(block.render().unwrap().trim().is_empty());
    }

    #[test]
    fn test_horizontal_gallery_mixed_images() {
        let block: HorizontalGalleryScrollBlock = decode(json!({
            "images": [
                "https://cdn.rinosbike.eu/1.jpg",
                { "src": "https://cdn.rinosbike.eu/2.jpg", "caption": "Am See" },
            ],
            "showCaptions": true,
            "gap": "32",
        }));
        let html = block.render().unwrap();

        assert!(html.contains("https://cdn.rinosbike.eu/1.jpg"));
        assert!(html.contains("Am See"));
        assert!(html.contains("--gallery-gap: 32px"));
    }

    #[test]
    fn test_timeline_items() {
        let block: ScrollTimelineBlock = decode(json!({
            "items": [
                { "date": "2019", "title": "Gründung", "description": "Frankfurt (Oder)" },
                { "date": "2024", "title": "Sandman 4.0", "description": "Neues Gravelbike" },
            ],
            "lineColor": "#ff0000",
        }));
        let html = block.render().unwrap();

        assert!(html.contains("Gründung"));
        assert!(html.contains("--timeline-line-color: #ff0000"));
        assert!(html.contains("data-layout=\"alternating\""));
    }
}
