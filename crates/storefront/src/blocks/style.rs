//! Validation of style values taken from block configuration.
//!
//! CMS editors may type arbitrary text into color and size fields. Only
//! values matching these patterns are written into `style` attributes; anything
//! else falls back to the block default.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer};

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3,4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").expect("valid regex")
});

static FUNCTIONAL_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:rgb|rgba|hsl|hsla)\(\s*[0-9.%\s,/]+\)$").expect("valid regex")
});

static NAMED_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z]{3,20}$").expect("valid regex"));

static LENGTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,4}(?:\.\d{1,3})?(?:px|rem|em|vh|vw|%)$").expect("valid regex")
});

/// `value` if it is a CSS color, else `fallback`.
pub fn color<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    value
        .map(str::trim)
        .filter(|v| HEX_COLOR.is_match(v) || FUNCTIONAL_COLOR.is_match(v) || NAMED_COLOR.is_match(v))
        .unwrap_or(fallback)
}

/// `value` if it is a CSS length (`720px`, `75vh`, `40rem`, ...), else `fallback`.
pub fn length<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    value
        .map(str::trim)
        .filter(|v| LENGTH.is_match(v))
        .unwrap_or(fallback)
}

/// `value` if it is a link safe to put into `href`: site-relative paths,
/// fragments, http(s), `mailto:` and `tel:`.
pub fn href(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| {
        (v.starts_with('/') && !v.starts_with("//"))
            || v.starts_with('#')
            || ["https://", "http://", "mailto:", "tel:"]
                .iter()
                .any(|scheme| v.starts_with(scheme))
    })
}

/// `value` if it is an image URL usable in `src` and in CSS `url(...)`.
pub fn image(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| {
        (v.starts_with("https://") || v.starts_with("http://") || (v.starts_with('/') && !v.starts_with("//")))
            && !v.chars().any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '(' | ')' | '\\'))
    })
}

/// Same as [`lenient_u32`] for fractional values like durations.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|f: &f64| f.is_finite()))
}

/// Accepts a number or a numeric string. Anything else decodes as `None`.
///
/// The page editor stores select values as strings (`"3"`), older blocks
/// as numbers.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// A list that may arrive as a JSON array or as a string holding one.
///
/// Scroll blocks written by the first editor version stored their items as
/// serialized JSON text.
pub fn list_or_json_string<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(Vec::new()),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(Vec::new()),
        Some(serde_json::Value::String(s)) => {
            serde_json::from_str(&s).map_err(serde::de::Error::custom)
        }
        Some(other) => serde_json::from_value(other).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[test]
    fn test_color_accepts_css_colors() {
        assert_eq!(color(Some("#1d1d1f"), "#fff"), "#1d1d1f");
        assert_eq!(color(Some("#FFF"), "#000"), "#FFF");
        assert_eq!(color(Some("rgba(0, 0, 0, 0.4)"), "#fff"), "rgba(0, 0, 0, 0.4)");
        assert_eq!(color(Some("transparent"), "#fff"), "transparent");
    }

    #[test]
    fn test_color_rejects_injection() {
        assert_eq!(color(Some("red; background: url(x)"), "#fff"), "#fff");
        assert_eq!(color(Some("#12345"), "#fff"), "#fff");
        assert_eq!(color(Some("\"><script>"), "#fff"), "#fff");
        assert_eq!(color(None, "transparent"), "transparent");
    }

    #[test]
    fn test_length() {
        assert_eq!(length(Some("720px"), "100%"), "720px");
        assert_eq!(length(Some("75vh"), "100%"), "75vh");
        assert_eq!(length(Some("calc(100% - 2px)"), "100%"), "100%");
        assert_eq!(length(Some("720"), "100%"), "100%");
    }

    #[test]
    fn test_href() {
        assert_eq!(href(Some("/produkte")), Some("/produkte"));
        assert_eq!(href(Some("https://rinosbike.eu")), Some("https://rinosbike.eu"));
        assert_eq!(href(Some("mailto:info@rinosbike.eu")), Some("mailto:info@rinosbike.eu"));
        assert_eq!(href(Some("javascript:alert(1)")), None);
        assert_eq!(href(Some("//evil.example")), None);
        assert_eq!(href(None), None);
    }

    #[test]
    fn test_image() {
        assert_eq!(image(Some("/static/hero.jpg")), Some("/static/hero.jpg"));
        assert_eq!(
            image(Some("https://cdn.rinosbike.eu/a.webp")),
            Some("https://cdn.rinosbike.eu/a.webp")
        );
        assert_eq!(image(Some("https://x.example/a.jpg') ; x")), None);
        assert_eq!(image(Some("data:image/png;base64,AAAA")), None);
    }

    #[derive(Deserialize)]
    struct Columns {
        #[serde(default, deserialize_with = "lenient_u32")]
        columns: Option<u32>,
    }

    #[test]
    fn test_lenient_u32() {
        let parse = |json: &str| serde_json::from_str::<Columns>(json).unwrap().columns;
        assert_eq!(parse(r#"{"columns": 3}"#), Some(3));
        assert_eq!(parse(r#"{"columns": "4"}"#), Some(4));
        assert_eq!(parse(r#"{"columns": 2.0}"#), Some(2));
        assert_eq!(parse(r#"{"columns": "viele"}"#), None);
        assert_eq!(parse(r#"{"columns": null}"#), None);
        assert_eq!(parse("{}"), None);
    }

    #[derive(Deserialize)]
    struct Items {
        #[serde(default, deserialize_with = "list_or_json_string")]
        items: Vec<String>,
    }

    #[test]
    fn test_list_or_json_string() {
        let parse = |json: &str| serde_json::from_str::<Items>(json).map(|i| i.items);
        assert_eq!(parse(r#"{"items": ["a", "b"]}"#).unwrap(), ["a", "b"]);
        assert_eq!(parse(r#"{"items": "[\"a\"]"}"#).unwrap(), ["a"]);
        assert!(parse(r#"{"items": ""}"#).unwrap().is_empty());
        assert!(parse(r#"{"items": null}"#).unwrap().is_empty());
        assert!(parse(r#"{"items": "[kaputt"}"#).is_err());
    }
}
