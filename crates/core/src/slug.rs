//! SEO slugs for product and category URLs.
//!
//! Product slugs look like `sandman-40-sm40x`: the normalized product name
//! followed by the lowercased article number. The article number is what
//! identifies the product; the name part is cosmetic and may change.
//!
//! [`extract_article_nr_from_slug`] recovers the article number
//! heuristically. It is not a guaranteed inverse of
//! [`generate_product_slug`]: names ending in letter+digit runs can be
//! absorbed into the article number, and article numbers containing
//! separators are not recovered.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::catalog::Product;

static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_\s-]").expect("valid regex"));
static SEPARATOR_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_]+").expect("valid regex"));
static DASH_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").expect("valid regex"));
static ARTICLE_NR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i-u)^[a-z]+[0-9]+[a-z]*[0-9]*$").expect("valid regex"));

/// Number of trailing slug segments considered when looking for the
/// article number.
const ARTICLE_SEGMENT_WINDOW: usize = 3;

/// Generate a product slug from its name and article number.
///
/// ```
/// use rinos_core::slug::generate_product_slug;
///
/// assert_eq!(generate_product_slug("Sandman 4.0", "SM40X"), "sandman-40-sm40x");
/// assert_eq!(generate_product_slug("", "SM40X"), "sm40x");
/// ```
#[must_use]
pub fn generate_product_slug(name: &str, article_number: &str) -> String {
    let article = article_number.to_lowercase();
    if name.is_empty() {
        return article;
    }

    // A name without any slug characters still gets the separator.
    let slug = slugify(name);
    if article.is_empty() {
        slug
    } else {
        format!("{slug}-{article}")
    }
}

/// Generate a category slug from its name.
#[must_use]
pub fn generate_category_slug(name: &str) -> String {
    generate_product_slug(name, "")
}

/// Recover the (uppercased) article number from a product slug.
///
/// A bare alphanumeric input is treated as an article number. Otherwise the
/// last up to three `-` segments are tried from shortest suffix to longest
/// and the first concatenation shaped like letters+digits wins. When nothing
/// matches, the whole input is returned uppercased.
///
/// ```
/// use rinos_core::slug::extract_article_nr_from_slug;
///
/// assert_eq!(extract_article_nr_from_slug("sandman-40-sm40x"), "SM40X");
/// assert_eq!(extract_article_nr_from_slug("sm40x"), "SM40X");
/// ```
#[must_use]
pub fn extract_article_nr_from_slug(slug: &str) -> String {
    if !slug.is_empty() && slug.chars().all(|c| c.is_ascii_alphanumeric()) {
        return slug.to_uppercase();
    }

    let parts: Vec<&str> = slug.split('-').collect();
    let stop = parts.len().saturating_sub(ARTICLE_SEGMENT_WINDOW);
    for start in (stop..parts.len()).rev() {
        let candidate = parts.get(start..).map(<[&str]>::concat).unwrap_or_default();
        if ARTICLE_NR.is_match(&candidate) {
            return candidate.to_uppercase();
        }
    }

    slug.to_uppercase()
}

/// Detail page path for a product.
#[must_use]
pub fn product_path(product: &Product) -> String {
    format!("/produkte/{}", product.slug())
}

/// Normalize free text into a lowercase, dash-separated slug.
fn slugify(text: &str) -> String {
    let folded: String = text
        .nfkd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .collect::<String>()
        .to_lowercase();

    let cleaned = NON_SLUG_CHARS.replace_all(&folded, "");
    let dashed = SEPARATOR_RUNS.replace_all(&cleaned, "-");
    let collapsed = DASH_RUNS.replace_all(&dashed, "-");
    collapsed.trim_matches('-').to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_appends_lowercased_article() {
        assert_eq!(
            generate_product_slug("Rinos Gaia 2 Gravel Bike", "RINOS24GRX400"),
            "rinos-gaia-2-gravel-bike-rinos24grx400"
        );
    }

    #[test]
    fn test_slug_strips_punctuation() {
        assert_eq!(generate_product_slug("Sandman 4.0", "SM40X"), "sandman-40-sm40x");
        assert_eq!(
            generate_product_slug("Helm (Größe M/L) – 2024!", ""),
            "helm-groe-ml-2024"
        );
    }

    #[test]
    fn test_slug_folds_accents() {
        assert_eq!(generate_category_slug("Café Racer Zubehör"), "cafe-racer-zubehor");
    }

    #[test]
    fn test_slug_collapses_separators_and_dashes() {
        assert_eq!(
            generate_category_slug("  E-Bikes __ und --- Pedelecs  "),
            "e-bikes-und-pedelecs"
        );
    }

    #[test]
    fn test_empty_name_yields_article_only() {
        assert_eq!(generate_product_slug("", "AB12"), "ab12");
    }

    #[test]
    fn test_punctuation_only_name_keeps_separator() {
        let slug = generate_product_slug("!!!", "AB12");
        assert_eq!(slug, "-ab12");
        assert_eq!(extract_article_nr_from_slug(&slug), "AB12");
    }

    #[test]
    fn test_category_slug_has_no_suffix() {
        assert_eq!(generate_category_slug("Fahrräder - Gravel"), "fahrrader-gravel");
    }

    #[test]
    fn test_extract_bare_article_number() {
        assert_eq!(extract_article_nr_from_slug("rinos24grx400"), "RINOS24GRX400");
    }

    #[test]
    fn test_extract_round_trips_generated_slugs() {
        for (name, article) in [
            ("Sandman 4.0", "SM40X"),
            ("Rinos Gaia 2 Gravel Bike", "RINOS24GRX400"),
            ("Odin", "OD1"),
        ] {
            let slug = generate_product_slug(name, article);
            assert_eq!(extract_article_nr_from_slug(&slug), article, "slug {slug}");
        }
    }

    #[test]
    fn test_extract_considers_at_most_three_segments() {
        // "ab-12-cd-34": suffix "cd34" matches before wider windows are tried.
        assert_eq!(extract_article_nr_from_slug("ab-12-cd-34"), "CD34");
        // Nothing in the last three segments looks like an article number.
        assert_eq!(extract_article_nr_from_slug("x1-foo-bar-baz"), "X1-FOO-BAR-BAZ");
    }

    #[test]
    fn test_extract_joins_split_article_numbers() {
        // "grx-400" alone does not match, but "grx" + "400" does.
        assert_eq!(extract_article_nr_from_slug("gaia-grx-400"), "GRX400");
    }

    #[test]
    fn test_extract_only_accepts_ascii_digits() {
        // Arabic-Indic digits are not article number digits.
        assert_eq!(extract_article_nr_from_slug("name-ab\u{661}\u{662}"), "NAME-AB\u{661}\u{662}");
    }

    #[test]
    fn test_extract_falls_back_to_uppercased_input() {
        assert_eq!(extract_article_nr_from_slug("nur-text"), "NUR-TEXT");
        assert_eq!(extract_article_nr_from_slug(""), "");
    }
}
