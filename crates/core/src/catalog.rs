//! Catalog types: products, categories and paginated listings.
//!
//! Field names follow the backend's JSON verbatim (`articlenr`,
//! `categorypath`, ...). The backend emits `null` for many optional columns,
//! including ones that are semantically lists or counters, so those fields
//! deserialize `null` as their default.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::slug;
use crate::types::{CategoryId, CurrencyCode, Price, ProductId};

/// Deserialize `null` (or a missing field, together with `#[serde(default)]`)
/// as `T::default()`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A product category as stored in the ERP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub categoryid: CategoryId,
    /// Display name. May be empty or the sentinel `"0"` for junk rows.
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    /// Ancestor names from root to self, joined by `" - "`.
    #[serde(default)]
    pub categorypath: Option<String>,
    #[serde(default)]
    pub categoryimageurl: Option<String>,
    #[serde(default)]
    pub product_count: Option<i64>,
}

impl Category {
    /// URL slug for this category's listing page.
    #[must_use]
    pub fn slug(&self) -> String {
        slug::generate_category_slug(&self.category)
    }
}

/// A sellable article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub productid: Option<ProductId>,
    /// Unique SKU used in URLs and cart operations.
    pub articlenr: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub articlename: String,
    #[serde(default)]
    pub shortdescription: Option<String>,
    #[serde(default)]
    pub longdescription: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub productgroup: Option<String>,
    #[serde(default)]
    pub primary_image: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_father_article: bool,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub colour: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub component: Option<String>,
    #[serde(default, rename = "type")]
    pub product_type: Option<String>,
    #[serde(default)]
    pub father_article: Option<String>,
    #[serde(default)]
    pub gtin: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub variations: Vec<Product>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: Vec<Category>,
}

impl Product {
    /// Price in the product's currency.
    #[must_use]
    pub fn price(&self) -> Price {
        Price::new(
            self.price,
            CurrencyCode::from_code(self.currency.as_deref()),
        )
    }

    /// Main image: `primary_image`, else the first gallery image.
    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.primary_image
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.images.iter().map(String::as_str).find(|s| !s.is_empty()))
    }

    /// SEO slug for the product detail page.
    #[must_use]
    pub fn slug(&self) -> String {
        slug::generate_product_slug(&self.articlename, &self.articlenr)
    }

    /// Inactive products stay reachable by URL but are hidden from listings.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.is_active.unwrap_or(true)
    }
}

/// One page of a product listing or search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub page: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub page_size: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_pages: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub products: Vec<Product>,
}

/// Products of a single category, as returned by `/meta/categories/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryProducts {
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub page: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pages: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub products: Vec<Product>,
}

/// Variation articles of a father article.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Variations {
    #[serde(default)]
    pub father_article: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub variation_count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub variations: Vec<Product>,
    /// Attribute name (e.g. "Farbe") to its distinct values.
    #[serde(default, deserialize_with = "null_as_default")]
    pub variation_options: BTreeMap<String, Vec<String>>,
}
