//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::Redirect,
};
use rinos_core::slug::{extract_article_nr_from_slug, product_path};
use rinos_core::{CategoryId, Product, ProductPage, Variations};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::layout::Layout;
use crate::state::AppState;

/// Products per listing page.
pub const PAGE_SIZE: u32 = 20;

/// Product display data for listing cards.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub href: String,
    pub articlenr: String,
    pub name: String,
    pub manufacturer: Option<String>,
    pub image: Option<String>,
    pub price: String,
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        Self {
            href: product_path(product),
            articlenr: product.articlenr.clone(),
            name: product.articlename.clone(),
            manufacturer: product.manufacturer.clone().filter(|m| !m.trim().is_empty()),
            image: product.image_url().map(str::to_string),
            price: product.price().display(),
        }
    }
}

/// Cards for the products that may be listed.
#[must_use]
pub fn cards(products: &[Product]) -> Vec<ProductCard> {
    products
        .iter()
        .filter(|p| p.is_available())
        .map(ProductCard::from)
        .collect()
}

/// Previous/next page links for a listing.
#[derive(Debug, Clone, Default)]
pub struct Pagination {
    pub page: u32,
    pub total_pages: u32,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
}

impl Pagination {
    /// `base` already carries any other query parameters and ends with `?`
    /// or `&`.
    #[must_use]
    pub fn new(base: &str, page: u32, total_pages: u32) -> Self {
        let page = page.max(1);
        Self {
            page,
            total_pages,
            prev_href: (page > 1).then(|| format!("{base}page={}", page - 1)),
            next_href: (page < total_pages).then(|| format!("{base}page={}", page + 1)),
        }
    }

    #[must_use]
    pub fn is_needed(&self) -> bool {
        self.total_pages > 1
    }
}

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub page: Option<u32>,
    pub q: Option<String>,
    pub category: Option<i64>,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub heading: String,
    pub query: String,
    pub products: Vec<ProductCard>,
    pub total: u64,
    pub pagination: Pagination,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub layout: Layout,
    pub product: Product,
    pub price: String,
    pub images: Vec<String>,
    pub variations: Vec<ProductCard>,
    pub variation_options: Vec<(String, String)>,
}

/// Display the product listing.
///
/// `?q=` searches, `?category=<id>` lists one category, otherwise the full
/// catalog is paged.
#[instrument(skip(state, layout))]
pub async fn index(
    State(state): State<AppState>,
    layout: Layout,
    Query(query): Query<ListingQuery>,
) -> Result<ProductsIndexTemplate> {
    let page = query.page.unwrap_or(1).max(1);
    let search = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_string);

    let (heading, listing, base) = if let Some(q) = &search {
        let listing = state.backend().search_products(q, page).await?;
        (
            format!("Suchergebnisse für „{q}“"),
            listing,
            format!("/produkte?q={}&", urlencoding::encode(q)),
        )
    } else if let Some(id) = query.category {
        let id = CategoryId::new(id);
        let skip = (page - 1).saturating_mul(PAGE_SIZE);
        let result = state
            .backend()
            .get_category_products(id, skip, PAGE_SIZE)
            .await?;
        let heading = result
            .category
            .as_ref()
            .map_or_else(|| "Produkte".to_string(), |c| c.category.clone());
        let listing = ProductPage {
            total: result.total,
            page,
            page_size: PAGE_SIZE,
            total_pages: result.pages,
            products: result.products,
        };
        (heading, listing, format!("/produkte?category={id}&"))
    } else {
        let listing = state.backend().list_products(page, PAGE_SIZE).await?;
        ("Alle Produkte".to_string(), listing, "/produkte?".to_string())
    };

    Ok(ProductsIndexTemplate {
        layout,
        heading,
        query: search.unwrap_or_default(),
        products: cards(&listing.products),
        total: listing.total,
        pagination: Pagination::new(&base, page, listing.total_pages),
    })
}

/// Display a product.
///
/// Accepts an SEO slug (`sandman-40-sm40x`) or a bare article number.
/// Father articles list their variations.
#[instrument(skip(state, layout))]
pub async fn show(
    State(state): State<AppState>,
    layout: Layout,
    Path(slug): Path<String>,
) -> Result<ProductShowTemplate> {
    let articlenr = extract_article_nr_from_slug(&slug);
    let product = state.backend().get_product(&articlenr).await?;

    let variations = if product.is_father_article {
        match state.backend().get_variations(&product.articlenr).await {
            Ok(variations) => variations,
            Err(e) => {
                tracing::warn!(error = %e, articlenr = %product.articlenr, "Failed to load variations");
                Variations::default()
            }
        }
    } else {
        Variations::default()
    };

    let mut images: Vec<String> = product.image_url().map(str::to_string).into_iter().collect();
    for image in &product.images {
        if !image.is_empty() && !images.contains(image) {
            images.push(image.clone());
        }
    }

    let variation_options = variations
        .variation_options
        .iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(name, values)| (name.clone(), values.join(", ")))
        .collect();

    Ok(ProductShowTemplate {
        layout,
        price: product.price().display(),
        images,
        variations: cards(&variations.variations),
        variation_options,
        product,
    })
}

/// `/products` is the old English listing URL.
pub async fn legacy_index() -> Redirect {
    Redirect::permanent("/produkte")
}
