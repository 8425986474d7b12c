//! Category route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use rinos_core::{Category, CategoryId, CategoryTree, NodeId};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::layout::Layout;
use crate::routes::products::{self, PAGE_SIZE, Pagination, ProductCard};
use crate::state::AppState;

/// Link to a category listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryLink {
    pub id: CategoryId,
    pub name: String,
    pub href: String,
    pub image: Option<String>,
    pub product_count: Option<i64>,
}

impl From<&Category> for CategoryLink {
    fn from(category: &Category) -> Self {
        Self {
            id: category.categoryid,
            name: category.category.clone(),
            href: format!("/categories/{}?id={}", category.slug(), category.categoryid),
            image: category.categoryimageurl.clone().filter(|s| !s.is_empty()),
            product_count: category.product_count,
        }
    }
}

/// One row of the indented category overview.
#[derive(Debug, Clone)]
pub struct TreeEntry {
    pub link: CategoryLink,
    pub depth: usize,
}

/// Depth-first rows of the whole forest, children after their parent.
#[must_use]
pub fn flatten_tree(tree: &CategoryTree) -> Vec<TreeEntry> {
    fn visit(tree: &CategoryTree, id: NodeId, depth: usize, out: &mut Vec<TreeEntry>) {
        let node = tree.node(id);
        out.push(TreeEntry {
            link: CategoryLink::from(&node.category),
            depth,
        });
        for child in &node.children {
            visit(tree, *child, depth + 1, out);
        }
    }

    let mut out = Vec::with_capacity(tree.len());
    for root in tree.roots() {
        visit(tree, *root, 0, &mut out);
    }
    out
}

/// Category id for a listing URL: the `id` query parameter, else the first
/// category whose slug matches.
#[must_use]
pub fn resolve_category(tree: &CategoryTree, slug: &str, id: Option<i64>) -> Option<CategoryId> {
    if let Some(id) = id {
        return Some(CategoryId::new(id));
    }
    tree.iter()
        .find(|(_, node)| node.category.slug() == slug)
        .map(|(_, node)| node.category.categoryid)
}

/// Category listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    pub id: Option<i64>,
    pub page: Option<u32>,
}

/// Category overview template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub layout: Layout,
    pub entries: Vec<TreeEntry>,
}

/// Category products template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/show.html")]
pub struct CategoryShowTemplate {
    pub layout: Layout,
    pub name: String,
    pub breadcrumb: Vec<CategoryLink>,
    pub subcategories: Vec<CategoryLink>,
    pub products: Vec<ProductCard>,
    pub total: u64,
    pub pagination: Pagination,
}

/// Display the category tree.
#[instrument(skip(state, layout))]
pub async fn index(State(state): State<AppState>, layout: Layout) -> Result<CategoriesIndexTemplate> {
    let tree = state.backend().category_tree().await?;
    Ok(CategoriesIndexTemplate {
        layout,
        entries: flatten_tree(&tree),
    })
}

/// Display the products of one category.
#[instrument(skip(state, layout))]
pub async fn show(
    State(state): State<AppState>,
    layout: Layout,
    Path(slug): Path<String>,
    Query(query): Query<CategoryQuery>,
) -> Result<CategoryShowTemplate> {
    let tree = state.backend().category_tree().await?;
    let id = resolve_category(&tree, &slug, query.id)
        .ok_or_else(|| AppError::NotFound(format!("category {slug}")))?;

    let page = query.page.unwrap_or(1).max(1);
    let skip = (page - 1).saturating_mul(PAGE_SIZE);
    let result = state
        .backend()
        .get_category_products(id, skip, PAGE_SIZE)
        .await?;

    let breadcrumb: Vec<CategoryLink> = tree
        .breadcrumb(id)
        .into_iter()
        .map(CategoryLink::from)
        .collect();
    let subcategories = tree
        .find_by_id(id)
        .map(|node| tree.children(node).map(|c| CategoryLink::from(&c.category)).collect())
        .unwrap_or_default();

    let name = result
        .category
        .as_ref()
        .map(|c| c.category.clone())
        .or_else(|| breadcrumb.last().map(|c| c.name.clone()))
        .unwrap_or_else(|| "Kategorie".to_string());

    let base = format!("/categories/{slug}?id={id}&");
    Ok(CategoryShowTemplate {
        layout,
        name,
        breadcrumb,
        subcategories,
        products: products::cards(&result.products),
        total: result.total,
        pagination: Pagination::new(&base, page, result.pages),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rinos_core::build_category_tree;
    use serde_json::json;

    use super::*;

    fn tree() -> CategoryTree {
        let categories: Vec<Category> = serde_json::from_value(json!([
            { "categoryid": 1, "category": "Fahrräder", "categorypath": "Fahrräder" },
            { "categoryid": 2, "category": "E-Bikes", "categorypath": "Fahrräder - E-Bikes" },
            { "categoryid": 3, "category": "Zubehör", "categorypath": "Zubehör" },
            { "categoryid": 4, "category": "Trekking", "categorypath": "Fahrräder - E-Bikes - Trekking" },
        ]))
        .unwrap();
        build_category_tree(&categories)
    }

    #[test]
    fn test_flatten_tree_is_depth_first() {
        let rows: Vec<(String, usize)> = flatten_tree(&tree())
            .into_iter()
            .map(|e| (e.link.name, e.depth))
            .collect();

        assert_eq!(
            rows,
            vec![
                ("Fahrräder".to_string(), 0),
                ("E-Bikes".to_string(), 1),
                ("Trekking".to_string(), 2),
                ("Zubehör".to_string(), 0),
            ]
        );
    }

    #[test]
    fn test_category_link_href() {
        let tree = tree();
        let node = tree.node(tree.find_by_id(CategoryId::new(2)).unwrap());
        let link = CategoryLink::from(&node.category);
        assert_eq!(link.href, "/categories/e-bikes?id=2");
    }

    #[test]
    fn test_resolve_category_prefers_query_id() {
        let tree = tree();
        assert_eq!(
            resolve_category(&tree, "zubehor", Some(2)),
            Some(CategoryId::new(2))
        );
        assert_eq!(
            resolve_category(&tree, "zubehor", None),
            Some(CategoryId::new(3))
        );
        assert_eq!(resolve_category(&tree, "gibt-es-nicht", None), None);
    }
}
