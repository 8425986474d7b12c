//! Cache types for public backend reads.

use std::sync::Arc;

use rinos_core::{Category, CategoryTree, MenuPage, Page};

/// Cache key for public, customer-independent responses.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Categories,
    CategoryTree,
    Page(String),
    MenuPages,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Categories(Arc<Vec<Category>>),
    CategoryTree(Arc<CategoryTree>),
    Page(Arc<Page>),
    MenuPages(Arc<Vec<MenuPage>>),
}
