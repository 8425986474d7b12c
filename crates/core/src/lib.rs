//! RINOS Core - Shared types library.
//!
//! This crate provides the domain types and pure helpers used by the
//! RINOS Bikes storefront:
//! - catalog types (products, categories, variations)
//! - CMS page and block payloads
//! - orders, carts, checkout and customer accounts
//! - the category tree builder and SEO slug helpers
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. All data originates from the backend API and is deserialized
//! into these types by the storefront.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, and statuses
//! - [`catalog`] - Products, categories, paginated listings
//! - [`page`] - CMS pages and their ordered blocks
//! - [`account`] - Users, orders, carts
//! - [`checkout`] - Customer details, web order and payment payloads
//! - [`category_tree`] - Flat category list to navigable forest
//! - [`slug`] - Product and category URL slugs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod account;
pub mod catalog;
pub mod category_tree;
pub mod checkout;
pub mod page;
pub mod slug;
pub mod types;

pub use account::{Cart, CartItem, CartItemProduct, CartSummary, Order, OrderItem, User};
pub use catalog::{Category, CategoryProducts, Product, ProductPage, Variations};
pub use category_tree::{CategoryNode, CategoryTree, NodeId, build_category_tree};
pub use checkout::{
    CheckoutForm, Country, CreatedOrder, CustomerInfo, FieldError, OrderRequest, PaymentIntent,
    PaymentMethod,
};
pub use page::{
    BlockChanges, BlockDraft, BlockOrder, MenuPage, MoveDirection, Page, PageBlock, PageDraft,
    PageList,
};
pub use types::*;
