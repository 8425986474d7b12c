//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (CMS page "home" or default home)
//! GET  /p/{slug}               - CMS page
//!
//! # Catalog
//! GET  /produkte               - Product listing (?page, ?q, ?category)
//! GET  /produkte/{slug}        - Product detail (SEO slug or article number)
//! GET  /categories             - Category tree
//! GET  /categories/{slug}      - Category products (?id, ?page)
//! GET  /suche                  - Search page
//! GET  /suche/results          - Search results fragment (HTMX, latest only)
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (returns count badge, triggers cart-updated)
//! POST /cart/update            - Update quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove item (returns cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout
//! GET  /kasse                  - Delivery address form (empty cart redirects to /cart)
//! POST /kasse                  - Place order, then card payment or order page
//!
//! # Auth
//! GET  /login                  - Login page
//! POST /login                  - Login action
//! GET  /register               - Register page
//! POST /register               - Register action
//! POST /logout                 - Logout action
//!
//! # Account
//! GET  /profil                 - Profile and order history (requires auth)
//! GET  /order                  - Order history (requires auth)
//! GET  /order/{id}             - Order detail
//!
//! # Admin (requires `User::is_admin`)
//! GET  /admin                  - Redirects to /admin/pages
//! GET  /admin/pages            - Page list (?search)
//! POST /admin/pages            - Create page
//! GET  /admin/pages/{id}       - Page editor with block list and preview
//! POST /admin/pages/{id}       - Update page metadata
//! POST /admin/pages/{id}/delete, /publish, /unpublish
//! POST /admin/pages/{id}/blocks                  - Add block
//! POST /admin/pages/{id}/blocks/{block}          - Save block visibility and configuration
//! POST /admin/pages/{id}/blocks/{block}/delete   - Remove block
//! POST /admin/pages/{id}/blocks/{block}/move     - Move block up or down
//!
//! # Content pages
//! GET  /impressum, /agb, ...   - Markdown pages, see [`pages::CONTENT_PAGES`]
//!
//! # Legacy URLs
//! GET  /anmelden               - Redirects to /login
//! GET  /products               - Redirects to /produkte
//!
//! # Backend pass-through
//! ANY  /api/{*path}            - Proxy to the backend API
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod checkout;
pub mod cms;
pub mod home;
pub mod pages;
pub mod products;
pub mod proxy;
pub mod search;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the login and registration form routes.
///
/// Split from [`auth_routes`] so the POST handlers can carry a rate limit.
pub fn auth_form_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
}

/// Create the auth page routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page))
        .route("/register", get(auth::register_page))
        .route("/logout", post(auth::logout))
        .route("/anmelden", get(auth::legacy_login))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{slug}", get(products::show))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index))
        .route("/{slug}", get(categories::show))
}

/// Create the search routes router.
pub fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(search::search_page))
        .route("/results", get(search::results))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new().route("/kasse", get(checkout::show).post(checkout::submit))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::index))
        .route("/pages", get(admin::pages).post(admin::create_page))
        .route("/pages/{id}", get(admin::edit_page).post(admin::update_page))
        .route("/pages/{id}/delete", post(admin::delete_page))
        .route("/pages/{id}/publish", post(admin::publish_page))
        .route("/pages/{id}/unpublish", post(admin::unpublish_page))
        .route("/pages/{id}/blocks", post(admin::add_block))
        .route("/pages/{id}/blocks/{block_id}", post(admin::update_block))
        .route("/pages/{id}/blocks/{block_id}/delete", post(admin::delete_block))
        .route("/pages/{id}/blocks/{block_id}/move", post(admin::move_block))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/profil", get(account::profile))
        .route("/order", get(account::orders))
        .route("/order/{id}", get(account::order))
}

/// Create the backend proxy router.
pub fn proxy_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/{*path}",
            get(proxy::proxy)
                .post(proxy::proxy)
                .put(proxy::proxy)
                .delete(proxy::proxy),
        )
        .route("/api", get(proxy::proxy))
}

/// Create all page routes for the storefront.
///
/// Rate-limited groups ([`auth_form_routes`], [`proxy_routes`]) are merged
/// in by the caller.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // CMS pages
        .route("/p/{slug}", get(cms::show))
        // Catalog
        .nest("/produkte", product_routes())
        .route("/products", get(products::legacy_index))
        .nest("/categories", category_routes())
        .nest("/suche", search_routes())
        // Cart
        .nest("/cart", cart_routes())
        .merge(checkout_routes())
        // Auth and account
        .merge(auth_routes())
        .merge(account_routes())
        // CMS administration
        .nest("/admin", admin_routes())
        // Markdown content pages
        .merge(pages::router())
}
