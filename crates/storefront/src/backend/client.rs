//! Backend API client implementation.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::Method;
use reqwest::header::ACCEPT;
use rinos_core::{
    BlockChanges, BlockDraft, BlockId, BlockOrder, Cart, Category, CategoryId, CategoryProducts,
    CategoryTree, CartItemId, CreatedOrder, MenuPage, Order, OrderId, OrderRequest, Page, PageDraft,
    PageId, PageList, PaymentIntent, Product, ProductPage, User, Variations, build_category_tree,
};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument};
use url::Url;

use super::BackendError;
use super::cache::{CacheKey, CacheValue};
use crate::config::BackendConfig;

/// Header carrying the deployment-protection bypass secret.
pub const BYPASS_HEADER: &str = "x-vercel-protection-bypass";

/// Public reads are served from memory for this long.
const CACHE_TTL: Duration = Duration::from_secs(300);

// =============================================================================
// Request / response payloads
// =============================================================================

/// Successful login or registration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default)]
    pub user: Option<User>,
}

/// Registration form as sent to `/auth/register`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Answer of `/cart/count`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CartCount {
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub unique_items: u32,
}

/// `GET /{articlenr}` answers either `{"product": {...}}` or the bare product.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProductEnvelope {
    Wrapped { product: Box<Product> },
    Bare(Box<Product>),
}

/// `GET /web-orders/{id}` answers either `{"order": {...}}` or the bare order.
#[derive(Deserialize)]
#[serde(untagged)]
enum OrderEnvelope {
    Wrapped { order: Box<Order> },
    Bare(Box<Order>),
}

/// `GET /auth/me` answers either `{"user": {...}}` or the bare user.
#[derive(Deserialize)]
#[serde(untagged)]
enum UserEnvelope {
    Wrapped { user: Box<User> },
    Bare(Box<User>),
}

/// Admin page writes answer `{"page": {...}}`, reads the bare page.
#[derive(Deserialize)]
#[serde(untagged)]
enum PageEnvelope {
    Wrapped { page: Box<Page> },
    Bare(Box<Page>),
}

#[derive(Deserialize)]
struct CategoriesEnvelope {
    #[serde(default)]
    categories: Option<Vec<Category>>,
}

#[derive(Deserialize)]
struct OrdersEnvelope {
    #[serde(default)]
    orders: Option<Vec<Order>>,
}

#[derive(Deserialize)]
struct MenuEnvelope {
    #[serde(default)]
    pages: Option<Vec<MenuPage>>,
}

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the backend REST API.
///
/// Cheap to clone; all clones share one connection pool and one cache.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    api_base: Url,
    bypass_secret: Option<SecretString>,
    cache: Cache<CacheKey, CacheValue>,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the configured
    /// origin does not form a valid API base URL.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(CACHE_TTL)
            .build();

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                api_base: Url::parse(&config.api_base())?,
                bypass_secret: config.bypass_secret.clone(),
                cache,
            }),
        })
    }

    /// The shared HTTP client (used by the `/api` proxy).
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.client
    }

    /// `{origin}/api/` with trailing slash.
    #[must_use]
    pub fn api_base(&self) -> &str {
        self.inner.api_base.as_str()
    }

    /// Deployment-protection bypass secret, if configured.
    #[must_use]
    pub fn bypass_secret(&self) -> Option<&SecretString> {
        self.inner.bypass_secret.as_ref()
    }

    /// Resolve an API-relative path and append query parameters.
    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url, BackendError> {
        let mut url = self.inner.api_base.join(path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Send a request and decode the JSON response.
    ///
    /// `resource` names the thing being fetched for `NotFound` errors.
    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
        token: Option<&SecretString>,
        resource: &str,
    ) -> Result<T, BackendError> {
        let url = self.endpoint(path, query)?;

        let mut request = self
            .inner
            .client
            .request(method, url)
            .header(ACCEPT, "application/json");
        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }
        if let Some(secret) = &self.inner.bypass_secret {
            request = request.header(BYPASS_HEADER, secret.expose_secret());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            if status.is_server_error() {
                tracing::error!(
                    status = %status,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Backend returned server error"
                );
            } else {
                debug!(status = %status, resource, "Backend returned client error");
            }
            return Err(BackendError::from_status(status, &response_text, resource));
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            BackendError::Parse(e)
        })
    }

    /// Send a request whose response body is irrelevant and may be empty.
    async fn send_ignoring_body(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
        token: Option<&SecretString>,
        resource: &str,
    ) -> Result<(), BackendError> {
        match self
            .send::<serde_json::Value>(method, path, query, body, token, resource)
            .await
        {
            Ok(_) | Err(BackendError::Parse(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        token: Option<&SecretString>,
        resource: &str,
    ) -> Result<T, BackendError> {
        self.send(Method::GET, path, query, None, token, resource).await
    }

    /// Ping the backend's `/health` endpoint at the origin root.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or not healthy.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), BackendError> {
        let url = self.inner.api_base.join("/health")?;
        let mut request = self.inner.client.get(url);
        if let Some(secret) = &self.inner.bypass_secret {
            request = request.header(BYPASS_HEADER, secret.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::from_status(status, &body, "health"))
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a page of the product listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, page: u32, page_size: u32) -> Result<ProductPage, BackendError> {
        let query = [("page", page.to_string()), ("page_size", page_size.to_string())];
        self.get("", &query, None, "products").await
    }

    /// Get a product by article number.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the article does not exist, or another error if
    /// the API request fails.
    #[instrument(skip(self))]
    pub async fn get_product(&self, articlenr: &str) -> Result<Product, BackendError> {
        let path = urlencoding::encode(articlenr);
        let envelope: ProductEnvelope = self
            .get(&path, &[], None, &format!("product {articlenr}"))
            .await?;
        Ok(match envelope {
            ProductEnvelope::Wrapped { product } | ProductEnvelope::Bare(product) => *product,
        })
    }

    /// Full-text product search.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn search_products(&self, query: &str, page: u32) -> Result<ProductPage, BackendError> {
        let params = [("search", query.to_string()), ("page", page.to_string())];
        self.get("search/query", &params, None, "search").await
    }

    /// Variation articles of a father article.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_variations(&self, articlenr: &str) -> Result<Variations, BackendError> {
        let path = format!("{}/variations", urlencoding::encode(articlenr));
        self.get(&path, &[], None, &format!("variations of {articlenr}"))
            .await
    }

    // =========================================================================
    // Category Methods
    // =========================================================================

    /// The flat category list (cached).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Arc<Vec<Category>>, BackendError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let envelope: CategoriesEnvelope =
            self.get("meta/categories", &[], None, "categories").await?;
        let categories = Arc::new(envelope.categories.unwrap_or_default());

        self.inner
            .cache
            .insert(CacheKey::Categories, CacheValue::Categories(Arc::clone(&categories)))
            .await;

        Ok(categories)
    }

    /// The category forest built from [`Self::list_categories`] (cached).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn category_tree(&self) -> Result<Arc<CategoryTree>, BackendError> {
        if let Some(CacheValue::CategoryTree(tree)) =
            self.inner.cache.get(&CacheKey::CategoryTree).await
        {
            debug!("Cache hit for category tree");
            return Ok(tree);
        }

        let categories = self.list_categories().await?;
        let tree = Arc::new(build_category_tree(&categories));

        self.inner
            .cache
            .insert(CacheKey::CategoryTree, CacheValue::CategoryTree(Arc::clone(&tree)))
            .await;

        Ok(tree)
    }

    /// Products of one category, `limit` at a time starting at `skip`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown categories, or another error if the API
    /// request fails.
    #[instrument(skip(self))]
    pub async fn get_category_products(
        &self,
        categoryid: CategoryId,
        skip: u32,
        limit: u32,
    ) -> Result<CategoryProducts, BackendError> {
        let path = format!("meta/categories/{categoryid}");
        let query = [("skip", skip.to_string()), ("limit", limit.to_string())];
        self.get(&path, &query, None, &format!("category {categoryid}"))
            .await
    }

    // =========================================================================
    // CMS Methods
    // =========================================================================

    /// A published CMS page by slug (cached). Misses are not cached.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no published page has this slug, or another
    /// error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_public_page(&self, slug: &str) -> Result<Arc<Page>, BackendError> {
        let cache_key = CacheKey::Page(slug.to_string());

        if let Some(CacheValue::Page(page)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for page");
            return Ok(page);
        }

        let path = format!("pages/public/{}", urlencoding::encode(slug));
        let page: Page = self.get(&path, &[], None, &format!("page {slug}")).await?;
        let page = Arc::new(page);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Page(Arc::clone(&page)))
            .await;

        Ok(page)
    }

    /// Pages that appear in the header menu (cached).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_menu_pages(&self) -> Result<Arc<Vec<MenuPage>>, BackendError> {
        if let Some(CacheValue::MenuPages(pages)) = self.inner.cache.get(&CacheKey::MenuPages).await
        {
            debug!("Cache hit for menu pages");
            return Ok(pages);
        }

        let envelope: MenuEnvelope = self.get("pages/public/menu", &[], None, "menu").await?;
        let pages = Arc::new(envelope.pages.unwrap_or_default());

        self.inner
            .cache
            .insert(CacheKey::MenuPages, CacheValue::MenuPages(Arc::clone(&pages)))
            .await;

        Ok(pages)
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Cart for a guest session (and the logged-in user, if any).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn get_cart(
        &self,
        session_id: &str,
        token: Option<&SecretString>,
    ) -> Result<Cart, BackendError> {
        let query = [("guest_session_id", session_id.to_string())];
        self.get("cart/", &query, token, "cart").await
    }

    /// Add `quantity` units of an article to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn add_to_cart(
        &self,
        session_id: &str,
        articlenr: &str,
        quantity: u32,
        token: Option<&SecretString>,
    ) -> Result<Cart, BackendError> {
        let body = json!({
            "articlenr": articlenr,
            "quantity": quantity,
            "guest_session_id": session_id,
        });
        self.send(Method::POST, "cart/add", &[], Some(&body), token, "cart")
            .await
    }

    /// Set the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn update_cart_item(
        &self,
        cart_item_id: CartItemId,
        quantity: u32,
        token: Option<&SecretString>,
    ) -> Result<Cart, BackendError> {
        let path = format!("cart/items/{cart_item_id}");
        let body = json!({ "quantity": quantity });
        self.send(Method::PUT, &path, &[], Some(&body), token, "cart item")
            .await
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn remove_cart_item(
        &self,
        cart_item_id: CartItemId,
        token: Option<&SecretString>,
    ) -> Result<Cart, BackendError> {
        let path = format!("cart/items/{cart_item_id}");
        self.send(Method::DELETE, &path, &[], None, token, "cart item")
            .await
    }

    /// Empty the cart after an order was placed.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn clear_cart(
        &self,
        session_id: &str,
        token: Option<&SecretString>,
    ) -> Result<(), BackendError> {
        let query = [("guest_session_id", session_id.to_string())];
        self.send_ignoring_body(Method::DELETE, "cart/", &query, None, token, "cart")
            .await
    }

    /// Number of units and distinct lines in the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn cart_count(
        &self,
        session_id: &str,
        token: Option<&SecretString>,
    ) -> Result<CartCount, BackendError> {
        let query = [("guest_session_id", session_id.to_string())];
        self.get("cart/count", &query, token, "cart").await
    }

    // =========================================================================
    // Auth Methods
    // =========================================================================

    /// Exchange credentials for an access token.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` or `Status` for rejected credentials, or
    /// another error if the API request fails.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<AuthResponse, BackendError> {
        let body = json!({ "email": email, "password": password.expose_secret() });
        self.send(Method::POST, "auth/login/json", &[], Some(&body), None, "login")
            .await
    }

    /// Create an account. The backend logs the new user in right away.
    ///
    /// # Errors
    ///
    /// Returns `Status` with the backend's reason if the registration was
    /// rejected, or another error if the API request fails.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, BackendError> {
        let body = serde_json::to_value(request)?;
        self.send(Method::POST, "auth/register", &[], Some(&body), None, "register")
            .await
    }

    /// The user the token belongs to.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the token is no longer valid.
    #[instrument(skip(self, token))]
    pub async fn current_user(&self, token: &SecretString) -> Result<User, BackendError> {
        let envelope: UserEnvelope = self.get("auth/me", &[], Some(token), "user").await?;
        Ok(match envelope {
            UserEnvelope::Wrapped { user } | UserEnvelope::Bare(user) => *user,
        })
    }

    /// Revoke the token on the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn logout(&self, token: &SecretString) -> Result<(), BackendError> {
        self.send_ignoring_body(Method::POST, "auth/logout", &[], None, Some(token), "logout")
            .await
    }

    // =========================================================================
    // Order Methods
    // =========================================================================

    /// Orders of the logged-in user, newest first as the backend sorts them.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the token is no longer valid.
    #[instrument(skip(self, token))]
    pub async fn list_orders(&self, token: &SecretString) -> Result<Vec<Order>, BackendError> {
        let envelope: OrdersEnvelope = self.get("web-orders/", &[], Some(token), "orders").await?;
        Ok(envelope.orders.unwrap_or_default())
    }

    /// A single order. Guests may look up their order without a token.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown orders and `Unauthorized` if the token
    /// is no longer valid.
    #[instrument(skip(self, token))]
    pub async fn get_order(
        &self,
        order_id: OrderId,
        token: Option<&SecretString>,
    ) -> Result<Order, BackendError> {
        let path = format!("web-orders/{order_id}");
        let envelope: OrderEnvelope = self
            .get(&path, &[], token, &format!("order {order_id}"))
            .await?;
        Ok(match envelope {
            OrderEnvelope::Wrapped { order } | OrderEnvelope::Bare(order) => *order,
        })
    }

    /// Place a web order. Guests order without a token.
    ///
    /// # Errors
    ///
    /// Returns `Status` with the backend's reason if the order was rejected,
    /// or another error if the API request fails.
    #[instrument(skip(self, order, token), fields(lines = order.cart_items.len(), total = %order.total_amount))]
    pub async fn create_order(
        &self,
        order: &OrderRequest,
        token: Option<&SecretString>,
    ) -> Result<CreatedOrder, BackendError> {
        let body = serde_json::to_value(order)?;
        self.send(Method::POST, "web-orders/", &[], Some(&body), token, "order")
            .await
    }

    /// Start a card payment for an order.
    ///
    /// The payment provider sends the customer back to `return_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn create_payment_intent(
        &self,
        order_id: OrderId,
        return_url: &str,
        token: Option<&SecretString>,
    ) -> Result<PaymentIntent, BackendError> {
        let body = json!({ "order_id": order_id, "return_url": return_url });
        self.send(
            Method::POST,
            "payments/create-payment-intent",
            &[],
            Some(&body),
            token,
            "payment",
        )
        .await
    }

    // =========================================================================
    // Admin Methods
    // =========================================================================
    //
    // Every admin write drops the public cache so menu and page changes show
    // up right away.

    /// All pages, published or not, optionally filtered by title or slug.
    ///
    /// # Errors
    ///
    /// Returns `Status` (403) for non-admins, or another error if the API
    /// request fails.
    #[instrument(skip(self, token))]
    pub async fn admin_list_pages(
        &self,
        search: Option<&str>,
        token: &SecretString,
    ) -> Result<PageList, BackendError> {
        let mut query = vec![("page_size", "100".to_string())];
        if let Some(search) = search.filter(|s| !s.trim().is_empty()) {
            query.push(("search", search.trim().to_string()));
        }
        self.get("pages", &query, Some(token), "pages").await
    }

    /// A page with all its blocks, hidden ones included.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown pages, or another error if the API
    /// request fails.
    #[instrument(skip(self, token))]
    pub async fn admin_get_page(&self, page_id: PageId, token: &SecretString) -> Result<Page, BackendError> {
        let path = format!("pages/{page_id}");
        let envelope: PageEnvelope = self
            .get(&path, &[], Some(token), &format!("page {page_id}"))
            .await?;
        Ok(match envelope {
            PageEnvelope::Wrapped { page } | PageEnvelope::Bare(page) => *page,
        })
    }

    /// Create a page.
    ///
    /// # Errors
    ///
    /// Returns `Status` (400) for a taken slug, or another error if the API
    /// request fails.
    #[instrument(skip(self, draft, token), fields(slug = %draft.slug))]
    pub async fn admin_create_page(&self, draft: &PageDraft, token: &SecretString) -> Result<Page, BackendError> {
        let body = serde_json::to_value(draft)?;
        let envelope: PageEnvelope = self
            .send(Method::POST, "pages", &[], Some(&body), Some(token), "page")
            .await?;
        self.inner.cache.invalidate_all();
        Ok(match envelope {
            PageEnvelope::Wrapped { page } | PageEnvelope::Bare(page) => *page,
        })
    }

    /// Replace a page's metadata.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown pages, `Status` for a taken slug, or
    /// another error if the API request fails.
    #[instrument(skip(self, draft, token), fields(slug = %draft.slug))]
    pub async fn admin_update_page(
        &self,
        page_id: PageId,
        draft: &PageDraft,
        token: &SecretString,
    ) -> Result<(), BackendError> {
        let path = format!("pages/{page_id}");
        let body = serde_json::to_value(draft)?;
        self.send_ignoring_body(Method::PUT, &path, &[], Some(&body), Some(token), "page")
            .await?;
        self.inner.cache.invalidate_all();
        Ok(())
    }

    /// Delete a page and its blocks.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown pages, or another error if the API
    /// request fails.
    #[instrument(skip(self, token))]
    pub async fn admin_delete_page(&self, page_id: PageId, token: &SecretString) -> Result<(), BackendError> {
        let path = format!("pages/{page_id}");
        self.send_ignoring_body(Method::DELETE, &path, &[], None, Some(token), "page")
            .await?;
        self.inner.cache.invalidate_all();
        Ok(())
    }

    /// Publish or unpublish a page.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown pages, or another error if the API
    /// request fails.
    #[instrument(skip(self, token))]
    pub async fn admin_set_published(
        &self,
        page_id: PageId,
        published: bool,
        token: &SecretString,
    ) -> Result<(), BackendError> {
        let action = if published { "publish" } else { "unpublish" };
        let path = format!("pages/{page_id}/{action}");
        self.send_ignoring_body(Method::POST, &path, &[], None, Some(token), "page")
            .await?;
        self.inner.cache.invalidate_all();
        Ok(())
    }

    /// Append a block to a page.
    ///
    /// # Errors
    ///
    /// Returns `Status` for block types the backend rejects, or another error
    /// if the API request fails.
    #[instrument(skip(self, block, token), fields(block_type = %block.block_type))]
    pub async fn admin_add_block(
        &self,
        page_id: PageId,
        block: &BlockDraft,
        token: &SecretString,
    ) -> Result<(), BackendError> {
        let path = format!("pages/{page_id}/blocks");
        let body = serde_json::to_value(block)?;
        self.send_ignoring_body(Method::POST, &path, &[], Some(&body), Some(token), "block")
            .await?;
        self.inner.cache.invalidate_all();
        Ok(())
    }

    /// Change a block's visibility or configuration.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown blocks, or another error if the API
    /// request fails.
    #[instrument(skip(self, changes, token))]
    pub async fn admin_update_block(
        &self,
        page_id: PageId,
        block_id: BlockId,
        changes: &BlockChanges,
        token: &SecretString,
    ) -> Result<(), BackendError> {
        let path = format!("pages/{page_id}/blocks/{block_id}");
        let body = serde_json::to_value(changes)?;
        self.send_ignoring_body(
            Method::PUT,
            &path,
            &[],
            Some(&body),
            Some(token),
            &format!("block {block_id}"),
        )
        .await?;
        self.inner.cache.invalidate_all();
        Ok(())
    }

    /// Remove a block from a page.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown blocks, or another error if the API
    /// request fails.
    #[instrument(skip(self, token))]
    pub async fn admin_delete_block(
        &self,
        page_id: PageId,
        block_id: BlockId,
        token: &SecretString,
    ) -> Result<(), BackendError> {
        let path = format!("pages/{page_id}/blocks/{block_id}");
        self.send_ignoring_body(
            Method::DELETE,
            &path,
            &[],
            None,
            Some(token),
            &format!("block {block_id}"),
        )
        .await?;
        self.inner.cache.invalidate_all();
        Ok(())
    }

    /// Store new block positions.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, orders, token), fields(blocks = orders.len()))]
    pub async fn admin_reorder_blocks(
        &self,
        page_id: PageId,
        orders: &[BlockOrder],
        token: &SecretString,
    ) -> Result<(), BackendError> {
        let path = format!("pages/{page_id}/blocks/reorder");
        let body = json!({ "block_orders": orders });
        self.send_ignoring_body(Method::POST, &path, &[], Some(&body), Some(token), "blocks")
            .await?;
        self.inner.cache.invalidate_all();
        Ok(())
    }
}
