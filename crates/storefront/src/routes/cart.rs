//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart itself lives on the backend, keyed by the guest cart session id
//! (and the login, if any); the session only remembers the badge count.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use rinos_core::account::clamp_quantity;
use rinos_core::slug::generate_product_slug;
use rinos_core::{Cart, CartItem, CartItemId, format_eur};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::BackendError;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::layout::Layout;
use crate::session::{AuthSession, CartSession, set_cart_count};
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartItemView {
    pub id: CartItemId,
    pub href: String,
    pub name: String,
    pub details: Option<String>,
    pub image: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    pub in_stock: bool,
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub tax: String,
    pub shipping: String,
    pub total: String,
    pub item_count: u32,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self::from(&Cart::default())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn has_free_shipping(&self) -> bool {
        !self.is_empty() && self.shipping == format_eur(rust_decimal::Decimal::ZERO)
    }
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        let product = &item.product;
        let details = [product.colour.as_deref(), product.size.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>();

        Self {
            id: item.cart_item_id,
            href: format!(
                "/produkte/{}",
                generate_product_slug(&product.articlename, &product.articlenr)
            ),
            name: product.articlename.clone(),
            details: (!details.is_empty()).then(|| details.join(" / ")),
            image: product.primary_image.clone().filter(|s| !s.is_empty()),
            quantity: item.quantity,
            price: format_eur(item.price_at_addition),
            line_price: format_eur(item.subtotal),
            in_stock: product.in_stock,
        }
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        let summary = cart.summary();
        Self {
            items: cart.items.iter().map(CartItemView::from).collect(),
            subtotal: format_eur(summary.subtotal),
            tax: format_eur(summary.tax_amount),
            shipping: format_eur(summary.shipping),
            total: format_eur(summary.total),
            item_count: summary.item_count,
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub articlenr: String,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub cart_item_id: CartItemId,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub cart_item_id: CartItemId,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    pub cart: CartView,
    pub error: Option<String>,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
    pub error: Option<String>,
}

/// Inline cart error fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_error.html")]
pub struct CartErrorTemplate {
    pub message: String,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

/// Customer-facing message for a failed cart operation.
fn cart_error_message(err: &BackendError) -> String {
    err.client_message().map_or_else(
        || "Der Warenkorb konnte nicht aktualisiert werden. Bitte versuchen Sie es erneut.".to_string(),
        String::from,
    )
}

/// Remember the new badge count after a cart change.
async fn remember_count(session: &Session, cart: &Cart) {
    if let Err(e) = set_cart_count(session, cart.item_count()).await {
        tracing::error!(error = %e, "Failed to save cart count to session");
    }
}

/// Display cart page.
#[instrument(skip(state, session, layout, auth, cart_session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    mut layout: Layout,
    auth: AuthSession,
    cart_session: CartSession,
) -> Result<CartShowTemplate> {
    let (cart, error) = match state
        .backend()
        .get_cart(&cart_session.session_id, auth.bearer())
        .await
    {
        Ok(cart) => {
            remember_count(&session, &cart).await;
            (CartView::from(&cart), None)
        }
        Err(BackendError::Unauthorized) => return Err(AppError::SessionExpired),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch cart");
            (
                CartView::empty(),
                Some("Der Warenkorb konnte nicht geladen werden.".to_string()),
            )
        }
    };

    layout.cart_count = cart.item_count;
    Ok(CartShowTemplate {
        layout,
        cart,
        error,
    })
}

/// Add item to cart (HTMX).
///
/// Returns the updated count badge with an HTMX trigger so other elements
/// refresh. Plain form posts are redirected to the cart page.
#[instrument(skip(state, session, auth, cart_session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    auth: AuthSession,
    cart_session: CartSession,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let articlenr = form.articlenr.trim();
    if articlenr.is_empty() {
        return AppError::BadRequest("Kein Artikel angegeben.".to_string()).into_response();
    }
    let quantity = clamp_quantity(form.quantity.unwrap_or(1));

    match state
        .backend()
        .add_to_cart(&cart_session.session_id, articlenr, quantity, auth.bearer())
        .await
    {
        Ok(cart) => {
            remember_count(&session, &cart).await;
            add_breadcrumb("cart", "Added to cart", Some(&[("articlenr", articlenr)]));

            if !is_htmx(&headers) {
                return Redirect::to("/cart").into_response();
            }
            (
                AppendHeaders([("HX-Trigger", "cart-updated")]),
                CartCountTemplate {
                    count: cart.item_count(),
                },
            )
                .into_response()
        }
        Err(BackendError::Unauthorized) => AppError::SessionExpired.into_response(),
        Err(e) => {
            tracing::error!(error = %e, articlenr = %articlenr, "Failed to add item to cart");
            if !is_htmx(&headers) {
                return Redirect::to("/cart?error=add_failed").into_response();
            }
            let status = if e.client_message().is_some() {
                StatusCode::UNPROCESSABLE_ENTITY
            } else {
                StatusCode::BAD_GATEWAY
            };
            (
                status,
                CartErrorTemplate {
                    message: cart_error_message(&e),
                },
            )
                .into_response()
        }
    }
}

/// Update cart item quantity (HTMX).
///
/// A quantity of zero removes the line.
#[instrument(skip(state, session, auth, cart_session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    auth: AuthSession,
    cart_session: CartSession,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let result = if form.quantity == 0 {
        state
            .backend()
            .remove_cart_item(form.cart_item_id, auth.bearer())
            .await
    } else {
        state
            .backend()
            .update_cart_item(form.cart_item_id, clamp_quantity(form.quantity), auth.bearer())
            .await
    };

    cart_fragment(&state, &session, &auth, &cart_session, result).await
}

/// Remove item from cart (HTMX).
#[instrument(skip(state, session, auth, cart_session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    auth: AuthSession,
    cart_session: CartSession,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let result = state
        .backend()
        .remove_cart_item(form.cart_item_id, auth.bearer())
        .await;

    cart_fragment(&state, &session, &auth, &cart_session, result).await
}

/// Render the cart items fragment after a change.
///
/// On failure the current cart is re-fetched so the list stays accurate,
/// with an error line above it.
async fn cart_fragment(
    state: &AppState,
    session: &Session,
    auth: &AuthSession,
    cart_session: &CartSession,
    result: std::result::Result<Cart, BackendError>,
) -> Response {
    match result {
        Ok(cart) => {
            remember_count(session, &cart).await;
            (
                AppendHeaders([("HX-Trigger", "cart-updated")]),
                CartItemsTemplate {
                    cart: CartView::from(&cart),
                    error: None,
                },
            )
                .into_response()
        }
        Err(BackendError::Unauthorized) => AppError::SessionExpired.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to change cart");
            let cart = state
                .backend()
                .get_cart(&cart_session.session_id, auth.bearer())
                .await
                .map(|cart| CartView::from(&cart))
                .unwrap_or_else(|_| CartView::empty());
            CartItemsTemplate {
                cart,
                error: Some(cart_error_message(&e)),
            }
            .into_response()
        }
    }
}

/// Get cart count badge (HTMX).
///
/// Falls back to the last count remembered in the session when the backend
/// is unreachable.
#[instrument(skip(state, session, auth, cart_session))]
pub async fn count(
    State(state): State<AppState>,
    session: Session,
    auth: AuthSession,
    cart_session: CartSession,
) -> impl IntoResponse {
    let count = match state
        .backend()
        .cart_count(&cart_session.session_id, auth.bearer())
        .await
    {
        Ok(count) => {
            if let Err(e) = set_cart_count(&session, count.count).await {
                tracing::error!(error = %e, "Failed to save cart count to session");
            }
            count.count
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch cart count");
            cart_session.item_count
        }
    };

    CartCountTemplate { count }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn cart() -> Cart {
        serde_json::from_value(json!({
            "cart_id": 4,
            "items": [{
                "cart_item_id": 11,
                "product": {
                    "articlenr": "SM40X",
                    "articlename": "Sandman 4.0",
                    "price": 2499,
                    "colour": "Grün",
                    "size": "L",
                },
                "quantity": 2,
                "price_at_addition": 2499,
                "subtotal": 4998,
            }],
            "summary": {
                "subtotal": 4998,
                "tax_rate": 0.19,
                "tax_amount": 949.62,
                "shipping": 0,
                "total": 5947.62,
                "item_count": 2,
                "unique_items": 1,
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_cart_view_from_backend_cart() {
        let view = CartView::from(&cart());

        assert_eq!(view.item_count, 2);
        assert_eq!(view.total, "5.947,62 €");
        assert!(view.has_free_shipping());

        let line = &view.items[0];
        assert_eq!(line.href, "/produkte/sandman-40-sm40x");
        assert_eq!(line.details.as_deref(), Some("Grün / L"));
        assert_eq!(line.line_price, "4.998,00 €");
    }

    #[test]
    fn test_empty_cart_view() {
        let view = CartView::empty();
        assert!(view.is_empty());
        assert_eq!(view.item_count, 0);
        assert!(!view.has_free_shipping());
    }
}
