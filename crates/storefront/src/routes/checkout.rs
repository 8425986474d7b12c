//! Checkout route handlers.
//!
//! `/kasse` collects the delivery address for the current cart and places a
//! web order on the backend. With a payment key configured the order is
//! paid by card right away; otherwise it is placed for bank transfer and the
//! customer lands on the order page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use rinos_core::{
    Cart, CheckoutForm, Country, CreatedOrder, FieldError, OrderRequest, PaymentMethod, User,
    format_eur,
};
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::BackendError;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::layout::Layout;
use crate::routes::cart::CartView;
use crate::session::{AuthSession, CartSession, set_cart_count};
use crate::state::AppState;

/// Form values and per-field errors for re-rendering.
#[derive(Debug, Clone, Default)]
pub struct CheckoutFormView {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub street: String,
    pub postal_code: String,
    pub city: String,
    /// Selected country code.
    pub country: String,
    pub errors: Vec<FieldError>,
}

impl CheckoutFormView {
    /// Empty form, prefilled from the account when logged in.
    #[must_use]
    pub fn for_user(user: Option<&User>) -> Self {
        let mut view = Self {
            country: Country::default().code().to_string(),
            ..Self::default()
        };
        if let Some(user) = user {
            view.first_name = user.first_name.clone().unwrap_or_default();
            view.last_name = user.last_name.clone().unwrap_or_default();
            view.email.clone_from(&user.email);
            view.phone = user.phone.clone().unwrap_or_default();
        }
        view
    }

    /// Submitted values with the errors found in them.
    #[must_use]
    pub fn with_errors(form: CheckoutForm, errors: Vec<FieldError>) -> Self {
        let country = Country::from_form(&form.country)
            .unwrap_or_default()
            .code()
            .to_string();
        Self {
            first_name: form.first_name,
            last_name: form.last_name,
            email: form.email,
            phone: form.phone,
            street: form.street,
            postal_code: form.postal_code,
            city: form.city,
            country,
            errors,
        }
    }

    /// Message for one field, if it failed validation.
    #[must_use]
    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message)
    }

    #[must_use]
    pub fn countries(&self) -> [Country; 3] {
        Country::ALL
    }
}

/// Checkout form page.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/form.html")]
pub struct CheckoutTemplate {
    pub layout: Layout,
    pub cart: CartView,
    pub form: CheckoutFormView,
    pub error: Option<String>,
    pub pays_by_card: bool,
}

/// Card payment step after the order was placed.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/payment.html")]
pub struct PaymentTemplate {
    pub layout: Layout,
    pub order_number: String,
    pub total: String,
    pub publishable_key: String,
    pub client_secret: String,
    pub return_url: String,
}

fn payment_method(state: &AppState) -> PaymentMethod {
    if state.config().stripe_publishable_key.is_some() {
        PaymentMethod::Stripe
    } else {
        PaymentMethod::BankTransfer
    }
}

/// Where the payment provider sends the customer back to.
fn order_url(base_url: &str, order: &CreatedOrder) -> String {
    format!("{}/order/{}", base_url.trim_end_matches('/'), order.web_order_id)
}

fn render_form(
    state: &AppState,
    layout: Layout,
    cart: &Cart,
    form: CheckoutFormView,
    error: Option<String>,
    status: StatusCode,
) -> Response {
    (
        status,
        CheckoutTemplate {
            layout,
            cart: CartView::from(cart),
            form,
            error,
            pays_by_card: payment_method(state) == PaymentMethod::Stripe,
        },
    )
        .into_response()
}

/// Display the checkout form. An empty cart goes back to the cart page.
#[instrument(skip(state, layout, auth, cart_session))]
pub async fn show(
    State(state): State<AppState>,
    mut layout: Layout,
    auth: AuthSession,
    cart_session: CartSession,
) -> Result<Response> {
    let cart = state
        .backend()
        .get_cart(&cart_session.session_id, auth.bearer())
        .await?;
    if cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    layout.cart_count = cart.item_count();
    let form = CheckoutFormView::for_user(auth.user.as_ref());
    Ok(render_form(&state, layout, &cart, form, None, StatusCode::OK))
}

/// Place the order.
///
/// Invalid input re-renders the form with 422. After the order exists the
/// cart is emptied; a failed card payment setup still ends on the order
/// page, where the order can be paid later.
#[instrument(skip(state, session, layout, auth, cart_session, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    mut layout: Layout,
    auth: AuthSession,
    cart_session: CartSession,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let cart = state
        .backend()
        .get_cart(&cart_session.session_id, auth.bearer())
        .await?;
    layout.cart_count = cart.item_count();

    let customer = match form.validate() {
        Ok(customer) => customer,
        Err(errors) => {
            let view = CheckoutFormView::with_errors(form, errors);
            return Ok(render_form(
                &state,
                layout,
                &cart,
                view,
                None,
                StatusCode::UNPROCESSABLE_ENTITY,
            ));
        }
    };

    let Some(order) = OrderRequest::from_cart(&cart, customer, payment_method(&state)) else {
        return Ok(Redirect::to("/cart").into_response());
    };

    let created = match state.backend().create_order(&order, auth.bearer()).await {
        Ok(created) => created,
        Err(BackendError::Unauthorized) => return Err(AppError::SessionExpired),
        Err(e) => {
            let (status, message) = match e.client_message() {
                Some(detail) => {
                    tracing::info!(error = %e, "Order rejected");
                    (StatusCode::UNPROCESSABLE_ENTITY, detail.to_string())
                }
                None => {
                    tracing::error!(error = %e, "Failed to place order");
                    (
                        StatusCode::BAD_GATEWAY,
                        "Die Bestellung konnte nicht aufgegeben werden. Bitte versuchen Sie es erneut."
                            .to_string(),
                    )
                }
            };
            let view = CheckoutFormView::with_errors(form, Vec::new());
            return Ok(render_form(&state, layout, &cart, view, Some(message), status));
        }
    };

    let order_id = created.web_order_id.to_string();
    tracing::info!(order_id = %order_id, ordernr = %created.ordernr, "Order placed");
    add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order_id.as_str())]));

    if let Err(e) = state
        .backend()
        .clear_cart(&cart_session.session_id, auth.bearer())
        .await
    {
        tracing::warn!(error = %e, "Failed to clear cart after order");
    }
    if let Err(e) = set_cart_count(&session, 0).await {
        tracing::error!(error = %e, "Failed to save cart count to session");
    }
    layout.cart_count = 0;

    let order_page = format!("/order/{order_id}");
    let Some(publishable_key) = state.config().stripe_publishable_key.clone() else {
        return Ok(Redirect::to(&order_page).into_response());
    };

    let return_url = order_url(&state.config().base_url, &created);
    match state
        .backend()
        .create_payment_intent(created.web_order_id, &return_url, auth.bearer())
        .await
    {
        Ok(intent) => Ok(PaymentTemplate {
            layout,
            order_number: created.ordernr,
            total: format_eur(order.total_amount),
            publishable_key,
            client_secret: intent.client_secret,
            return_url,
        }
        .into_response()),
        Err(e) => {
            tracing::warn!(error = %e, order_id = %order_id, "Failed to start card payment");
            Ok(Redirect::to(&order_page).into_response())
        }
    }
}
