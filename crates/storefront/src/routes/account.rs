//! Customer account route handlers.
//!
//! Profile and order history need a login; an order detail page can also be
//! opened by a guest who has the link from their confirmation.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use rinos_core::{Order, OrderId, OrderItem, User, format_eur};
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::BackendError;
use crate::error::{AppError, Result};
use crate::filters;
use crate::layout::Layout;
use crate::middleware::RequireAuth;
use crate::session::{AuthSession, update_user};
use crate::state::AppState;

/// Order line display data for templates.
#[derive(Debug, Clone)]
pub struct OrderItemView {
    pub articlenr: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
    pub total: String,
}

impl From<&OrderItem> for OrderItemView {
    fn from(item: &OrderItem) -> Self {
        Self {
            articlenr: item.articlenr.clone(),
            name: item
                .articlename
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| item.articlenr.clone()),
            quantity: item.quantity,
            unit_price: format_eur(item.price_per_unit),
            total: format_eur(item.total_price),
        }
    }
}

/// Order display data for templates.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub href: String,
    pub ordernr: String,
    pub date: String,
    pub amount: String,
    pub status_label: &'static str,
    pub status_class: &'static str,
    pub items: Vec<OrderItemView>,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            href: format!("/order/{}", order.web_order_id),
            ordernr: if order.ordernr.is_empty() {
                order.web_order_id.to_string()
            } else {
                order.ordernr.clone()
            },
            date: order.created_date().unwrap_or_else(|| "-".to_string()),
            amount: order.amount().display(),
            status_label: order.payment_status.label(),
            status_class: order.payment_status.css_class(),
            items: order.items.iter().map(OrderItemView::from).collect(),
        }
    }
}

/// Profile display data for templates.
#[derive(Debug, Clone)]
pub struct ProfileView {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub member_since: Option<String>,
    pub email_verified: bool,
}

impl From<&User> for ProfileView {
    fn from(user: &User) -> Self {
        Self {
            name: user.display_name(),
            email: user.email.clone(),
            phone: user.phone.clone().filter(|p| !p.trim().is_empty()),
            member_since: user.member_since(),
            email_verified: user.email_verified,
        }
    }
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub layout: Layout,
    pub profile: ProfileView,
    pub orders: Vec<OrderView>,
    pub orders_error: bool,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub layout: Layout,
    pub orders: Vec<OrderView>,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "account/order.html")]
pub struct OrderTemplate {
    pub layout: Layout,
    pub order: OrderView,
}

/// Orders of the customer. Only an expired token is an error; anything else
/// leaves the list empty and flags it.
async fn load_orders(state: &AppState, auth: &RequireAuth) -> Result<(Vec<OrderView>, bool)> {
    match state.backend().list_orders(&auth.token).await {
        Ok(orders) => Ok((orders.iter().map(OrderView::from).collect(), false)),
        Err(BackendError::Unauthorized) => Err(AppError::SessionExpired),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load orders");
            Ok((Vec::new(), true))
        }
    }
}

/// Display the profile with the order history.
///
/// The cached profile is refreshed from the backend on every visit.
#[instrument(skip_all)]
pub async fn profile(
    State(state): State<AppState>,
    session: Session,
    mut layout: Layout,
    auth: RequireAuth,
) -> Result<ProfileTemplate> {
    let user = match state.backend().current_user(&auth.token).await {
        Ok(user) => {
            if user != auth.user
                && let Err(e) = update_user(&session, &user).await
            {
                tracing::error!(error = %e, "Failed to refresh cached user");
            }
            user
        }
        Err(BackendError::Unauthorized) => return Err(AppError::SessionExpired),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to refresh user, using cached profile");
            auth.user.clone()
        }
    };
    layout.user_name = Some(user.display_name());

    let (orders, orders_error) = load_orders(&state, &auth).await?;

    Ok(ProfileTemplate {
        layout,
        profile: ProfileView::from(&user),
        orders,
        orders_error,
    })
}

/// Display the order history.
#[instrument(skip_all)]
pub async fn orders(
    State(state): State<AppState>,
    layout: Layout,
    auth: RequireAuth,
) -> Result<OrdersTemplate> {
    let orders = state.backend().list_orders(&auth.token).await?;
    Ok(OrdersTemplate {
        layout,
        orders: orders.iter().map(OrderView::from).collect(),
    })
}

/// Display one order.
#[instrument(skip(state, layout, auth))]
pub async fn order(
    State(state): State<AppState>,
    layout: Layout,
    auth: AuthSession,
    Path(id): Path<String>,
) -> Result<OrderTemplate> {
    let order_id: OrderId = id
        .parse()
        .map_err(|_| AppError::NotFound(format!("order {id}")))?;
    let order = state.backend().get_order(order_id, auth.bearer()).await?;

    Ok(OrderTemplate {
        layout,
        order: OrderView::from(&order),
    })
}
