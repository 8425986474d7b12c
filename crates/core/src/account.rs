//! Customer accounts, orders and carts.

use chrono::{DateTime, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::null_as_default;
use crate::types::{CartId, CartItemId, CurrencyCode, OrderId, PaymentStatus, Price, UserId};

/// Largest quantity a single cart line may hold.
pub const MAX_ITEM_QUANTITY: u32 = 100;

/// German VAT applied to cart estimates.
pub const VAT_RATE: Decimal = Decimal::from_parts(19, 0, 0, false, 2);

/// Orders at or above this subtotal ship for free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Flat shipping fee below the free shipping threshold.
pub const SHIPPING_FEE: Decimal = Decimal::from_parts(999, 0, 0, false, 2);

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email_verified: bool,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_admin: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

const fn active_by_default() -> bool {
    true
}

impl User {
    /// Full name if known, else the email address.
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() {
            self.email.clone()
        } else {
            name
        }
    }

    /// Registration date as `dd.mm.yyyy`.
    #[must_use]
    pub fn member_since(&self) -> Option<String> {
        self.created_at.as_deref().and_then(format_backend_date)
    }
}

/// A web order placed through the shop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub web_order_id: OrderId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ordernr: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub orderamount: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub payment_status: PaymentStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub synced_to_erp: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<OrderItem>,
}

impl Order {
    #[must_use]
    pub fn amount(&self) -> Price {
        Price::new(
            self.orderamount,
            CurrencyCode::from_code(self.currency.as_deref()),
        )
    }

    /// Order date as `dd.mm.yyyy`.
    #[must_use]
    pub fn created_date(&self) -> Option<String> {
        self.created_at.as_deref().and_then(format_backend_date)
    }
}

/// A line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub articlenr: String,
    #[serde(default)]
    pub articlename: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub quantity: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price_per_unit: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_price: Decimal,
}

/// Server-side cart for a guest session or user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub cart_id: Option<CartId>,
    #[serde(default)]
    pub guest_session_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub summary: Option<CartSummary>,
}

impl Cart {
    /// Totals as reported by the backend, or estimated from the items when
    /// the backend omitted them.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        self.summary
            .clone()
            .unwrap_or_else(|| CartSummary::estimate(&self.items))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// A product line in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub cart_item_id: CartItemId,
    pub product: CartItemProduct,
    #[serde(default, deserialize_with = "null_as_default")]
    pub quantity: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price_at_addition: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subtotal: Decimal,
}

/// Product snapshot embedded in a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItemProduct {
    pub articlenr: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub articlename: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: Decimal,
    #[serde(default)]
    pub primary_image: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub colour: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default = "in_stock_by_default")]
    pub in_stock: bool,
}

const fn in_stock_by_default() -> bool {
    true
}

/// Cart totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSummary {
    #[serde(default, deserialize_with = "null_as_default")]
    pub subtotal: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tax_rate: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tax_amount: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub shipping: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub item_count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub unique_items: u32,
}

impl CartSummary {
    /// Estimate totals from cart lines: 19% VAT on top of the subtotal and a
    /// flat shipping fee below the free shipping threshold.
    #[must_use]
    pub fn estimate(items: &[CartItem]) -> Self {
        let subtotal: Decimal = items
            .iter()
            .map(|item| item.price_at_addition * Decimal::from(item.quantity))
            .sum();
        let tax_amount = (subtotal * VAT_RATE).round_dp(2);
        let shipping = if items.is_empty() || subtotal >= FREE_SHIPPING_THRESHOLD {
            Decimal::ZERO
        } else {
            SHIPPING_FEE
        };
        let unique_items = u32::try_from(items.len()).unwrap_or(u32::MAX);

        Self {
            subtotal,
            tax_rate: VAT_RATE,
            tax_amount,
            shipping,
            total: subtotal + tax_amount + shipping,
            item_count: items.iter().map(|item| item.quantity).sum(),
            unique_items,
        }
    }
}

/// Clamp a requested line quantity to `1..=MAX_ITEM_QUANTITY`.
#[must_use]
pub fn clamp_quantity(quantity: u32) -> u32 {
    quantity.clamp(1, MAX_ITEM_QUANTITY)
}

/// Format a backend timestamp as `dd.mm.yyyy`.
///
/// The backend emits both RFC 3339 timestamps and naive ISO timestamps
/// without an offset.
pub(crate) fn format_backend_date(raw: &str) -> Option<String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.format("%d.%m.%Y").to_string());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.format("%d.%m.%Y").to_string())
}
