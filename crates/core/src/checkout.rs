//! Checkout: customer details, the web order payload and payment intents.
//!
//! The storefront turns the server-side cart plus the checkout form into an
//! [`OrderRequest`] for `POST /web-orders/`. Totals are taken from the cart
//! summary so the order matches what the customer saw.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::account::Cart;
use crate::catalog::null_as_default;
use crate::types::{Email, OrderId, PaymentStatus};

/// Countries the shop delivers to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Country {
    #[default]
    #[serde(rename = "DE")]
    Germany,
    #[serde(rename = "AT")]
    Austria,
    #[serde(rename = "CH")]
    Switzerland,
}

impl Country {
    /// Every delivery country, in form order.
    pub const ALL: [Self; 3] = [Self::Germany, Self::Austria, Self::Switzerland];

    /// ISO 3166-1 alpha-2 code, as the backend stores it.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Germany => "DE",
            Self::Austria => "AT",
            Self::Switzerland => "CH",
        }
    }

    /// German display name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Germany => "Deutschland",
            Self::Austria => "Österreich",
            Self::Switzerland => "Schweiz",
        }
    }

    /// Parse a form value (code or German name).
    #[must_use]
    pub fn from_form(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(value) || c.label() == value)
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Card payment through the payment provider.
    Stripe,
    /// Prepayment by bank transfer.
    BankTransfer,
}

/// Checkout form fields as typed by the customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
}

/// Form field that failed validation, with its German message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl CheckoutForm {
    /// Validate the form into customer details.
    ///
    /// # Errors
    ///
    /// Returns every field that is missing or malformed, in form order.
    pub fn validate(&self) -> Result<CustomerInfo, Vec<FieldError>> {
        let mut errors = Vec::new();
        let mut required = |field: &'static str, value: &str, message: &'static str| {
            let value = value.trim();
            if value.is_empty() {
                errors.push(FieldError { field, message });
            }
            value.to_string()
        };

        let first_name = required("first_name", &self.first_name, "Vorname ist erforderlich");
        let last_name = required("last_name", &self.last_name, "Nachname ist erforderlich");
        let email = required("email", &self.email, "E-Mail ist erforderlich");
        let street = required("street", &self.street, "Adresse ist erforderlich");
        let postal_code =
            required("postal_code", &self.postal_code, "Postleitzahl ist erforderlich");
        let city = required("city", &self.city, "Stadt ist erforderlich");

        let email = if email.is_empty() {
            None
        } else if let Ok(email) = Email::parse(&email) {
            Some(email)
        } else {
            errors.push(FieldError {
                field: "email",
                message: "Ungültige E-Mail-Adresse",
            });
            None
        };

        let country = if self.country.trim().is_empty() {
            Some(Country::default())
        } else {
            Country::from_form(&self.country)
        };
        if country.is_none() {
            errors.push(FieldError {
                field: "country",
                message: "Wir liefern nur nach Deutschland, Österreich und in die Schweiz",
            });
        }

        match (email, country) {
            (Some(email), Some(country)) if errors.is_empty() => Ok(CustomerInfo {
                customer_frontname: first_name,
                customer_surname: last_name,
                customer_email: email.into_inner(),
                customer_telephone: Some(self.phone.trim().to_string()).filter(|p| !p.is_empty()),
                customer_adress: street,
                customer_postalcode: postal_code,
                customer_city: city,
                customer_country: country,
            }),
            _ => Err(errors),
        }
    }
}

/// Customer details in the backend's field naming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerInfo {
    pub customer_frontname: String,
    pub customer_surname: String,
    pub customer_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_telephone: Option<String>,
    pub customer_adress: String,
    pub customer_postalcode: String,
    pub customer_city: String,
    pub customer_country: Country,
}

/// One cart line as sent with the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub articlenr: String,
    pub articlename: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_at_addition: Decimal,
}

/// Body of `POST /web-orders/`. Amounts go out as JSON numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
    pub customer_info: CustomerInfo,
    pub cart_items: Vec<OrderLine>,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub shipping: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
}

impl OrderRequest {
    /// Build the order for a cart. Returns `None` for an empty cart.
    #[must_use]
    pub fn from_cart(
        cart: &Cart,
        customer_info: CustomerInfo,
        payment_method: PaymentMethod,
    ) -> Option<Self> {
        if cart.is_empty() {
            return None;
        }
        let summary = cart.summary();
        Some(Self {
            customer_info,
            cart_items: cart
                .items
                .iter()
                .map(|item| OrderLine {
                    articlenr: item.product.articlenr.clone(),
                    articlename: item.product.articlename.clone(),
                    quantity: item.quantity,
                    price_at_addition: item.price_at_addition,
                })
                .collect(),
            subtotal: summary.subtotal,
            tax_amount: summary.tax_amount,
            shipping: summary.shipping,
            total_amount: summary.total,
            payment_method,
        })
    }
}

/// Answer of `POST /web-orders/`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedOrder {
    pub web_order_id: OrderId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ordernr: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub orderamount: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub payment_status: PaymentStatus,
}

/// Answer of `POST /payments/create-payment-intent`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentIntent {
    pub payment_intent_id: String,
    pub client_secret: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub amount: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn filled_form() -> CheckoutForm {
        CheckoutForm {
            first_name: " Anna ".to_string(),
            last_name: "Berg".to_string(),
            email: "anna@example.de".to_string(),
            phone: String::new(),
            street: "Sattelweg 4".to_string(),
            postal_code: "80331".to_string(),
            city: "München".to_string(),
            country: "AT".to_string(),
        }
    }

    #[test]
    fn test_valid_form_maps_to_backend_fields() {
        let info = filled_form().validate().unwrap();
        assert_eq!(info.customer_frontname, "Anna");
        assert_eq!(info.customer_country, Country::Austria);
        assert_eq!(info.customer_telephone, None);

        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["customer_country"], "AT");
        assert_eq!(value["customer_adress"], "Sattelweg 4");
        assert!(value.get("customer_telephone").is_none());
    }

    #[test]
    fn test_missing_fields_are_all_reported() {
        let form = CheckoutForm {
            email: "kein-at-zeichen".to_string(),
            ..CheckoutForm::default()
        };
        let errors = form.validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["first_name", "last_name", "street", "postal_code", "city", "email"]
        );
        assert_eq!(errors[5].message, "Ungültige E-Mail-Adresse");
    }

    #[test]
    fn test_country_defaults_and_rejects_unknown() {
        let mut form = filled_form();
        form.country = String::new();
        assert_eq!(form.validate().unwrap().customer_country, Country::Germany);

        form.country = "Schweiz".to_string();
        assert_eq!(form.validate().unwrap().customer_country, Country::Switzerland);

        form.country = "FR".to_string();
        assert_eq!(form.validate().unwrap_err()[0].field, "country");
    }

    #[test]
    fn test_order_request_uses_cart_totals() {
        let cart: Cart = serde_json::from_value(json!({
            "items": [{
                "cart_item_id": 1,
                "product": { "articlenr": "HELM-M", "articlename": "Helm M", "price": 40 },
                "quantity": 2,
                "price_at_addition": 40
            }]
        }))
        .unwrap();

        let order = OrderRequest::from_cart(
            &cart,
            filled_form().validate().unwrap(),
            PaymentMethod::Stripe,
        )
        .unwrap();

        assert_eq!(order.cart_items[0].articlenr, "HELM-M");
        assert_eq!(order.subtotal, Decimal::from(80));
        assert_eq!(order.tax_amount, Decimal::new(1520, 2));
        assert_eq!(order.shipping, Decimal::new(999, 2));
        assert_eq!(order.total_amount, Decimal::new(10519, 2));

        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["payment_method"], "stripe");
        assert_eq!(value["total_amount"], json!(105.19));
        assert_eq!(value["cart_items"][0]["price_at_addition"], json!(40.0));
    }

    #[test]
    fn test_empty_cart_has_no_order() {
        let info = filled_form().validate().unwrap();
        assert!(OrderRequest::from_cart(&Cart::default(), info, PaymentMethod::BankTransfer).is_none());
    }
}
