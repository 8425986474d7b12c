//! Prices and German currency formatting.
//!
//! Amounts come from the backend as JSON numbers and are held as
//! [`Decimal`] so cart and order totals never pick up float noise.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (euros, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a euro price.
    #[must_use]
    pub const fn eur(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::EUR)
    }

    /// Format for display in the shop's locale (e.g., "1.299,00 €").
    #[must_use]
    pub fn display(&self) -> String {
        format_amount(self.amount, self.currency_code.symbol())
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes the backend reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    EUR,
    CHF,
    USD,
}

impl CurrencyCode {
    /// Parse a backend currency string, defaulting to EUR for unknown or
    /// missing values.
    #[must_use]
    pub fn from_code(code: Option<&str>) -> Self {
        match code.map(str::trim) {
            Some(c) if c.eq_ignore_ascii_case("CHF") => Self::CHF,
            Some(c) if c.eq_ignore_ascii_case("USD") => Self::USD,
            _ => Self::EUR,
        }
    }

    /// Currency symbol placed after the amount.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::EUR => "€",
            Self::CHF => "CHF",
            Self::USD => "$",
        }
    }
}

/// Format a euro amount the way de-DE does: `1.299,00 €`.
#[must_use]
pub fn format_eur(amount: Decimal) -> String {
    format_amount(amount, CurrencyCode::EUR.symbol())
}

fn format_amount(amount: Decimal, symbol: &str) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let plain = format!("{:.2}", rounded.abs());
    let (whole, fraction) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}{grouped},{fraction} {symbol}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_format_eur_small_amount() {
        assert_eq!(format_eur(dec("9.99")), "9,99 €");
    }

    #[test]
    fn test_format_eur_thousands_separator() {
        assert_eq!(format_eur(dec("1299")), "1.299,00 €");
        assert_eq!(format_eur(dec("1234567.5")), "1.234.567,50 €");
    }

    #[test]
    fn test_format_eur_rounds_half_away_from_zero() {
        assert_eq!(format_eur(dec("2.005")), "2,01 €");
    }

    #[test]
    fn test_format_eur_negative() {
        assert_eq!(format_eur(dec("-15.5")), "-15,50 €");
    }

    #[test]
    fn test_currency_from_code_defaults_to_eur() {
        assert_eq!(CurrencyCode::from_code(None), CurrencyCode::EUR);
        assert_eq!(CurrencyCode::from_code(Some("xyz")), CurrencyCode::EUR);
        assert_eq!(CurrencyCode::from_code(Some("chf")), CurrencyCode::CHF);
    }

    #[test]
    fn test_price_display_uses_symbol() {
        let price = Price::new(dec("10"), CurrencyCode::CHF);
        assert_eq!(price.to_string(), "10,00 CHF");
    }
}
