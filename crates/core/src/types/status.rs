//! Status enums reported by the backend.

use serde::{Deserialize, Serialize};

/// Payment status of a web order.
///
/// The backend writes free-form strings; anything other than the three
/// known values lands in [`PaymentStatus::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    #[serde(other)]
    Other,
}

impl PaymentStatus {
    /// Customer-facing label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Ausstehend",
            Self::Paid => "Bezahlt",
            Self::Failed => "Fehlgeschlagen",
            Self::Other => "In Bearbeitung",
        }
    }

    /// CSS modifier used by the order badges.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Pending => "status-pending",
            Self::Paid => "status-paid",
            Self::Failed => "status-failed",
            Self::Other => "status-other",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_known_statuses_deserialize() {
        let paid: PaymentStatus = serde_json::from_str("\"paid\"").unwrap();
        assert_eq!(paid, PaymentStatus::Paid);
        let failed: PaymentStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(failed, PaymentStatus::Failed);
    }

    #[test]
    fn test_unknown_status_maps_to_other() {
        let refunded: PaymentStatus = serde_json::from_str("\"refunded\"").unwrap();
        assert_eq!(refunded, PaymentStatus::Other);
        assert_eq!(refunded.label(), "In Bearbeitung");
    }
}
