//! Status and category enums for back-office records.
//!
//! The lifecycle rules live here so request handlers, repositories and
//! tests all agree on which transitions are legal.

use serde::{Deserialize, Serialize};

/// Bookkeeping category of an expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "backoffice.expense_category", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    Inventory,
    Packaging,
    Shipping,
    Fees,
    Software,
    Marketing,
    Other,
}

impl ExpenseCategory {
    /// Every category, in display order.
    pub const ALL: [Self; 7] = [
        Self::Inventory,
        Self::Packaging,
        Self::Shipping,
        Self::Fees,
        Self::Software,
        Self::Marketing,
        Self::Other,
    ];

    /// The snake_case name used in the database and the API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inventory => "inventory",
            Self::Packaging => "packaging",
            Self::Shipping => "shipping",
            Self::Fees => "fees",
            Self::Software => "software",
            Self::Marketing => "marketing",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExpenseCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("invalid expense category: {s}"))
    }
}

/// Invoice lifecycle.
///
/// ```text
/// draft ──> sent ──> paid
///   │         │
///   └──> void <┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "backoffice.invoice_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Sent,
    Paid,
    Void,
}

impl InvoiceStatus {
    /// Whether an invoice in this status may move to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Sent | Self::Void) | (Self::Sent, Self::Paid | Self::Void)
        )
    }

    /// Only drafts can have their contents edited.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Draft)
    }

    /// The snake_case name used in the database and the API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Paid => "paid",
            Self::Void => "void",
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Purchase order lifecycle.
///
/// ```text
/// draft ──> ordered ──> received
///   │          │
///   └─> cancelled <┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "backoffice.po_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    #[default]
    Draft,
    Ordered,
    Received,
    Cancelled,
}

impl PurchaseOrderStatus {
    /// Whether a purchase order in this status may move to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Ordered | Self::Cancelled)
                | (Self::Ordered, Self::Received | Self::Cancelled)
        )
    }

    /// Only drafts can have their header and items replaced.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Draft)
    }

    /// The snake_case name used in the database and the API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Ordered => "ordered",
            Self::Received => "received",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which eBay deployment an account is connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "backoffice.ebay_environment", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum EbayEnvironment {
    #[default]
    Sandbox,
    Production,
}

impl EbayEnvironment {
    /// Host serving the user-facing consent page.
    #[must_use]
    pub const fn auth_host(self) -> &'static str {
        match self {
            Self::Sandbox => "https://auth.sandbox.ebay.com",
            Self::Production => "https://auth.ebay.com",
        }
    }

    /// Host serving the REST APIs and the token endpoint.
    #[must_use]
    pub const fn api_host(self) -> &'static str {
        match self {
            Self::Sandbox => "https://api.sandbox.ebay.com",
            Self::Production => "https://api.ebay.com",
        }
    }

    /// The snake_case name used in the database and the API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sandbox => "sandbox",
            Self::Production => "production",
        }
    }
}

impl std::fmt::Display for EbayEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EbayEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sandbox" => Ok(Self::Sandbox),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(format!("invalid eBay environment: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_transitions() {
        use InvoiceStatus::{Draft, Paid, Sent, Void};

        assert!(Draft.can_transition_to(Sent));
        assert!(Draft.can_transition_to(Void));
        assert!(Sent.can_transition_to(Paid));
        assert!(Sent.can_transition_to(Void));

        assert!(!Draft.can_transition_to(Paid));
        assert!(!Paid.can_transition_to(Void));
        assert!(!Void.can_transition_to(Draft));
        assert!(!Sent.can_transition_to(Sent));
    }

    #[test]
    fn test_terminal_invoice_states_have_no_exits() {
        for terminal in [InvoiceStatus::Paid, InvoiceStatus::Void] {
            for next in [
                InvoiceStatus::Draft,
                InvoiceStatus::Sent,
                InvoiceStatus::Paid,
                InvoiceStatus::Void,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_purchase_order_transitions() {
        use PurchaseOrderStatus::{Cancelled, Draft, Ordered, Received};

        assert!(Draft.can_transition_to(Ordered));
        assert!(Draft.can_transition_to(Cancelled));
        assert!(Ordered.can_transition_to(Received));
        assert!(Ordered.can_transition_to(Cancelled));

        assert!(!Draft.can_transition_to(Received));
        assert!(!Received.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Ordered));
    }

    #[test]
    fn test_only_drafts_are_editable() {
        assert!(PurchaseOrderStatus::Draft.is_editable());
        assert!(!PurchaseOrderStatus::Ordered.is_editable());
        assert!(InvoiceStatus::Draft.is_editable());
        assert!(!InvoiceStatus::Sent.is_editable());
    }

    #[test]
    fn test_expense_category_round_trips_through_str() {
        for category in ExpenseCategory::ALL {
            assert_eq!(category.as_str().parse::<ExpenseCategory>(), Ok(category));
        }
        assert!("groceries".parse::<ExpenseCategory>().is_err());
    }

    #[test]
    fn test_status_serde_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&PurchaseOrderStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
        let status: InvoiceStatus = serde_json::from_str("\"paid\"").unwrap();
        assert_eq!(status, InvoiceStatus::Paid);
    }

    #[test]
    fn test_ebay_environment_hosts() {
        assert_eq!(
            EbayEnvironment::Sandbox.api_host(),
            "https://api.sandbox.ebay.com"
        );
        assert_eq!(
            EbayEnvironment::Production.auth_host(),
            "https://auth.ebay.com"
        );
        assert_eq!(
            "PRODUCTION".parse::<EbayEnvironment>(),
            Ok(EbayEnvironment::Production)
        );
    }
}
