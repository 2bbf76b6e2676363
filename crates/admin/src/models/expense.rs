//! Expense records and their request/summary shapes.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockroom_core::validation::{
    ValidationError, optional_text, require_date_order, require_non_empty,
    require_positive_amount,
};
use stockroom_core::{ExpenseCategory, ExpenseId, PurchaseOrderId, UserId};

/// A recorded expense.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Expense {
    pub id: ExpenseId,
    pub user_id: UserId,
    pub description: String,
    pub category: ExpenseCategory,
    pub amount: Decimal,
    pub expense_date: NaiveDate,
    pub vendor: Option<String>,
    pub purchase_order_id: Option<PurchaseOrderId>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/expenses` and `PUT /api/expenses/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExpenseRequest {
    pub description: String,
    pub category: ExpenseCategory,
    pub amount: Decimal,
    pub expense_date: NaiveDate,
    pub vendor: Option<String>,
    pub notes: Option<String>,
}

/// A validated expense ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseInput {
    pub description: String,
    pub category: ExpenseCategory,
    pub amount: Decimal,
    pub expense_date: NaiveDate,
    pub vendor: Option<String>,
    pub purchase_order_id: Option<PurchaseOrderId>,
    pub notes: Option<String>,
}

impl ExpenseRequest {
    /// Check and normalize the request.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(self) -> Result<ExpenseInput, ValidationError> {
        let description = require_non_empty("description", &self.description, 500)?;
        require_positive_amount("amount", self.amount)?;

        Ok(ExpenseInput {
            description,
            category: self.category,
            amount: self.amount,
            expense_date: self.expense_date,
            vendor: optional_text(self.vendor.as_deref()),
            purchase_order_id: None,
            notes: optional_text(self.notes.as_deref()),
        })
    }
}

/// Query string of `GET /api/expenses`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseFilter {
    pub category: Option<ExpenseCategory>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ExpenseFilter {
    /// Reject an inverted date range.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when `to` precedes `from`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.from {
            Some(from) => require_date_order("to", from, self.to),
            None => Ok(()),
        }
    }
}

/// Total spent in one category.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryTotal {
    pub category: ExpenseCategory,
    pub total: Decimal,
    pub count: i64,
}

/// Response of `GET /api/expenses/summary`.
#[derive(Debug, Clone, Serialize)]
pub struct ExpenseSummary {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub categories: Vec<CategoryTotal>,
    pub total: Decimal,
    pub count: i64,
}

impl ExpenseSummary {
    /// Add up per-category totals into a summary.
    #[must_use]
    pub fn from_totals(
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        categories: Vec<CategoryTotal>,
    ) -> Self {
        let total = categories.iter().map(|c| c.total).sum();
        let count = categories.iter().map(|c| c.count).sum();
        Self {
            from,
            to,
            categories,
            total,
            count,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request() -> ExpenseRequest {
        ExpenseRequest {
            description: "  Bubble mailers ".to_string(),
            category: ExpenseCategory::Packaging,
            amount: Decimal::new(1999, 2),
            expense_date: NaiveDate::from_ymd_opt(2026, 5, 4).unwrap(),
            vendor: Some("   ".to_string()),
            notes: Some("box of 100".to_string()),
        }
    }

    #[test]
    fn test_validate_normalizes_text() {
        let input = request().validate().unwrap();
        assert_eq!(input.description, "Bubble mailers");
        assert_eq!(input.vendor, None);
        assert_eq!(input.notes.as_deref(), Some("box of 100"));
        assert_eq!(input.purchase_order_id, None);
    }

    #[test]
    fn test_validate_rejects_zero_amount() {
        let mut req = request();
        req.amount = Decimal::ZERO;
        assert_eq!(req.validate().unwrap_err().field, "amount");
    }

    #[test]
    fn test_validate_rejects_blank_description() {
        let mut req = request();
        req.description = " ".to_string();
        assert_eq!(req.validate().unwrap_err().field, "description");
    }

    #[test]
    fn test_request_deserializes_amount_from_string_or_number() {
        let json = r#"{"description":"Label printer","category":"software",
            "amount":"149.00","expense_date":"2026-01-15"}"#;
        let req: ExpenseRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.amount, Decimal::new(14900, 2));
        assert_eq!(req.vendor, None);

        let json = r#"{"description":"Ads","category":"marketing",
            "amount":12.5,"expense_date":"2026-01-15"}"#;
        let req: ExpenseRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.amount, Decimal::new(125, 1));
    }

    #[test]
    fn test_filter_rejects_inverted_range() {
        let filter = ExpenseFilter {
            from: NaiveDate::from_ymd_opt(2026, 2, 1),
            to: NaiveDate::from_ymd_opt(2026, 1, 1),
            ..ExpenseFilter::default()
        };
        assert_eq!(filter.validate().unwrap_err().field, "to");
    }

    #[test]
    fn test_summary_adds_categories() {
        let summary = ExpenseSummary::from_totals(
            None,
            None,
            vec![
                CategoryTotal {
                    category: ExpenseCategory::Shipping,
                    total: Decimal::new(1050, 2),
                    count: 2,
                },
                CategoryTotal {
                    category: ExpenseCategory::Fees,
                    total: Decimal::new(250, 2),
                    count: 1,
                },
            ],
        );
        assert_eq!(summary.total, Decimal::new(1300, 2));
        assert_eq!(summary.count, 3);
    }
}
