//! Customer invoices.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockroom_core::validation::{
    ValidationError, optional_text, require_date_order, require_non_empty, require_non_negative,
};
use stockroom_core::{Email, InvoiceId, InvoiceStatus, UserId};

/// An invoice. `total` is computed by the database as `subtotal + tax`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Invoice {
    pub id: InvoiceId,
    pub user_id: UserId,
    pub invoice_number: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub notes: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Sent but unpaid past its due date.
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status == InvoiceStatus::Sent && self.due_date < today
    }
}

/// Body of `POST /api/invoices` and `PUT /api/invoices/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceRequest {
    pub invoice_number: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub subtotal: Decimal,
    #[serde(default)]
    pub tax: Decimal,
    pub notes: Option<String>,
}

/// A validated invoice ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceInput {
    pub invoice_number: String,
    pub customer_name: String,
    pub customer_email: Option<Email>,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub notes: Option<String>,
}

impl InvoiceRequest {
    /// Check and normalize the request.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(self) -> Result<InvoiceInput, ValidationError> {
        let invoice_number = require_non_empty("invoice_number", &self.invoice_number, 64)?;
        let customer_name = require_non_empty("customer_name", &self.customer_name, 200)?;
        let customer_email = optional_text(self.customer_email.as_deref())
            .map(|raw| Email::parse(&raw))
            .transpose()
            .map_err(|e| ValidationError::new("customer_email", e.to_string()))?;
        require_date_order("due_date", self.issue_date, Some(self.due_date))?;
        require_non_negative("subtotal", self.subtotal)?;
        require_non_negative("tax", self.tax)?;

        Ok(InvoiceInput {
            invoice_number,
            customer_name,
            customer_email,
            issue_date: self.issue_date,
            due_date: self.due_date,
            subtotal: self.subtotal,
            tax: self.tax,
            notes: optional_text(self.notes.as_deref()),
        })
    }
}

/// Body of `POST /api/invoices/{id}/status`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct InvoiceStatusRequest {
    pub status: InvoiceStatus,
}
