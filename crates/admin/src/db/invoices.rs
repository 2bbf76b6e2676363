//! Invoice repository.

use sqlx::PgPool;

use stockroom_core::{Email, InvoiceId, InvoiceStatus, UserId};

use super::{Page, RepositoryError};
use crate::models::{Invoice, InvoiceInput};

const DUPLICATE_NUMBER: &str = "an invoice with this number already exists";

/// Repository for invoice database operations.
pub struct InvoiceRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> InvoiceRepository<'a> {
    /// Create a new invoice repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's invoices, newest first, optionally by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        user_id: UserId,
        status: Option<InvoiceStatus>,
        page: Page,
    ) -> Result<Vec<Invoice>, RepositoryError> {
        let invoices = sqlx::query_as::<_, Invoice>(
            r"
            SELECT id, user_id, invoice_number, customer_name, customer_email, issue_date,
                   due_date, status, subtotal, tax, total, notes, paid_at, created_at, updated_at
            FROM backoffice.invoice
            WHERE user_id = $1
              AND deleted_at IS NULL
              AND ($2::backoffice.invoice_status IS NULL OR status = $2)
            ORDER BY issue_date DESC, id DESC
            LIMIT $3 OFFSET $4
            ",
        )
        .bind(user_id)
        .bind(status)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.pool)
        .await?;

        Ok(invoices)
    }

    /// Get one of a user's invoices.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        user_id: UserId,
        id: InvoiceId,
    ) -> Result<Option<Invoice>, RepositoryError> {
        let invoice = sqlx::query_as::<_, Invoice>(
            r"
            SELECT id, user_id, invoice_number, customer_name, customer_email, issue_date,
                   due_date, status, subtotal, tax, total, notes, paid_at, created_at, updated_at
            FROM backoffice.invoice
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            ",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(invoice)
    }

    /// Create a draft invoice.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the invoice number is taken.
    pub async fn create(
        &self,
        user_id: UserId,
        input: &InvoiceInput,
    ) -> Result<Invoice, RepositoryError> {
        let invoice = sqlx::query_as::<_, Invoice>(
            r"
            INSERT INTO backoffice.invoice (
                user_id, invoice_number, customer_name, customer_email, issue_date,
                due_date, subtotal, tax, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, user_id, invoice_number, customer_name, customer_email, issue_date,
                      due_date, status, subtotal, tax, total, notes, paid_at, created_at,
                      updated_at
            ",
        )
        .bind(user_id)
        .bind(&input.invoice_number)
        .bind(&input.customer_name)
        .bind(input.customer_email.as_ref().map(Email::as_str))
        .bind(input.issue_date)
        .bind(input.due_date)
        .bind(input.subtotal)
        .bind(input.tax)
        .bind(&input.notes)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::on_unique_violation(e, DUPLICATE_NUMBER))?;

        Ok(invoice)
    }

    /// Replace a draft invoice's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no draft invoice matches.
    /// Returns `RepositoryError::Conflict` if the invoice number is taken.
    pub async fn update_draft(
        &self,
        user_id: UserId,
        id: InvoiceId,
        input: &InvoiceInput,
    ) -> Result<Invoice, RepositoryError> {
        let invoice = sqlx::query_as::<_, Invoice>(
            r"
            UPDATE backoffice.invoice
            SET invoice_number = $3,
                customer_name = $4,
                customer_email = $5,
                issue_date = $6,
                due_date = $7,
                subtotal = $8,
                tax = $9,
                notes = $10,
                updated_at = now()
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL AND status = 'draft'
            RETURNING id, user_id, invoice_number, customer_name, customer_email, issue_date,
                      due_date, status, subtotal, tax, total, notes, paid_at, created_at,
                      updated_at
            ",
        )
        .bind(id)
        .bind(user_id)
        .bind(&input.invoice_number)
        .bind(&input.customer_name)
        .bind(input.customer_email.as_ref().map(Email::as_str))
        .bind(input.issue_date)
        .bind(input.due_date)
        .bind(input.subtotal)
        .bind(input.tax)
        .bind(&input.notes)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::on_unique_violation(e, DUPLICATE_NUMBER))?;

        invoice.ok_or(RepositoryError::NotFound)
    }

    /// Move an invoice from `from` to `to`, stamping `paid_at` when it is paid.
    ///
    /// The `from` guard makes concurrent transitions fail rather than skip a state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the invoice is no longer in `from`.
    pub async fn transition(
        &self,
        user_id: UserId,
        id: InvoiceId,
        from: InvoiceStatus,
        to: InvoiceStatus,
    ) -> Result<Invoice, RepositoryError> {
        let invoice = sqlx::query_as::<_, Invoice>(
            r"
            UPDATE backoffice.invoice
            SET status = $4,
                paid_at = CASE WHEN $4 = 'paid'::backoffice.invoice_status THEN now() ELSE paid_at END,
                updated_at = now()
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL AND status = $3
            RETURNING id, user_id, invoice_number, customer_name, customer_email, issue_date,
                      due_date, status, subtotal, tax, total, notes, paid_at, created_at,
                      updated_at
            ",
        )
        .bind(id)
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_optional(self.pool)
        .await?;

        invoice.ok_or_else(|| {
            RepositoryError::Conflict(format!("invoice is no longer {from}"))
        })
    }

    /// Soft-delete an invoice. Returns `false` if there was nothing to delete.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn soft_delete(&self, user_id: UserId, id: InvoiceId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE backoffice.invoice
            SET deleted_at = now(), updated_at = now()
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            ",
        )
        .bind(id)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count of a user's invoices in `status`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_status(
        &self,
        user_id: UserId,
        status: InvoiceStatus,
    ) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*)
            FROM backoffice.invoice
            WHERE user_id = $1 AND status = $2 AND deleted_at IS NULL
            ",
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }
}
