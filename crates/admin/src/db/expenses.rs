//! Expense repository.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use stockroom_core::{ExpenseId, PurchaseOrderId, UserId};

use super::{Page, RepositoryError};
use crate::models::{CategoryTotal, Expense, ExpenseFilter, ExpenseInput};

/// Repository for expense database operations.
pub struct ExpenseRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ExpenseRepository<'a> {
    /// Create a new expense repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's expenses, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        user_id: UserId,
        filter: &ExpenseFilter,
    ) -> Result<Vec<Expense>, RepositoryError> {
        let page = Page::new(filter.limit, filter.offset);

        let expenses = sqlx::query_as::<_, Expense>(
            r"
            SELECT id, user_id, description, category, amount, expense_date, vendor,
                   purchase_order_id, notes, created_at, updated_at
            FROM backoffice.expense
            WHERE user_id = $1
              AND deleted_at IS NULL
              AND ($2::backoffice.expense_category IS NULL OR category = $2)
              AND ($3::date IS NULL OR expense_date >= $3)
              AND ($4::date IS NULL OR expense_date <= $4)
            ORDER BY expense_date DESC, id DESC
            LIMIT $5 OFFSET $6
            ",
        )
        .bind(user_id)
        .bind(filter.category)
        .bind(filter.from)
        .bind(filter.to)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.pool)
        .await?;

        Ok(expenses)
    }

    /// Get one of a user's expenses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        user_id: UserId,
        id: ExpenseId,
    ) -> Result<Option<Expense>, RepositoryError> {
        let expense = sqlx::query_as::<_, Expense>(
            r"
            SELECT id, user_id, description, category, amount, expense_date, vendor,
                   purchase_order_id, notes, created_at, updated_at
            FROM backoffice.expense
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            ",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(expense)
    }

    /// Record an expense.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        input: &ExpenseInput,
    ) -> Result<Expense, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        create_in(&mut conn, user_id, input).await
    }

    /// Replace an expense's fields. The purchase order link is kept.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the expense does not exist.
    pub async fn update(
        &self,
        user_id: UserId,
        id: ExpenseId,
        input: &ExpenseInput,
    ) -> Result<Expense, RepositoryError> {
        let expense = sqlx::query_as::<_, Expense>(
            r"
            UPDATE backoffice.expense
            SET description = $3,
                category = $4,
                amount = $5,
                expense_date = $6,
                vendor = $7,
                notes = $8,
                updated_at = now()
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            RETURNING id, user_id, description, category, amount, expense_date, vendor,
                      purchase_order_id, notes, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(user_id)
        .bind(&input.description)
        .bind(input.category)
        .bind(input.amount)
        .bind(input.expense_date)
        .bind(&input.vendor)
        .bind(&input.notes)
        .fetch_optional(self.pool)
        .await?;

        expense.ok_or(RepositoryError::NotFound)
    }

    /// Soft-delete an expense. Returns `false` if there was nothing to delete.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn soft_delete(&self, user_id: UserId, id: ExpenseId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE backoffice.expense
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

    /// Totals per category between two optional dates (inclusive).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn totals_by_category(
        &self,
        user_id: UserId,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<CategoryTotal>, RepositoryError> {
        let totals = sqlx::query_as::<_, CategoryTotal>(
            r"
            SELECT category, SUM(amount) AS total, COUNT(*) AS count
            FROM backoffice.expense
            WHERE user_id = $1
              AND deleted_at IS NULL
              AND ($2::date IS NULL OR expense_date >= $2)
              AND ($3::date IS NULL OR expense_date <= $3)
            GROUP BY category
            ORDER BY total DESC, category
            ",
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(self.pool)
        .await?;

        Ok(totals)
    }

    /// Sum of expenses dated in `[from, until)`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn total_between(
        &self,
        user_id: UserId,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Decimal, RepositoryError> {
        let total = sqlx::query_scalar::<_, Decimal>(
            r"
            SELECT COALESCE(SUM(amount), 0)
            FROM backoffice.expense
            WHERE user_id = $1
              AND deleted_at IS NULL
              AND expense_date >= $2
              AND expense_date < $3
            ",
        )
        .bind(user_id)
        .bind(from)
        .bind(until)
        .fetch_one(self.pool)
        .await?;

        Ok(total)
    }
}

/// Insert an expense on an open connection (normally a transaction).
pub(crate) async fn create_in(
    conn: &mut PgConnection,
    user_id: UserId,
    input: &ExpenseInput,
) -> Result<Expense, RepositoryError> {
    let expense = sqlx::query_as::<_, Expense>(
        r"
        INSERT INTO backoffice.expense (
            user_id, description, category, amount, expense_date, vendor,
            purchase_order_id, notes
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, user_id, description, category, amount, expense_date, vendor,
                  purchase_order_id, notes, created_at, updated_at
        ",
    )
    .bind(user_id)
    .bind(&input.description)
    .bind(input.category)
    .bind(input.amount)
    .bind(input.expense_date)
    .bind(&input.vendor)
    .bind(input.purchase_order_id)
    .bind(&input.notes)
    .fetch_one(&mut *conn)
    .await?;

    Ok(expense)
}

/// Live expenses already booked against a purchase order.
pub(crate) async fn count_for_purchase_order_in(
    conn: &mut PgConnection,
    user_id: UserId,
    purchase_order_id: PurchaseOrderId,
) -> Result<i64, RepositoryError> {
    let count = sqlx::query_scalar::<_, i64>(
        r"
        SELECT COUNT(*)
        FROM backoffice.expense
        WHERE user_id = $1 AND purchase_order_id = $2 AND deleted_at IS NULL
        ",
    )
    .bind(user_id)
    .bind(purchase_order_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(count)
}
