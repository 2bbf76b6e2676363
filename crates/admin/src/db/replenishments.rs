//! Stock replenishment and cost-of-goods recalculation.
//!
//! A replenishment locks the stock row (`SELECT ... FOR UPDATE`), records the
//! receipt with the COG before and after, then bumps the quantity and stores
//! the new weighted average cost. All three statements share one transaction.
//!
//! The `*_in` functions take an open connection so purchase order receipt can
//! replenish several rows inside its own transaction.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use stockroom_core::cost::{line_total, weighted_average_cost};
use stockroom_core::{PackagingId, ProductId, UserId};

use super::RepositoryError;
use crate::models::{
    Packaging, PackagingReplenishment, Product, ProductReplenishment, ReplenishInput,
    Replenishment,
};

/// Repository for replenishments.
pub struct ReplenishmentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReplenishmentRepository<'a> {
    /// Create a new replenishment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Receive stock for a product and recompute its COG.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Database` if any statement fails; nothing is written.
    pub async fn replenish_product(
        &self,
        user_id: UserId,
        product_id: ProductId,
        input: &ReplenishInput,
    ) -> Result<ProductReplenishment, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let outcome = replenish_product_in(&mut tx, user_id, product_id, input).await?;
        tx.commit().await?;

        tracing::info!(
            product_id = %product_id,
            quantity = input.quantity,
            previous_cost = %outcome.replenishment.previous_cost,
            new_cost = %outcome.replenishment.new_cost,
            "Product replenished"
        );
        Ok(outcome)
    }

    /// Receive packaging stock and recompute its average unit cost.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the packaging does not exist.
    /// Returns `RepositoryError::Database` if any statement fails; nothing is written.
    pub async fn replenish_packaging(
        &self,
        user_id: UserId,
        packaging_id: PackagingId,
        input: &ReplenishInput,
    ) -> Result<PackagingReplenishment, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let outcome = replenish_packaging_in(&mut tx, user_id, packaging_id, input).await?;
        tx.commit().await?;

        tracing::info!(
            packaging_id = %packaging_id,
            quantity = input.quantity,
            new_cost = %outcome.replenishment.new_cost,
            "Packaging replenished"
        );
        Ok(outcome)
    }

    /// Replenishment history of a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Vec<Replenishment>, RepositoryError> {
        let rows = sqlx::query_as::<_, Replenishment>(
            r"
            SELECT id, user_id, product_id, packaging_id, purchase_order_id, quantity,
                   unit_cost, total_cost, previous_cost, new_cost, supplier, notes,
                   received_at, created_at
            FROM backoffice.replenishment
            WHERE user_id = $1 AND product_id = $2
            ORDER BY received_at DESC, id DESC
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Replenishment history of a packaging record, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_packaging(
        &self,
        user_id: UserId,
        packaging_id: PackagingId,
    ) -> Result<Vec<Replenishment>, RepositoryError> {
        let rows = sqlx::query_as::<_, Replenishment>(
            r"
            SELECT id, user_id, product_id, packaging_id, purchase_order_id, quantity,
                   unit_cost, total_cost, previous_cost, new_cost, supplier, notes,
                   received_at, created_at
            FROM backoffice.replenishment
            WHERE user_id = $1 AND packaging_id = $2
            ORDER BY received_at DESC, id DESC
            ",
        )
        .bind(user_id)
        .bind(packaging_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}

/// Stock on hand plus the receipt must still fit the quantity column.
fn check_stock_room(on_hand: i32, quantity: i32) -> Result<(), RepositoryError> {
    on_hand.checked_add(quantity).map(|_| ()).ok_or_else(|| {
        RepositoryError::Conflict(format!(
            "receiving {quantity} units would exceed the stock limit"
        ))
    })
}

/// Replenish a product on an open connection (normally a transaction).
pub(crate) async fn replenish_product_in(
    conn: &mut PgConnection,
    user_id: UserId,
    product_id: ProductId,
    input: &ReplenishInput,
) -> Result<ProductReplenishment, RepositoryError> {
    let (on_hand, previous_cost) = sqlx::query_as::<_, (i32, Decimal)>(
        r"
        SELECT quantity, cog
        FROM backoffice.product
        WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
        FOR UPDATE
        ",
    )
    .bind(product_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(RepositoryError::NotFound)?;

    check_stock_room(on_hand, input.quantity)?;
    let new_cost = weighted_average_cost(on_hand, previous_cost, input.quantity, input.unit_cost);

    let replenishment = sqlx::query_as::<_, Replenishment>(
        r"
        INSERT INTO backoffice.replenishment (
            user_id, product_id, purchase_order_id, quantity, unit_cost, total_cost,
            previous_cost, new_cost, supplier, notes
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id, user_id, product_id, packaging_id, purchase_order_id, quantity,
                  unit_cost, total_cost, previous_cost, new_cost, supplier, notes,
                  received_at, created_at
        ",
    )
    .bind(user_id)
    .bind(product_id)
    .bind(input.purchase_order_id)
    .bind(input.quantity)
    .bind(input.unit_cost)
    .bind(line_total(input.quantity, input.unit_cost))
    .bind(previous_cost)
    .bind(new_cost)
    .bind(&input.supplier)
    .bind(&input.notes)
    .fetch_one(&mut *conn)
    .await?;

    let product = sqlx::query_as::<_, Product>(
        r"
        UPDATE backoffice.product
        SET quantity = quantity + $3, cog = $4, updated_at = now()
        WHERE id = $1 AND user_id = $2
        RETURNING id, user_id, sku, name, description, price, quantity, cog, packaging_id,
                  ebay_item_id, created_at, updated_at
        ",
    )
    .bind(product_id)
    .bind(user_id)
    .bind(input.quantity)
    .bind(new_cost)
    .fetch_one(&mut *conn)
    .await?;

    Ok(ProductReplenishment {
        replenishment,
        product,
    })
}

/// Replenish packaging on an open connection (normally a transaction).
pub(crate) async fn replenish_packaging_in(
    conn: &mut PgConnection,
    user_id: UserId,
    packaging_id: PackagingId,
    input: &ReplenishInput,
) -> Result<PackagingReplenishment, RepositoryError> {
    let (on_hand, previous_cost) = sqlx::query_as::<_, (i32, Decimal)>(
        r"
        SELECT quantity, unit_cost
        FROM backoffice.packaging
        WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
        FOR UPDATE
        ",
    )
    .bind(packaging_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(RepositoryError::NotFound)?;

    check_stock_room(on_hand, input.quantity)?;
    let new_cost = weighted_average_cost(on_hand, previous_cost, input.quantity, input.unit_cost);

    let replenishment = sqlx::query_as::<_, Replenishment>(
        r"
        INSERT INTO backoffice.replenishment (
            user_id, packaging_id, purchase_order_id, quantity, unit_cost, total_cost,
            previous_cost, new_cost, supplier, notes
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id, user_id, product_id, packaging_id, purchase_order_id, quantity,
                  unit_cost, total_cost, previous_cost, new_cost, supplier, notes,
                  received_at, created_at
        ",
    )
    .bind(user_id)
    .bind(packaging_id)
    .bind(input.purchase_order_id)
    .bind(input.quantity)
    .bind(input.unit_cost)
    .bind(line_total(input.quantity, input.unit_cost))
    .bind(previous_cost)
    .bind(new_cost)
    .bind(&input.supplier)
    .bind(&input.notes)
    .fetch_one(&mut *conn)
    .await?;

    let packaging = sqlx::query_as::<_, Packaging>(
        r"
        UPDATE backoffice.packaging
        SET quantity = quantity + $3, unit_cost = $4, updated_at = now()
        WHERE id = $1 AND user_id = $2
        RETURNING id, user_id, name, description, unit_cost, quantity, created_at, updated_at
        ",
    )
    .bind(packaging_id)
    .bind(user_id)
    .bind(input.quantity)
    .bind(new_cost)
    .fetch_one(&mut *conn)
    .await?;

    Ok(PackagingReplenishment {
        replenishment,
        packaging,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_check_stock_room() {
        assert!(check_stock_room(10, 5).is_ok());
        assert!(check_stock_room(-3, 5).is_ok());
        let err = check_stock_room(i32::MAX - 1, 2).unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }
}
