//! Purchase order repository.
//!
//! Headers and items are always written together in one transaction. Moving
//! an order to `received` replenishes every linked product and packaging
//! record at its landed unit cost inside that same transaction, so a receipt
//! either lands completely or not at all.

use sqlx::{PgConnection, PgPool};

use stockroom_core::{PackagingId, ProductId, PurchaseOrderId, PurchaseOrderStatus, UserId};

use super::replenishments::{replenish_packaging_in, replenish_product_in};
use super::{Page, RepositoryError};
use crate::models::{
    PurchaseOrder, PurchaseOrderDetail, PurchaseOrderInput, PurchaseOrderItem,
    PurchaseOrderItemInput, ReceiveOutcome, ReplenishInput, Replenishment,
};

const DUPLICATE_NUMBER: &str = "a purchase order with this number already exists";

/// Repository for purchase order database operations.
pub struct PurchaseOrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PurchaseOrderRepository<'a> {
    /// Create a new purchase order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's purchase order headers, newest first, optionally by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        user_id: UserId,
        status: Option<PurchaseOrderStatus>,
        page: Page,
    ) -> Result<Vec<PurchaseOrder>, RepositoryError> {
        let orders = sqlx::query_as::<_, PurchaseOrder>(
            r"
            SELECT id, user_id, po_number, supplier, status, order_date, expected_date,
                   shipping_cost, notes, received_at, created_at, updated_at
            FROM backoffice.purchase_order
            WHERE user_id = $1
              AND deleted_at IS NULL
              AND ($2::backoffice.po_status IS NULL OR status = $2)
            ORDER BY order_date DESC, id DESC
            LIMIT $3 OFFSET $4
            ",
        )
        .bind(user_id)
        .bind(status)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Get a purchase order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        user_id: UserId,
        id: PurchaseOrderId,
    ) -> Result<Option<PurchaseOrderDetail>, RepositoryError> {
        let order = sqlx::query_as::<_, PurchaseOrder>(
            r"
            SELECT id, user_id, po_number, supplier, status, order_date, expected_date,
                   shipping_cost, notes, received_at, created_at, updated_at
            FROM backoffice.purchase_order
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            ",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        let Some(order) = order else {
            return Ok(None);
        };

        let mut conn = self.pool.acquire().await?;
        let items = fetch_items(&mut conn, order.id).await?;

        Ok(Some(PurchaseOrderDetail::new(order, items)))
    }

    /// Create a draft purchase order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the PO number is taken or an
    /// item references a product or packaging the user does not have.
    pub async fn create(
        &self,
        user_id: UserId,
        input: &PurchaseOrderInput,
    ) -> Result<PurchaseOrderDetail, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, PurchaseOrder>(
            r"
            INSERT INTO backoffice.purchase_order (
                user_id, po_number, supplier, order_date, expected_date, shipping_cost, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, po_number, supplier, status, order_date, expected_date,
                      shipping_cost, notes, received_at, created_at, updated_at
            ",
        )
        .bind(user_id)
        .bind(&input.po_number)
        .bind(&input.supplier)
        .bind(input.order_date)
        .bind(input.expected_date)
        .bind(input.shipping_cost)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::on_unique_violation(e, DUPLICATE_NUMBER))?;

        let items = insert_items(&mut tx, user_id, order.id, &input.items).await?;
        tx.commit().await?;

        tracing::info!(
            purchase_order_id = %order.id,
            items = items.len(),
            "Purchase order created"
        );
        Ok(PurchaseOrderDetail::new(order, items))
    }

    /// Replace a draft purchase order's header and items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Conflict` if it is no longer a draft, the PO
    /// number is taken, or an item references an unknown record.
    pub async fn update(
        &self,
        user_id: UserId,
        id: PurchaseOrderId,
        input: &PurchaseOrderInput,
    ) -> Result<PurchaseOrderDetail, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = lock_order(&mut tx, user_id, id).await?;
        if !current.status.is_editable() {
            return Err(RepositoryError::Conflict(format!(
                "a {} purchase order can no longer be edited",
                current.status
            )));
        }

        let order = sqlx::query_as::<_, PurchaseOrder>(
            r"
            UPDATE backoffice.purchase_order
            SET po_number = $3,
                supplier = $4,
                order_date = $5,
                expected_date = $6,
                shipping_cost = $7,
                notes = $8,
                updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, po_number, supplier, status, order_date, expected_date,
                      shipping_cost, notes, received_at, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(user_id)
        .bind(&input.po_number)
        .bind(&input.supplier)
        .bind(input.order_date)
        .bind(input.expected_date)
        .bind(input.shipping_cost)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::on_unique_violation(e, DUPLICATE_NUMBER))?;

        sqlx::query("DELETE FROM backoffice.purchase_order_item WHERE purchase_order_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let items = insert_items(&mut tx, user_id, id, &input.items).await?;
        tx.commit().await?;

        Ok(PurchaseOrderDetail::new(order, items))
    }

    /// Move a purchase order to `to`.
    ///
    /// Receiving replenishes each linked item at its landed unit cost and
    /// stamps `received_at`. Unlinked items (fees, samples) are not stocked.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Conflict` if the transition is not allowed or
    /// a linked record has since been deleted. Nothing is written on error.
    pub async fn set_status(
        &self,
        user_id: UserId,
        id: PurchaseOrderId,
        to: PurchaseOrderStatus,
    ) -> Result<ReceiveOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = lock_order(&mut tx, user_id, id).await?;
        if !current.status.can_transition_to(to) {
            return Err(RepositoryError::Conflict(format!(
                "cannot move a {} purchase order to {to}",
                current.status
            )));
        }

        let items = fetch_items(&mut tx, id).await?;
        let mut replenishments = Vec::new();

        if to == PurchaseOrderStatus::Received {
            let pending = PurchaseOrderDetail::new(current, items);
            let notes = Some(format!("Received on {}", pending.order.po_number));

            for (item, landed) in pending.items.iter().zip(pending.landed_unit_costs()) {
                let input = ReplenishInput {
                    quantity: item.quantity,
                    unit_cost: landed,
                    supplier: Some(pending.order.supplier.clone()),
                    notes: notes.clone(),
                    purchase_order_id: Some(id),
                };

                if let Some(product_id) = item.product_id {
                    let outcome = replenish_product_in(&mut tx, user_id, product_id, &input)
                        .await
                        .map_err(|e| gone(e, "product", product_id.as_i32()))?;
                    replenishments.push(outcome.replenishment);
                } else if let Some(packaging_id) = item.packaging_id {
                    let outcome = replenish_packaging_in(&mut tx, user_id, packaging_id, &input)
                        .await
                        .map_err(|e| gone(e, "packaging", packaging_id.as_i32()))?;
                    replenishments.push(outcome.replenishment);
                }
            }

            return finish_transition(tx, user_id, id, to, pending.items, replenishments).await;
        }

        finish_transition(tx, user_id, id, to, items, replenishments).await
    }

    /// Soft-delete a purchase order. Returns `false` if there was nothing to delete.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order has been received.
    pub async fn soft_delete(
        &self,
        user_id: UserId,
        id: PurchaseOrderId,
    ) -> Result<bool, RepositoryError> {
        let status = sqlx::query_scalar::<_, PurchaseOrderStatus>(
            r"
            SELECT status
            FROM backoffice.purchase_order
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            ",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        match status {
            None => return Ok(false),
            Some(PurchaseOrderStatus::Received) => {
                return Err(RepositoryError::Conflict(
                    "received purchase orders cannot be deleted".to_string(),
                ));
            }
            Some(_) => {}
        }

        let result = sqlx::query(
            r"
            UPDATE backoffice.purchase_order
            SET deleted_at = now(), updated_at = now()
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL AND status <> 'received'
            ",
        )
        .bind(id)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count of a user's purchase orders in `status`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_status(
        &self,
        user_id: UserId,
        status: PurchaseOrderStatus,
    ) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*)
            FROM backoffice.purchase_order
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

/// Load an order and its items with the order row locked, on an open transaction.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the order does not exist.
pub(crate) async fn lock_detail_in(
    conn: &mut PgConnection,
    user_id: UserId,
    id: PurchaseOrderId,
) -> Result<PurchaseOrderDetail, RepositoryError> {
    let order = lock_order(conn, user_id, id).await?;
    let items = fetch_items(conn, order.id).await?;
    Ok(PurchaseOrderDetail::new(order, items))
}

async fn lock_order(
    conn: &mut PgConnection,
    user_id: UserId,
    id: PurchaseOrderId,
) -> Result<PurchaseOrder, RepositoryError> {
    sqlx::query_as::<_, PurchaseOrder>(
        r"
        SELECT id, user_id, po_number, supplier, status, order_date, expected_date,
               shipping_cost, notes, received_at, created_at, updated_at
        FROM backoffice.purchase_order
        WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
        FOR UPDATE
        ",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(RepositoryError::NotFound)
}

async fn fetch_items(
    conn: &mut PgConnection,
    purchase_order_id: PurchaseOrderId,
) -> Result<Vec<PurchaseOrderItem>, RepositoryError> {
    let items = sqlx::query_as::<_, PurchaseOrderItem>(
        r"
        SELECT id, purchase_order_id, product_id, packaging_id, description, quantity, unit_cost
        FROM backoffice.purchase_order_item
        WHERE purchase_order_id = $1
        ORDER BY id
        ",
    )
    .bind(purchase_order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

/// Insert items in order, filling blank descriptions from the linked record.
///
/// A link to a product or packaging the user does not own (or has deleted)
/// is rejected rather than stored.
async fn insert_items(
    conn: &mut PgConnection,
    user_id: UserId,
    purchase_order_id: PurchaseOrderId,
    items: &[PurchaseOrderItemInput],
) -> Result<Vec<PurchaseOrderItem>, RepositoryError> {
    let mut stored = Vec::with_capacity(items.len());

    for item in items {
        let linked_name = match (item.product_id, item.packaging_id) {
            (Some(product_id), _) => Some(product_name(conn, user_id, product_id).await?),
            (None, Some(packaging_id)) => Some(packaging_name(conn, user_id, packaging_id).await?),
            (None, None) => None,
        };

        let description = item
            .description
            .clone()
            .or(linked_name)
            .unwrap_or_default();

        let row = sqlx::query_as::<_, PurchaseOrderItem>(
            r"
            INSERT INTO backoffice.purchase_order_item (
                purchase_order_id, product_id, packaging_id, description, quantity, unit_cost
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, purchase_order_id, product_id, packaging_id, description, quantity,
                      unit_cost
            ",
        )
        .bind(purchase_order_id)
        .bind(item.product_id)
        .bind(item.packaging_id)
        .bind(description)
        .bind(item.quantity)
        .bind(item.unit_cost)
        .fetch_one(&mut *conn)
        .await?;

        stored.push(row);
    }

    Ok(stored)
}

async fn product_name(
    conn: &mut PgConnection,
    user_id: UserId,
    product_id: ProductId,
) -> Result<String, RepositoryError> {
    sqlx::query_scalar::<_, String>(
        r"
        SELECT name FROM backoffice.product
        WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
        ",
    )
    .bind(product_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| RepositoryError::Conflict(format!("product {product_id} does not exist")))
}

async fn packaging_name(
    conn: &mut PgConnection,
    user_id: UserId,
    packaging_id: PackagingId,
) -> Result<String, RepositoryError> {
    sqlx::query_scalar::<_, String>(
        r"
        SELECT name FROM backoffice.packaging
        WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
        ",
    )
    .bind(packaging_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| RepositoryError::Conflict(format!("packaging {packaging_id} does not exist")))
}

/// A linked record vanishing mid-receipt is a conflict, not a missing order.
fn gone(err: RepositoryError, kind: &str, id: i32) -> RepositoryError {
    match err {
        RepositoryError::NotFound => {
            RepositoryError::Conflict(format!("{kind} {id} no longer exists"))
        }
        other => other,
    }
}

async fn finish_transition(
    mut tx: sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: UserId,
    id: PurchaseOrderId,
    to: PurchaseOrderStatus,
    items: Vec<PurchaseOrderItem>,
    replenishments: Vec<Replenishment>,
) -> Result<ReceiveOutcome, RepositoryError> {
    let order = sqlx::query_as::<_, PurchaseOrder>(
        r"
        UPDATE backoffice.purchase_order
        SET status = $3,
            received_at = CASE WHEN $3 = 'received'::backoffice.po_status THEN now()
                               ELSE received_at END,
            updated_at = now()
        WHERE id = $1 AND user_id = $2
        RETURNING id, user_id, po_number, supplier, status, order_date, expected_date,
                  shipping_cost, notes, received_at, created_at, updated_at
        ",
    )
    .bind(id)
    .bind(user_id)
    .bind(to)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        purchase_order_id = %id,
        status = %to,
        replenished = replenishments.len(),
        "Purchase order status changed"
    );

    Ok(ReceiveOutcome {
        purchase_order: PurchaseOrderDetail::new(order, items),
        replenishments,
    })
}
