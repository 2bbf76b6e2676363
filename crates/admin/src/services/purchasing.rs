//! Expenses generated from purchase orders.

use chrono::NaiveDate;
use sqlx::{Connection, PgConnection, PgPool};
use tracing::instrument;

use stockroom_core::{ExpenseCategory, PurchaseOrderId, PurchaseOrderStatus, UserId};

use crate::db::{RepositoryError, expenses, purchase_orders};
use crate::error::AppError;
use crate::models::{
    BulkExpenseFailure, BulkExpenseResult, Expense, ExpenseInput, PurchaseOrderDetail,
};

/// Book one expense per purchase order line, plus shipping.
///
/// The order row stays locked until every line is booked, so concurrent
/// calls for the same order queue up and the later ones see the expenses.
/// Each insert runs in its own savepoint. A failed insert is logged and
/// reported in `failed`; the remaining lines are still booked.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the order does not exist.
/// Returns `AppError::Conflict` if the order is not ordered/received or
/// already has expenses.
#[instrument(skip(pool), fields(user_id = %user_id, purchase_order_id = %purchase_order_id))]
pub async fn create_expenses_for_purchase_order(
    pool: &PgPool,
    user_id: UserId,
    purchase_order_id: PurchaseOrderId,
) -> Result<BulkExpenseResult, AppError> {
    let mut tx = pool.begin().await.map_err(RepositoryError::from)?;

    let detail = purchase_orders::lock_detail_in(&mut tx, user_id, purchase_order_id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Purchase order".to_string()),
            e => e.into(),
        })?;

    if !matches!(
        detail.order.status,
        PurchaseOrderStatus::Ordered | PurchaseOrderStatus::Received
    ) {
        return Err(AppError::Conflict(format!(
            "expenses can only be created for ordered or received purchase orders, not {}",
            detail.order.status
        )));
    }

    if expenses::count_for_purchase_order_in(&mut tx, user_id, purchase_order_id).await? > 0 {
        return Err(AppError::Conflict(
            "expenses were already created for this purchase order".to_string(),
        ));
    }

    let mut result = BulkExpenseResult::default();

    for input in expense_inputs(&detail) {
        match book_expense(&mut tx, user_id, &input).await {
            Ok(expense) => result.created.push(expense),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    description = %input.description,
                    "Failed to create purchase order expense"
                );
                result.failed.push(BulkExpenseFailure {
                    description: input.description,
                    error: e.to_string(),
                });
            }
        }
    }

    tx.commit().await.map_err(RepositoryError::from)?;

    tracing::info!(
        created = result.created.len(),
        failed = result.failed.len(),
        "Purchase order expenses booked"
    );
    Ok(result)
}

/// Insert one expense inside a savepoint so a failure leaves the outer transaction usable.
async fn book_expense(
    conn: &mut PgConnection,
    user_id: UserId,
    input: &ExpenseInput,
) -> Result<Expense, RepositoryError> {
    let mut savepoint = conn.begin().await?;
    let expense = expenses::create_in(&mut savepoint, user_id, input).await?;
    savepoint.commit().await?;
    Ok(expense)
}

/// Expenses to book for an order. Zero-cost lines are skipped.
#[must_use]
pub fn expense_inputs(detail: &PurchaseOrderDetail) -> Vec<ExpenseInput> {
    let order = &detail.order;
    let expense_date: NaiveDate = order
        .received_at
        .map_or(order.order_date, |received| received.date_naive());

    let mut inputs: Vec<ExpenseInput> = detail
        .items
        .iter()
        .filter(|item| item.line_total() > rust_decimal::Decimal::ZERO)
        .map(|item| ExpenseInput {
            description: format!("{}: {} x{}", order.po_number, item.description, item.quantity),
            category: item.expense_category(),
            amount: item.line_total(),
            expense_date,
            vendor: Some(order.supplier.clone()),
            purchase_order_id: Some(order.id),
            notes: None,
        })
        .collect();

    if order.shipping_cost > rust_decimal::Decimal::ZERO {
        inputs.push(ExpenseInput {
            description: format!("{}: shipping", order.po_number),
            category: ExpenseCategory::Shipping,
            amount: order.shipping_cost,
            expense_date,
            vendor: Some(order.supplier.clone()),
            purchase_order_id: Some(order.id),
            notes: None,
        });
    }

    inputs
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use stockroom_core::{PackagingId, ProductId, PurchaseOrderItemId};

    use super::*;
    use crate::models::{PurchaseOrder, PurchaseOrderItem};

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn item(id: i32, product: Option<i32>, packaging: Option<i32>, qty: i32, cost: &str) -> PurchaseOrderItem {
        PurchaseOrderItem {
            id: PurchaseOrderItemId::new(id),
            purchase_order_id: PurchaseOrderId::new(9),
            product_id: product.map(ProductId::new),
            packaging_id: packaging.map(PackagingId::new),
            description: format!("item {id}"),
            quantity: qty,
            unit_cost: d(cost),
        }
    }

    fn detail(shipping: &str, items: Vec<PurchaseOrderItem>) -> PurchaseOrderDetail {
        let now = Utc::now();
        PurchaseOrderDetail::new(
            PurchaseOrder {
                id: PurchaseOrderId::new(9),
                user_id: UserId::new(1),
                po_number: "PO-9".to_string(),
                supplier: "Acme".to_string(),
                status: PurchaseOrderStatus::Ordered,
                order_date: NaiveDate::from_ymd_opt(2026, 5, 2).unwrap(),
                expected_date: None,
                shipping_cost: d(shipping),
                notes: None,
                received_at: None,
                created_at: now,
                updated_at: now,
            },
            items,
        )
    }

    #[test]
    fn test_one_expense_per_line_plus_shipping() {
        let detail = detail(
            "7.50",
            vec![
                item(1, Some(3), None, 10, "2.00"),
                item(2, None, Some(4), 100, "0.15"),
                item(3, None, None, 1, "25.00"),
            ],
        );
        let inputs = expense_inputs(&detail);

        assert_eq!(inputs.len(), 4);
        assert_eq!(inputs[0].category, ExpenseCategory::Inventory);
        assert_eq!(inputs[0].amount, d("20.00"));
        assert_eq!(inputs[0].description, "PO-9: item 1 x10");
        assert_eq!(inputs[1].category, ExpenseCategory::Packaging);
        assert_eq!(inputs[1].amount, d("15.00"));
        assert_eq!(inputs[2].category, ExpenseCategory::Other);
        assert_eq!(inputs[3].category, ExpenseCategory::Shipping);
        assert_eq!(inputs[3].amount, d("7.50"));
        assert!(inputs
            .iter()
            .all(|i| i.purchase_order_id == Some(PurchaseOrderId::new(9))
                && i.vendor.as_deref() == Some("Acme")));
    }

    #[test]
    fn test_free_lines_and_zero_shipping_are_skipped() {
        let detail = detail("0", vec![item(1, Some(3), None, 5, "0")]);
        assert!(expense_inputs(&detail).is_empty());
    }

    #[test]
    fn test_received_orders_are_dated_on_receipt() {
        let mut detail = detail("0", vec![item(1, Some(3), None, 1, "1")]);
        detail.order.received_at = Some(Utc.with_ymd_and_hms(2026, 5, 20, 15, 0, 0).unwrap());
        assert_eq!(
            expense_inputs(&detail)[0].expense_date,
            NaiveDate::from_ymd_opt(2026, 5, 20).unwrap()
        );
    }
}
