//! Purchase orders, their line items and receipt results.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockroom_core::cost::{allocate_shipping, landed_unit_cost, line_total};
use stockroom_core::validation::{
    ValidationError, optional_text, require_date_order, require_non_empty, require_non_negative,
    require_positive_quantity,
};
use stockroom_core::{
    ExpenseCategory, PackagingId, ProductId, PurchaseOrderId, PurchaseOrderItemId,
    PurchaseOrderStatus, UserId,
};

use super::expense::Expense;
use super::inventory::Replenishment;

/// Most line items a single order may carry.
pub const MAX_ITEMS: usize = 200;

/// Purchase order header.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PurchaseOrder {
    pub id: PurchaseOrderId,
    pub user_id: UserId,
    pub po_number: String,
    pub supplier: String,
    pub status: PurchaseOrderStatus,
    pub order_date: NaiveDate,
    pub expected_date: Option<NaiveDate>,
    pub shipping_cost: Decimal,
    pub notes: Option<String>,
    pub received_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of a purchase order.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PurchaseOrderItem {
    pub id: PurchaseOrderItemId,
    pub purchase_order_id: PurchaseOrderId,
    pub product_id: Option<ProductId>,
    pub packaging_id: Option<PackagingId>,
    pub description: String,
    pub quantity: i32,
    pub unit_cost: Decimal,
}

impl PurchaseOrderItem {
    /// `quantity * unit_cost`, in cents.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        line_total(self.quantity, self.unit_cost)
    }

    /// Bookkeeping category an expense for this line falls under.
    #[must_use]
    pub const fn expense_category(&self) -> ExpenseCategory {
        if self.product_id.is_some() {
            ExpenseCategory::Inventory
        } else if self.packaging_id.is_some() {
            ExpenseCategory::Packaging
        } else {
            ExpenseCategory::Other
        }
    }
}

/// A purchase order with its items and totals, as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOrderDetail {
    #[serde(flatten)]
    pub order: PurchaseOrder,
    pub items: Vec<PurchaseOrderItem>,
    pub items_total: Decimal,
    pub total: Decimal,
}

impl PurchaseOrderDetail {
    /// Assemble a detail view, computing totals from the items.
    #[must_use]
    pub fn new(order: PurchaseOrder, items: Vec<PurchaseOrderItem>) -> Self {
        let items_total: Decimal = items.iter().map(PurchaseOrderItem::line_total).sum();
        let total = items_total + order.shipping_cost;
        Self {
            order,
            items,
            items_total,
            total,
        }
    }

    /// Landed unit cost of every item, in item order.
    ///
    /// Shipping is spread over the lines in proportion to their totals.
    #[must_use]
    pub fn landed_unit_costs(&self) -> Vec<Decimal> {
        let totals: Vec<Decimal> = self.items.iter().map(PurchaseOrderItem::line_total).collect();
        let shares = allocate_shipping(self.order.shipping_cost, &totals);
        self.items
            .iter()
            .zip(shares)
            .map(|(item, share)| landed_unit_cost(item.unit_cost, item.quantity, share))
            .collect()
    }
}

/// Body of `POST /api/purchase-orders` and `PUT /api/purchase-orders/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseOrderRequest {
    pub po_number: String,
    pub supplier: String,
    pub order_date: NaiveDate,
    pub expected_date: Option<NaiveDate>,
    #[serde(default)]
    pub shipping_cost: Decimal,
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<PurchaseOrderItemRequest>,
}

/// One line in a purchase order request.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseOrderItemRequest {
    pub product_id: Option<ProductId>,
    pub packaging_id: Option<PackagingId>,
    pub description: Option<String>,
    pub quantity: i32,
    pub unit_cost: Decimal,
}

/// A validated purchase order ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseOrderInput {
    pub po_number: String,
    pub supplier: String,
    pub order_date: NaiveDate,
    pub expected_date: Option<NaiveDate>,
    pub shipping_cost: Decimal,
    pub notes: Option<String>,
    pub items: Vec<PurchaseOrderItemInput>,
}

/// A validated line item.
///
/// `description` is `None` only for linked lines; the repository fills it
/// in from the product or packaging name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseOrderItemInput {
    pub product_id: Option<ProductId>,
    pub packaging_id: Option<PackagingId>,
    pub description: Option<String>,
    pub quantity: i32,
    pub unit_cost: Decimal,
}

impl PurchaseOrderRequest {
    /// Check and normalize the request.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(self) -> Result<PurchaseOrderInput, ValidationError> {
        let po_number = require_non_empty("po_number", &self.po_number, 64)?;
        let supplier = require_non_empty("supplier", &self.supplier, 200)?;
        require_date_order("expected_date", self.order_date, self.expected_date)?;
        require_non_negative("shipping_cost", self.shipping_cost)?;

        if self.items.is_empty() {
            return Err(ValidationError::new("items", "must contain at least one item"));
        }
        if self.items.len() > MAX_ITEMS {
            return Err(ValidationError::new(
                "items",
                format!("must contain at most {MAX_ITEMS} items"),
            ));
        }

        let items = self
            .items
            .into_iter()
            .map(PurchaseOrderItemRequest::validate)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PurchaseOrderInput {
            po_number,
            supplier,
            order_date: self.order_date,
            expected_date: self.expected_date,
            shipping_cost: self.shipping_cost,
            notes: optional_text(self.notes.as_deref()),
            items,
        })
    }
}

impl PurchaseOrderItemRequest {
    fn validate(self) -> Result<PurchaseOrderItemInput, ValidationError> {
        if self.product_id.is_some() && self.packaging_id.is_some() {
            return Err(ValidationError::new(
                "items",
                "an item may reference a product or packaging, not both",
            ));
        }
        require_positive_quantity("quantity", self.quantity)?;
        require_non_negative("unit_cost", self.unit_cost)?;

        let description = optional_text(self.description.as_deref());
        if let Some(text) = &description {
            require_non_empty("description", text, 500)?;
        } else if self.product_id.is_none() && self.packaging_id.is_none() {
            return Err(ValidationError::new(
                "description",
                "required for items without a product or packaging",
            ));
        }

        Ok(PurchaseOrderItemInput {
            product_id: self.product_id,
            packaging_id: self.packaging_id,
            description,
            quantity: self.quantity,
            unit_cost: self.unit_cost,
        })
    }
}

/// Body of `POST /api/purchase-orders/{id}/status`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PurchaseOrderStatusRequest {
    pub status: PurchaseOrderStatus,
}

/// Response of a status change; `replenishments` is non-empty only on receipt.
#[derive(Debug, Clone, Serialize)]
pub struct ReceiveOutcome {
    pub purchase_order: PurchaseOrderDetail,
    pub replenishments: Vec<Replenishment>,
}

/// A bulk expense insert that did not go through.
#[derive(Debug, Clone, Serialize)]
pub struct BulkExpenseFailure {
    pub description: String,
    pub error: String,
}

/// Response of `POST /api/purchase-orders/{id}/expenses`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkExpenseResult {
    pub created: Vec<Expense>,
    pub failed: Vec<BulkExpenseFailure>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(quantity: i32, unit_cost: &str) -> PurchaseOrderItemRequest {
        PurchaseOrderItemRequest {
            product_id: Some(ProductId::new(7)),
            packaging_id: None,
            description: None,
            quantity,
            unit_cost: unit_cost.parse().unwrap(),
        }
    }

    fn request(items: Vec<PurchaseOrderItemRequest>) -> PurchaseOrderRequest {
        PurchaseOrderRequest {
            po_number: "PO-1001".to_string(),
            supplier: "Acme Wholesale".to_string(),
            order_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            expected_date: NaiveDate::from_ymd_opt(2026, 6, 10),
            shipping_cost: "12.00".parse().unwrap(),
            notes: None,
            items,
        }
    }

    fn detail(shipping: &str, lines: &[(i32, &str)]) -> PurchaseOrderDetail {
        let now = Utc::now();
        let order = PurchaseOrder {
            id: PurchaseOrderId::new(1),
            user_id: UserId::new(1),
            po_number: "PO-1".to_string(),
            supplier: "S".to_string(),
            status: PurchaseOrderStatus::Ordered,
            order_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            expected_date: None,
            shipping_cost: shipping.parse().unwrap(),
            notes: None,
            received_at: None,
            created_at: now,
            updated_at: now,
        };
        let items = lines
            .iter()
            .zip(1..)
            .map(|((quantity, cost), id)| PurchaseOrderItem {
                id: PurchaseOrderItemId::new(id),
                purchase_order_id: PurchaseOrderId::new(1),
                product_id: Some(ProductId::new(id)),
                packaging_id: None,
                description: format!("line {id}"),
                quantity: *quantity,
                unit_cost: cost.parse().unwrap(),
            })
            .collect();
        PurchaseOrderDetail::new(order, items)
    }

    #[test]
    fn test_validate_accepts_linked_item_without_description() {
        let input = request(vec![item(10, "2.50")]).validate().unwrap();
        assert_eq!(input.items.len(), 1);
        assert_eq!(input.items[0].description, None);
    }

    #[test]
    fn test_validate_requires_items() {
        assert_eq!(request(vec![]).validate().unwrap_err().field, "items");
    }

    #[test]
    fn test_validate_rejects_item_with_both_links() {
        let mut both = item(1, "1");
        both.packaging_id = Some(PackagingId::new(3));
        assert_eq!(request(vec![both]).validate().unwrap_err().field, "items");
    }

    #[test]
    fn test_validate_requires_description_for_unlinked_item() {
        let mut loose = item(1, "1");
        loose.product_id = None;
        assert_eq!(
            request(vec![loose.clone()]).validate().unwrap_err().field,
            "description"
        );
        loose.description = Some("Customs fee".to_string());
        assert!(request(vec![loose]).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_quantity_and_early_expected_date() {
        assert_eq!(
            request(vec![item(0, "1")]).validate().unwrap_err().field,
            "quantity"
        );

        let mut req = request(vec![item(1, "1")]);
        req.expected_date = NaiveDate::from_ymd_opt(2026, 5, 1);
        assert_eq!(req.validate().unwrap_err().field, "expected_date");
    }

    #[test]
    fn test_detail_totals() {
        let detail = detail("5.00", &[(10, "2.00"), (5, "4.00")]);
        assert_eq!(detail.items_total, "40.00".parse::<Decimal>().unwrap());
        assert_eq!(detail.total, "45.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_landed_costs_include_shipping_share() {
        // 20.00 + 20.00 of goods, 10.00 shipping split 5.00 / 5.00
        let detail = detail("10.00", &[(10, "2.00"), (4, "5.00")]);
        let landed = detail.landed_unit_costs();
        assert_eq!(landed[0], "2.5".parse::<Decimal>().unwrap());
        assert_eq!(landed[1], "6.25".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_expense_category_follows_link() {
        let detail = detail("0", &[(1, "1")]);
        let mut line = detail.items[0].clone();
        assert_eq!(line.expense_category(), ExpenseCategory::Inventory);
        line.product_id = None;
        line.packaging_id = Some(PackagingId::new(2));
        assert_eq!(line.expense_category(), ExpenseCategory::Packaging);
        line.packaging_id = None;
        assert_eq!(line.expense_category(), ExpenseCategory::Other);
    }
}
