//! Products, packaging and the replenishments that restock them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockroom_core::validation::{
    ValidationError, optional_text, require_non_empty, require_non_negative,
    require_non_negative_quantity, require_positive_quantity,
};
use stockroom_core::{PackagingId, ProductId, PurchaseOrderId, ReplenishmentId, UserId};

/// A sellable product and its current stock position.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub user_id: UserId,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub quantity: i32,
    /// Weighted average unit cost of the units on hand.
    pub cog: Decimal,
    pub packaging_id: Option<PackagingId>,
    pub ebay_item_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Value of the stock on hand at cost.
    #[must_use]
    pub fn stock_value(&self) -> Decimal {
        Decimal::from(self.quantity.max(0)) * self.cog
    }

    /// Gross margin per unit at the current price.
    #[must_use]
    pub fn unit_margin(&self) -> Decimal {
        self.price - self.cog
    }
}

/// Body of `POST /api/products` and `PUT /api/products/{id}`.
///
/// `quantity` and `cog` only count on create.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRequest {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default)]
    pub cog: Decimal,
    pub packaging_id: Option<PackagingId>,
    pub ebay_item_id: Option<String>,
}

/// A validated product ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub quantity: i32,
    pub cog: Decimal,
    pub packaging_id: Option<PackagingId>,
    pub ebay_item_id: Option<String>,
}

impl ProductRequest {
    /// Check and normalize the request.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(self) -> Result<ProductInput, ValidationError> {
        let sku = require_non_empty("sku", &self.sku, 64)?;
        let name = require_non_empty("name", &self.name, 200)?;
        require_non_negative("price", self.price)?;
        require_non_negative_quantity("quantity", self.quantity)?;
        require_non_negative("cog", self.cog)?;

        Ok(ProductInput {
            sku,
            name,
            description: optional_text(self.description.as_deref()),
            price: self.price,
            quantity: self.quantity,
            cog: self.cog,
            packaging_id: self.packaging_id,
            ebay_item_id: optional_text(self.ebay_item_id.as_deref()),
        })
    }
}

/// Packaging material (boxes, mailers, tape) tracked like stock.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Packaging {
    pub id: PackagingId,
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    /// Weighted average cost per unit on hand.
    pub unit_cost: Decimal,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/packaging` and `PUT /api/packaging/{id}`.
///
/// `unit_cost` and `quantity` only count on create.
#[derive(Debug, Clone, Deserialize)]
pub struct PackagingRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub unit_cost: Decimal,
    #[serde(default)]
    pub quantity: i32,
}

/// A validated packaging record ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagingInput {
    pub name: String,
    pub description: Option<String>,
    pub unit_cost: Decimal,
    pub quantity: i32,
}

impl PackagingRequest {
    /// Check and normalize the request.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(self) -> Result<PackagingInput, ValidationError> {
        let name = require_non_empty("name", &self.name, 200)?;
        require_non_negative("unit_cost", self.unit_cost)?;
        require_non_negative_quantity("quantity", self.quantity)?;

        Ok(PackagingInput {
            name,
            description: optional_text(self.description.as_deref()),
            unit_cost: self.unit_cost,
            quantity: self.quantity,
        })
    }
}

/// One receipt of stock, with the cost of goods before and after.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Replenishment {
    pub id: ReplenishmentId,
    pub user_id: UserId,
    pub product_id: Option<ProductId>,
    pub packaging_id: Option<PackagingId>,
    pub purchase_order_id: Option<PurchaseOrderId>,
    pub quantity: i32,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    pub previous_cost: Decimal,
    pub new_cost: Decimal,
    pub supplier: Option<String>,
    pub notes: Option<String>,
    pub received_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/products/{id}/replenish` and `POST /api/packaging/{id}/replenish`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplenishRequest {
    pub quantity: i32,
    pub unit_cost: Decimal,
    pub supplier: Option<String>,
    pub notes: Option<String>,
}

/// A validated stock receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplenishInput {
    pub quantity: i32,
    pub unit_cost: Decimal,
    pub supplier: Option<String>,
    pub notes: Option<String>,
    pub purchase_order_id: Option<PurchaseOrderId>,
}

impl ReplenishRequest {
    /// Check and normalize the request.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(self) -> Result<ReplenishInput, ValidationError> {
        require_positive_quantity("quantity", self.quantity)?;
        require_non_negative("unit_cost", self.unit_cost)?;

        Ok(ReplenishInput {
            quantity: self.quantity,
            unit_cost: self.unit_cost,
            supplier: optional_text(self.supplier.as_deref()),
            notes: optional_text(self.notes.as_deref()),
            purchase_order_id: None,
        })
    }
}

/// Response of a product replenishment.
#[derive(Debug, Clone, Serialize)]
pub struct ProductReplenishment {
    pub replenishment: Replenishment,
    pub product: Product,
}

/// Response of a packaging replenishment.
#[derive(Debug, Clone, Serialize)]
pub struct PackagingReplenishment {
    pub replenishment: Replenishment,
    pub packaging: Packaging,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_request_defaults_stock_to_zero() {
        let json = r#"{"sku":" MUG-01 ","name":"Cactus mug","price":"14.00"}"#;
        let req: ProductRequest = serde_json::from_str(json).unwrap();
        let input = req.validate().unwrap();
        assert_eq!(input.sku, "MUG-01");
        assert_eq!(input.quantity, 0);
        assert_eq!(input.cog, Decimal::ZERO);
        assert_eq!(input.packaging_id, None);
    }

    #[test]
    fn test_product_request_rejects_negative_values() {
        let json = r#"{"sku":"A","name":"B","price":"-1"}"#;
        let req: ProductRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.validate().unwrap_err().field, "price");

        let json = r#"{"sku":"A","name":"B","price":"1","quantity":-3}"#;
        let req: ProductRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.validate().unwrap_err().field, "quantity");
    }

    #[test]
    fn test_packaging_request_requires_name() {
        let req = PackagingRequest {
            name: String::new(),
            description: None,
            unit_cost: Decimal::ONE,
            quantity: 10,
        };
        assert_eq!(req.validate().unwrap_err().field, "name");
    }

    #[test]
    fn test_replenish_request_requires_positive_quantity() {
        let req = ReplenishRequest {
            quantity: 0,
            unit_cost: Decimal::ONE,
            supplier: None,
            notes: None,
        };
        assert_eq!(req.validate().unwrap_err().field, "quantity");

        let req = ReplenishRequest {
            quantity: 12,
            unit_cost: Decimal::ZERO,
            supplier: Some(" Acme ".to_string()),
            notes: None,
        };
        let input = req.validate().unwrap();
        assert_eq!(input.supplier.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_replenish_request_rejects_huge_quantity() {
        let req = ReplenishRequest {
            quantity: i32::MAX,
            unit_cost: Decimal::ONE,
            supplier: None,
            notes: None,
        };
        let err = req.validate().unwrap_err();
        assert_eq!(err.field, "quantity");
        assert_eq!(err.message, "must be at most 1000000");

        let json = r#"{"sku":"A","name":"B","price":"1","quantity":2000000}"#;
        let req: ProductRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.validate().unwrap_err().field, "quantity");
    }

    #[test]
    fn test_stock_value_ignores_oversold_stock() {
        let now = Utc::now();
        let mut product = Product {
            id: ProductId::new(1),
            user_id: UserId::new(1),
            sku: "S".to_string(),
            name: "N".to_string(),
            description: None,
            price: Decimal::new(1000, 2),
            quantity: 4,
            cog: Decimal::new(25000, 4),
            packaging_id: None,
            ebay_item_id: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(product.stock_value(), Decimal::new(10, 0));
        assert_eq!(product.unit_margin(), Decimal::new(75, 1));
        product.quantity = -2;
        assert_eq!(product.stock_value(), Decimal::ZERO);
    }
}
