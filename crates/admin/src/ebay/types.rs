//! Response types for the eBay Sell APIs.
//!
//! Only the fields the back office shows are modeled; everything else eBay
//! sends is ignored. Field names follow eBay's camelCase JSON.

use serde::{Deserialize, Serialize};

/// An amount with its currency, as eBay formats money (`"12.50"`, `"USD"`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Amount {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub currency: String,
}

/// One page of `GET /sell/fulfillment/v1/order`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdersPage {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub orders: Vec<Order>,
}

/// A marketplace order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: String,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub order_fulfillment_status: Option<String>,
    #[serde(default)]
    pub order_payment_status: Option<String>,
    #[serde(default)]
    pub buyer: Option<Buyer>,
    #[serde(default)]
    pub pricing_summary: Option<PricingSummary>,
    #[serde(default)]
    pub line_items: Vec<OrderLineItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buyer {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingSummary {
    #[serde(default)]
    pub total: Option<Amount>,
    #[serde(default)]
    pub price_subtotal: Option<Amount>,
    #[serde(default)]
    pub delivery_cost: Option<Amount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    pub line_item_id: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub line_item_cost: Option<Amount>,
}

/// One page of `GET /sell/inventory/v1/inventory_item`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemsPage {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub inventory_items: Vec<InventoryItem>,
}

/// A listing's inventory record, keyed by seller SKU.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub sku: String,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub product: Option<InventoryProduct>,
    #[serde(default)]
    pub availability: Option<Availability>,
}

impl InventoryItem {
    /// Units available to ship, or 0 when eBay reports none.
    #[must_use]
    pub fn available_quantity(&self) -> i64 {
        self.availability
            .as_ref()
            .and_then(|a| a.ship_to_location_availability.as_ref())
            .map_or(0, |s| s.quantity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryProduct {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    #[serde(default)]
    pub ship_to_location_availability: Option<ShipToLocationAvailability>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipToLocationAvailability {
    #[serde(default)]
    pub quantity: i64,
}

/// Error envelope returned by the REST APIs.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiErrorResponse {
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub long_message: Option<String>,
}

impl ApiErrorResponse {
    /// The most descriptive message of the first error.
    pub(crate) fn first_message(self) -> Option<String> {
        self.errors
            .into_iter()
            .next()
            .and_then(|e| e.long_message.or(e.message))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_orders_page_deserializes() {
        let json = r#"{
            "href": "https://api.ebay.com/sell/fulfillment/v1/order?limit=2&offset=0",
            "total": 1,
            "limit": 2,
            "offset": 0,
            "orders": [{
                "orderId": "12-34567-89012",
                "creationDate": "2026-06-01T10:00:00.000Z",
                "orderFulfillmentStatus": "NOT_STARTED",
                "orderPaymentStatus": "PAID",
                "buyer": {"username": "cactus_collector"},
                "pricingSummary": {"total": {"value": "21.50", "currency": "USD"}},
                "lineItems": [{
                    "lineItemId": "100",
                    "sku": "MUG-01",
                    "title": "Cactus mug",
                    "quantity": 1,
                    "lineItemCost": {"value": "14.00", "currency": "USD"}
                }]
            }]
        }"#;
        let page: OrdersPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.total, 1);
        let order = &page.orders[0];
        assert_eq!(order.order_id, "12-34567-89012");
        assert_eq!(
            order.pricing_summary.as_ref().unwrap().total.as_ref().unwrap().value,
            "21.50"
        );
        assert_eq!(order.line_items[0].sku.as_deref(), Some("MUG-01"));
    }

    #[test]
    fn test_inventory_item_quantity() {
        let json = r#"{
            "total": 2,
            "size": 2,
            "inventoryItems": [
                {"sku": "MUG-01", "availability": {"shipToLocationAvailability": {"quantity": 7}}},
                {"sku": "TEE-01"}
            ]
        }"#;
        let page: InventoryItemsPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.inventory_items[0].available_quantity(), 7);
        assert_eq!(page.inventory_items[1].available_quantity(), 0);
    }

    #[test]
    fn test_api_error_prefers_long_message() {
        let json = r#"{"errors":[{"errorId":1001,"message":"Invalid","longMessage":"Invalid date range"}]}"#;
        let response: ApiErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.first_message().as_deref(), Some("Invalid date range"));
    }
}
