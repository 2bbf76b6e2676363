//! Purchase order, expense and invoice flows against a running server.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`sr-cli migrate`)
//! - The back office running (`cargo run -p stockroom-admin`)

#![allow(clippy::unwrap_used, clippy::expect_used)]

use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{Value, json};

use stockroom_integration_tests::{TestUser, decimal};

async fn create_product(user: &TestUser, sku: &str) -> i64 {
    let (status, product) = user
        .post(
            "/products",
            &json!({ "sku": sku, "name": sku, "price": "20.00", "quantity": 4, "cog": "5.00" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    product["id"].as_i64().unwrap()
}

async fn set_po_status(user: &TestUser, id: i64, status: &str) -> (StatusCode, Value) {
    user.post(
        &format!("/purchase-orders/{id}/status"),
        &json!({ "status": status }),
    )
    .await
}

#[tokio::test]
#[ignore = "Requires running back office and database"]
async fn test_receive_purchase_order_then_book_expenses() {
    let user = TestUser::register().await;
    let product_id = create_product(&user, "TEE-01").await;

    let (status, po) = user
        .post(
            "/purchase-orders",
            &json!({
                "po_number": "PO-1001",
                "supplier": "Cotton Co",
                "order_date": "2026-06-01",
                "shipping_cost": "8.00",
                "items": [
                    { "product_id": product_id, "quantity": 4, "unit_cost": "7.00" },
                    { "description": "Free samples", "quantity": 2, "unit_cost": "0" }
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let po_id = po["id"].as_i64().unwrap();
    assert_eq!(decimal(&po["total"]), Decimal::new(36, 0));

    // Drafts cannot be received or expensed.
    let (status, _) = set_po_status(&user, po_id, "received").await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = user
        .post(&format!("/purchase-orders/{po_id}/expenses"), &json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = set_po_status(&user, po_id, "ordered").await;
    assert_eq!(status, StatusCode::OK);

    let (status, outcome) = set_po_status(&user, po_id, "received").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["replenishments"].as_array().unwrap().len(), 1);

    let (_, product) = user.get(&format!("/products/{product_id}")).await;
    assert_eq!(product["quantity"], 8);
    // Shipping lands on the only costed line: 7.00 + 8.00 / 4 = 9.00 per unit.
    assert_eq!(decimal(&product["cog"]), Decimal::new(7, 0));

    let (status, result) = user
        .post(&format!("/purchase-orders/{po_id}/expenses"), &json!({}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    // One line plus shipping; the zero-cost line is skipped.
    assert_eq!(result["created"].as_array().unwrap().len(), 2);
    assert!(result["failed"].as_array().unwrap().is_empty());

    let (status, _) = user
        .post(&format!("/purchase-orders/{po_id}/expenses"), &json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, summary) = user.get("/expenses/summary?from=2026-01-01").await;
    assert!(decimal(&summary["total"]) >= Decimal::new(36, 0));
}

#[tokio::test]
#[ignore = "Requires running back office and database"]
async fn test_invoice_lifecycle() {
    let user = TestUser::register().await;

    let (status, invoice) = user
        .post(
            "/invoices",
            &json!({
                "invoice_number": "INV-0001",
                "customer_name": "Acme Ltd",
                "customer_email": "billing@acme.example",
                "issue_date": "2026-06-01",
                "due_date": "2026-06-30",
                "subtotal": "100.00",
                "tax": "8.25"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(invoice["status"], "draft");
    assert_eq!(decimal(&invoice["total"]), Decimal::new(10825, 2));
    let id = invoice["id"].as_i64().unwrap();

    let (status, _) = user
        .post(&format!("/invoices/{id}/status"), &json!({ "status": "paid" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, sent) = user
        .post(&format!("/invoices/{id}/status"), &json!({ "status": "sent" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sent["status"], "sent");

    let (status, paid) = user
        .post(&format!("/invoices/{id}/status"), &json!({ "status": "paid" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(paid["paid_at"].is_string());

    let (_, listed) = user.get("/invoices?status=paid").await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "Requires running back office and database"]
async fn test_purchase_order_cannot_link_other_users_stock() {
    let owner = TestUser::register().await;
    let stranger = TestUser::register().await;
    let product_id = create_product(&owner, "OWNED-01").await;
    let (status, packaging) = owner
        .post("/packaging", &json!({ "name": "Owned box", "unit_cost": "0.50" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let packaging_id = packaging["id"].as_i64().unwrap();

    let (status, _) = stranger
        .post(
            "/purchase-orders",
            &json!({
                "po_number": "PO-X1",
                "supplier": "Anyone",
                "order_date": "2026-06-01",
                "items": [{ "product_id": product_id, "quantity": 1, "unit_cost": "1.00" }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = stranger
        .post(
            "/purchase-orders",
            &json!({
                "po_number": "PO-X2",
                "supplier": "Anyone",
                "order_date": "2026-06-01",
                "items": [{ "packaging_id": packaging_id, "quantity": 1, "unit_cost": "1.00" }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, orders) = stranger.get("/purchase-orders").await;
    assert!(orders.as_array().unwrap().is_empty());
}

#[tokio::test]
#[ignore = "Requires running back office and database"]
async fn test_concurrent_expense_booking_books_once() {
    let user = TestUser::register().await;
    let product_id = create_product(&user, "RACE-01").await;

    let (status, po) = user
        .post(
            "/purchase-orders",
            &json!({
                "po_number": "PO-2001",
                "supplier": "Race Co",
                "order_date": "2026-06-01",
                "shipping_cost": "3.00",
                "items": [{ "product_id": product_id, "quantity": 2, "unit_cost": "4.00" }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let po_id = po["id"].as_i64().unwrap();
    let (status, _) = set_po_status(&user, po_id, "ordered").await;
    assert_eq!(status, StatusCode::OK);

    let path = format!("/purchase-orders/{po_id}/expenses");
    let empty = json!({});
    let ((first, _), (second, _)) =
        tokio::join!(user.post(&path, &empty), user.post(&path, &empty));

    let mut statuses = [first, second];
    statuses.sort_by_key(StatusCode::as_u16);
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);

    let (_, summary) = user.get("/expenses/summary?from=2026-01-01").await;
    assert_eq!(decimal(&summary["total"]), Decimal::new(11, 0));
}
