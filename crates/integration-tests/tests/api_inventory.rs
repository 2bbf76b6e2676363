//! Stock and cost-of-goods flows against a running server.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`sr-cli migrate`)
//! - The back office running (`cargo run -p stockroom-admin`)

#![allow(clippy::unwrap_used, clippy::expect_used)]

use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;

use stockroom_integration_tests::{TestUser, decimal};

#[tokio::test]
#[ignore = "Requires running back office and database"]
async fn test_replenish_recalculates_cog() {
    let user = TestUser::register().await;

    let (status, product) = user
        .post(
            "/products",
            &json!({
                "sku": "MUG-01",
                "name": "Mug",
                "price": "18.00",
                "quantity": 10,
                "cog": "10.00"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = product["id"].as_i64().unwrap();

    let (status, body) = user
        .post(
            &format!("/products/{id}/replenish"),
            &json!({ "quantity": 10, "unit_cost": "12.00", "supplier": "Clayworks" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["product"]["quantity"], 20);
    assert_eq!(decimal(&body["product"]["cog"]), Decimal::new(11, 0));
    assert_eq!(decimal(&body["replenishment"]["previous_cost"]), Decimal::new(10, 0));
    assert_eq!(decimal(&body["replenishment"]["total_cost"]), Decimal::new(120, 0));

    let (status, history) = user.get(&format!("/products/{id}/replenishments")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "Requires running back office and database"]
async fn test_replenish_from_empty_stock_takes_unit_cost() {
    let user = TestUser::register().await;

    let (_, packaging) = user
        .post("/packaging", &json!({ "name": "Small box" }))
        .await;
    let id = packaging["id"].as_i64().unwrap();

    let (status, body) = user
        .post(
            &format!("/packaging/{id}/replenish"),
            &json!({ "quantity": 100, "unit_cost": "0.35" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["packaging"]["quantity"], 100);
    assert_eq!(decimal(&body["packaging"]["unit_cost"]), Decimal::new(35, 2));
}

#[tokio::test]
#[ignore = "Requires running back office and database"]
async fn test_other_users_product_is_404() {
    let owner = TestUser::register().await;
    let stranger = TestUser::register().await;

    let (_, product) = owner
        .post(
            "/products",
            &json!({ "sku": "PRIVATE", "name": "Secret", "price": "1.00" }),
        )
        .await;
    let id = product["id"].as_i64().unwrap();

    let (status, _) = stranger.get(&format!("/products/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = stranger
        .post(
            &format!("/products/{id}/replenish"),
            &json!({ "quantity": 1, "unit_cost": "1.00" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running back office and database"]
async fn test_duplicate_sku_is_409() {
    let user = TestUser::register().await;
    let product = json!({ "sku": "DUP", "name": "One", "price": "1.00" });

    let (status, _) = user.post("/products", &product).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = user.post("/products", &product).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running back office and database"]
async fn test_product_cannot_use_other_users_packaging() {
    let owner = TestUser::register().await;
    let stranger = TestUser::register().await;

    let (status, packaging) = owner
        .post(
            "/packaging",
            &json!({ "name": "Owner mailer", "unit_cost": "0.40", "quantity": 10 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let packaging_id = packaging["id"].as_i64().unwrap();

    let (status, _) = stranger
        .post(
            "/products",
            &json!({ "sku": "BORROW", "name": "Borrower", "price": "1.00", "packaging_id": packaging_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, product) = stranger
        .post(
            "/products",
            &json!({ "sku": "BORROW", "name": "Borrower", "price": "1.00" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let product_id = product["id"].as_i64().unwrap();

    let (status, _) = stranger
        .put(
            &format!("/products/{product_id}"),
            &json!({ "sku": "BORROW", "name": "Borrower", "price": "1.00", "packaging_id": packaging_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, product) = stranger.get(&format!("/products/{product_id}")).await;
    assert!(product["packaging_id"].is_null());

    // Nothing of the owner's references it, so the owner can delete it.
    let (status, _) = owner.delete(&format!("/packaging/{packaging_id}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "Requires running back office and database"]
async fn test_product_with_deleted_packaging_is_409() {
    let user = TestUser::register().await;

    let (_, packaging) = user
        .post("/packaging", &json!({ "name": "Old box", "unit_cost": "0.20" }))
        .await;
    let packaging_id = packaging["id"].as_i64().unwrap();
    let (status, _) = user.delete(&format!("/packaging/{packaging_id}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = user
        .post(
            "/products",
            &json!({ "sku": "BOXED", "name": "Boxed", "price": "1.00", "packaging_id": packaging_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running back office and database"]
async fn test_product_update_keeps_stock_and_cog() {
    let user = TestUser::register().await;

    let (status, product) = user
        .post(
            "/products",
            &json!({ "sku": "KEEP", "name": "Keeper", "price": "9.00", "quantity": 6, "cog": "2.50" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = product["id"].as_i64().unwrap();

    let (status, product) = user
        .put(
            &format!("/products/{id}"),
            &json!({ "sku": "KEEP", "name": "Keeper v2", "price": "11.00", "quantity": 500, "cog": "0.01" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["name"], "Keeper v2");
    assert_eq!(decimal(&product["price"]), Decimal::new(11, 0));
    assert_eq!(product["quantity"], 6);
    assert_eq!(decimal(&product["cog"]), Decimal::new(25, 1));

    let (status, packaging) = user
        .post(
            "/packaging",
            &json!({ "name": "Tube", "unit_cost": "0.30", "quantity": 40 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let packaging_id = packaging["id"].as_i64().unwrap();

    let (status, packaging) = user
        .put(
            &format!("/packaging/{packaging_id}"),
            &json!({ "name": "Long tube", "unit_cost": "9.99", "quantity": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(packaging["name"], "Long tube");
    assert_eq!(packaging["quantity"], 40);
    assert_eq!(decimal(&packaging["unit_cost"]), Decimal::new(30, 2));
}

#[tokio::test]
#[ignore = "Requires running back office and database"]
async fn test_oversized_replenish_is_400() {
    let user = TestUser::register().await;

    let (_, product) = user
        .post(
            "/products",
            &json!({ "sku": "BULK", "name": "Bulk", "price": "1.00" }),
        )
        .await;
    let id = product["id"].as_i64().unwrap();

    let (status, body) = user
        .post(
            &format!("/products/{id}/replenish"),
            &json!({ "quantity": 2_147_483_647, "unit_cost": "1.00" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("quantity"));
}
