//! Account flows against a running server.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`sr-cli migrate`)
//! - The back office running (`cargo run -p stockroom-admin`)
//!
//! Run with: `cargo test -p stockroom-integration-tests -- --ignored`

#![allow(clippy::unwrap_used, clippy::expect_used)]

use reqwest::{Client, StatusCode};
use serde_json::json;

use stockroom_integration_tests::{TestUser, base_url};

#[tokio::test]
#[ignore = "Requires running back office and database"]
async fn test_register_then_me() {
    let user = TestUser::register().await;

    let (status, body) = user.get("/auth/me").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], user.email.as_str());
    assert_eq!(body["plan"]["code"], "free");
}

#[tokio::test]
#[ignore = "Requires running back office and database"]
async fn test_duplicate_registration_is_409() {
    let user = TestUser::register().await;

    let resp = Client::new()
        .post(format!("{}/api/auth/register", base_url()))
        .json(&json!({
            "email": user.email,
            "name": "Someone Else",
            "password": "another-password",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running back office and database"]
async fn test_login_wrong_password_is_401() {
    let user = TestUser::register().await;

    let resp = Client::new()
        .post(format!("{}/api/auth/login", base_url()))
        .json(&json!({ "email": user.email, "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running back office and database"]
async fn test_bearer_token_works_without_cookie() {
    let user = TestUser::register().await;

    let resp = Client::new()
        .get(format!("{}/api/auth/me", base_url()))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running back office and database"]
async fn test_logout_clears_cookie() {
    let user = TestUser::register().await;

    let (status, _) = user.post("/auth/logout", &json!({})).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = user.get("/auth/me").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running back office and database"]
async fn test_free_plan_product_limit() {
    let user = TestUser::register().await;

    let (_, plans) = user.get("/plans").await;
    let limit = plans
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["code"] == "free")
        .and_then(|p| p["max_products"].as_i64())
        .expect("free plan should be limited");

    for n in 0..limit {
        let (status, _) = user
            .post(
                "/products",
                &json!({ "sku": format!("SKU-{n}"), "name": "Widget", "price": "5.00" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = user
        .post(
            "/products",
            &json!({ "sku": "SKU-OVER", "name": "Widget", "price": "5.00" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());

    // Moving down is refused while over the target plan's limit; moving up works.
    let resp = user
        .client
        .put(format!("{}/api/account/plan", base_url()))
        .json(&json!({ "plan_code": "pro" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let (status, _) = user
        .post(
            "/products",
            &json!({ "sku": "SKU-OVER", "name": "Widget", "price": "5.00" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}
