//! In-process router tests.
//!
//! Requests go through the real router and extractors with a lazily
//! connected pool, so only paths that stop before the database are covered
//! here: health, authentication rejections, validation and the eBay guard.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use stockroom_admin::config::AdminConfig;
use stockroom_admin::routes;
use stockroom_admin::state::AppState;
use stockroom_core::{Email, UserId};

fn test_state() -> AppState {
    let config = AdminConfig {
        database_url: SecretString::from("postgres://localhost/stockroom_test"),
        host: "127.0.0.1".parse().unwrap(),
        port: 3001,
        base_url: "http://localhost:3001".to_string(),
        jwt_secret: SecretString::from("k3y-For-Router-Tests-9f8e7d6c5b4a3210"),
        jwt_ttl_hours: 1,
        ebay: None,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
        tls: None,
    };
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/stockroom_test")
        .unwrap();
    AppState::new(config, pool).unwrap()
}

fn app(state: &AppState) -> Router {
    routes::routes().with_state(state.clone())
}

fn bearer(state: &AppState) -> String {
    let email = Email::parse("owner@example.com").unwrap();
    let token = state.jwt().issue(UserId::new(1), &email).unwrap();
    format!("Bearer {token}")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let response = app(&test_state())
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_api_without_token_is_401_json() {
    let response = app(&test_state())
        .oneshot(Request::get("/api/expenses").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Not logged in");
}

#[tokio::test]
async fn test_api_with_forged_token_is_401() {
    let response = app(&test_state())
        .oneshot(
            Request::get("/api/products")
                .header(header::AUTHORIZATION, "Bearer not.a.token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Invalid or expired token");
}

#[tokio::test]
async fn test_page_without_token_redirects_to_login() {
    let response = app(&test_state())
        .oneshot(Request::get("/expenses").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.status().is_redirection());
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/login"
    );
}

#[tokio::test]
async fn test_expense_validation_is_400() {
    let state = test_state();
    let response = app(&state)
        .oneshot(
            Request::post("/api/expenses")
                .header(header::AUTHORIZATION, bearer(&state))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "description": "Bubble wrap",
                        "category": "packaging",
                        "amount": "0",
                        "expense_date": "2026-06-01"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().starts_with("amount"));
}

#[tokio::test]
async fn test_invoice_due_before_issue_is_400() {
    let state = test_state();
    let response = app(&state)
        .oneshot(
            Request::post("/api/invoices")
                .header(header::AUTHORIZATION, bearer(&state))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "invoice_number": "INV-1",
                        "customer_name": "Acme",
                        "issue_date": "2026-06-10",
                        "due_date": "2026-06-01",
                        "subtotal": "100.00",
                        "tax": "0"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().starts_with("due_date"));
}

#[tokio::test]
async fn test_ebay_orders_without_configuration_is_503() {
    let state = test_state();
    let response = app(&state)
        .oneshot(
            Request::get("/api/ebay/orders")
                .header(header::AUTHORIZATION, bearer(&state))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["error"], "eBay integration is not configured");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let response = app(&test_state())
        .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
