//! Integration tests for Stockroom.
//!
//! # Running Tests
//!
//! ```bash
//! # Router tests (no database or server needed)
//! cargo test -p stockroom-integration-tests
//!
//! # End-to-end tests against a running server with a migrated database
//! sr-cli migrate
//! cargo run -p stockroom-admin &
//! cargo test -p stockroom-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `api_router` - In-process requests through the full router
//! - `api_auth`, `api_inventory`, `api_purchasing` - HTTP flows against a
//!   live server (`STOCKROOM_BASE_URL`, default `http://localhost:3001`)

#![allow(clippy::unwrap_used, clippy::expect_used)]

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL of the server under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("STOCKROOM_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// A signed-in HTTP client plus the token it was issued.
pub struct TestUser {
    pub client: Client,
    pub token: String,
    pub email: String,
}

impl TestUser {
    /// Register a fresh account; the auth cookie lands in the client's jar.
    pub async fn register() -> Self {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");
        let email = format!("it-{}@example.com", Uuid::new_v4().simple());

        let resp = client
            .post(format!("{}/api/auth/register", base_url()))
            .json(&json!({
                "email": email,
                "name": "Integration Test",
                "password": "integration-password",
            }))
            .send()
            .await
            .expect("Failed to register");
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body: Value = resp.json().await.expect("Invalid register response");
        let token = body["token"].as_str().expect("token missing").to_string();

        Self {
            client,
            token,
            email,
        }
    }

    /// `POST` JSON to an API path and return status and body.
    pub async fn post(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        let resp = self
            .client
            .post(format!("{}/api{path}", base_url()))
            .json(body)
            .send()
            .await
            .expect("Request failed");
        read(resp).await
    }

    /// `PUT` JSON to an API path and return status and body.
    pub async fn put(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        let resp = self
            .client
            .put(format!("{}/api{path}", base_url()))
            .json(body)
            .send()
            .await
            .expect("Request failed");
        read(resp).await
    }

    /// `DELETE` an API path and return status and body.
    pub async fn delete(&self, path: &str) -> (StatusCode, Value) {
        let resp = self
            .client
            .delete(format!("{}/api{path}", base_url()))
            .send()
            .await
            .expect("Request failed");
        read(resp).await
    }

    /// `GET` an API path and return status and body.
    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        let resp = self
            .client
            .get(format!("{}/api{path}", base_url()))
            .send()
            .await
            .expect("Request failed");
        read(resp).await
    }
}

async fn read(resp: reqwest::Response) -> (StatusCode, Value) {
    let status = resp.status();
    let text = resp.text().await.expect("Failed to read response");
    let body = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };
    (status, body)
}

/// Parse a decimal serialized as a JSON string.
#[must_use]
pub fn decimal(value: &Value) -> rust_decimal::Decimal {
    value
        .as_str()
        .expect("decimal should be a string")
        .parse()
        .expect("invalid decimal")
}
