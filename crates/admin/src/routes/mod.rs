//! HTTP route handlers for the back office.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness
//! GET  /health/ready                    - Readiness (database reachable)
//!
//! # Pages (server rendered, token cookie)
//! GET  /login, /register                - Auth forms
//! GET  /                                - Dashboard
//! GET  /expenses, /products, /packaging, /purchase-orders, /invoices, /ebay
//!
//! # Auth & account
//! POST /api/auth/register               - Create account, returns token
//! POST /api/auth/login                  - Returns token
//! POST /api/auth/logout                 - Clears the token cookie
//! GET  /api/auth/me                     - Current user and plan
//! GET  /api/plans                       - All plans
//! PUT  /api/account/plan                - Switch plan
//!
//! # Records
//! /api/expenses[/{id}], /api/expenses/summary
//! /api/invoices[/{id}], /api/invoices/{id}/status
//! /api/products[/{id}], /api/products/{id}/replenish, /api/products/{id}/replenishments
//! /api/packaging[/{id}], /api/packaging/{id}/replenish, /api/packaging/{id}/replenishments
//! /api/purchase-orders[/{id}], /api/purchase-orders/{id}/status, /api/purchase-orders/{id}/expenses
//!
//! # eBay
//! GET  /ebay/connect                    - Redirect to eBay consent
//! GET  /ebay/callback                   - OAuth redirect target
//! GET  /api/ebay/status
//! POST /api/ebay/disconnect
//! GET  /api/ebay/orders, /api/ebay/listings, /api/ebay/analytics/traffic
//! ```

pub mod account;
pub mod auth;
pub mod dashboard;
pub mod ebay;
pub mod expenses;
pub mod invoices;
pub mod packaging;
pub mod pages;
pub mod products;
pub mod purchase_orders;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};
use serde::Deserialize;

use crate::db::Page;
use crate::state::AppState;

/// `limit` / `offset` query parameters shared by list endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl From<Pagination> for Page {
    fn from(p: Pagination) -> Self {
        Self::new(p.limit, p.offset)
    }
}

/// JSON API routes, mounted under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/plans", get(account::list_plans))
        .route("/account/plan", put(account::change_plan))
        .merge(expenses::router())
        .merge(invoices::router())
        .merge(products::router())
        .merge(packaging::router())
        .merge(purchase_orders::router())
        .merge(ebay::api_router())
}

/// Server-rendered pages.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::dashboard))
        .route("/login", get(pages::login))
        .route("/register", get(pages::register))
        .route("/expenses", get(pages::expenses))
        .route("/products", get(pages::products))
        .route("/packaging", get(pages::packaging))
        .route("/purchase-orders", get(pages::purchase_orders))
        .route("/invoices", get(pages::invoices))
        .route("/ebay", get(pages::ebay))
        .route("/ebay/connect", get(ebay::connect))
        .route("/ebay/callback", get(ebay::callback))
}

/// Create all routes for the back office.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(page_routes())
        .nest("/api", api_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let page: Page = Pagination::default().into();
        assert_eq!(page, Page::default());

        let page: Page = Pagination {
            limit: Some(500),
            offset: Some(-1),
        }
        .into();
        assert_eq!(page.limit, crate::db::MAX_PAGE_SIZE);
        assert_eq!(page.offset, 0);
    }
}
