//! Database operations for the back office.
//!
//! # Schema: `backoffice`
//!
//! ## Tables
//!
//! - `plan` - Subscription plans and their product limits
//! - `app_user` - Accounts (email + Argon2id password hash)
//! - `expense` - Expenses, optionally linked to a purchase order
//! - `invoice` - Customer invoices (total computed by the database)
//! - `product`, `packaging` - Stock with its current cost of goods
//! - `replenishment` - Append-only stock receipts with previous/new COG
//! - `purchase_order`, `purchase_order_item` - Supplier orders
//! - `ebay_token` - OAuth tokens, one row per connected user
//! - `session` - tower-sessions storage
//!
//! Every owned row carries a `user_id`; every query filters by it, so a row
//! belonging to someone else reads the same as a missing one.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p stockroom-cli -- migrate
//! ```

pub mod ebay_tokens;
pub mod expenses;
pub mod invoices;
pub mod packaging;
pub mod plans;
pub mod products;
pub mod purchase_orders;
pub mod replenishments;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use ebay_tokens::EbayTokenRepository;
pub use expenses::ExpenseRepository;
pub use invoices::InvoiceRepository;
pub use packaging::PackagingRepository;
pub use plans::PlanRepository;
pub use products::ProductRepository;
pub use purchase_orders::PurchaseOrderRepository;
pub use replenishments::ReplenishmentRepository;
pub use users::UserRepository;

/// Page size used when a list request does not ask for one.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Largest page a list request may ask for.
pub const MAX_PAGE_SIZE: i64 = 200;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation or illegal state change.
    #[error("{0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Convert a unique-constraint violation into [`RepositoryError::Conflict`]
    /// with `message`; other errors pass through unchanged.
    pub(crate) fn on_unique_violation(err: sqlx::Error, message: &str) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::Conflict(message.to_string())
            }
            _ => Self::Database(err),
        }
    }
}

/// `LIMIT` / `OFFSET` pair, clamped to sane bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// Clamp optional request values: limit to `1..=MAX_PAGE_SIZE`, offset to `>= 0`.
    #[must_use]
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self {
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
