//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AdminConfig;
use crate::ebay::{EbayClient, EbayError};
use crate::error::AppError;
use crate::services::JwtKeys;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    jwt: JwtKeys,
    ebay: Option<EbayClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The eBay client is only built when `EBAY_*` credentials are configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the eBay HTTP client cannot be created.
    pub fn new(config: AdminConfig, pool: PgPool) -> Result<Self, EbayError> {
        let jwt = JwtKeys::new(&config.jwt_secret, config.jwt_ttl_hours);
        let ebay = config.ebay().cloned().map(EbayClient::new).transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                jwt,
                ebay,
            }),
        })
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Token signing and verification keys.
    #[must_use]
    pub fn jwt(&self) -> &JwtKeys {
        &self.inner.jwt
    }

    /// The eBay client, if the integration is configured.
    #[must_use]
    pub fn ebay(&self) -> Option<&EbayClient> {
        self.inner.ebay.as_ref()
    }

    /// The eBay client, or a 503 if the integration is not configured.
    ///
    /// # Errors
    ///
    /// Returns `AppError::EbayNotConfigured` when `EBAY_*` is unset.
    pub fn require_ebay(&self) -> Result<&EbayClient, AppError> {
        self.ebay().ok_or(AppError::EbayNotConfigured)
    }
}
