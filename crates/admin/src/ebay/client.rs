//! eBay REST and OAuth client.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use stockroom_core::EbayEnvironment;

use super::auth::{EbayToken, TokenErrorResponse, TokenResponse};
use super::types::{ApiErrorResponse, InventoryItemsPage, OrdersPage};
use super::EbayError;
use crate::config::EbayConfig;

/// Largest page eBay serves for orders and inventory items.
pub const MAX_PAGE_SIZE: u32 = 200;

/// eBay API client.
///
/// Holds the application credentials. User access tokens are passed to each
/// REST call so one client serves every connected user.
#[derive(Clone)]
pub struct EbayClient {
    inner: Arc<EbayClientInner>,
}

struct EbayClientInner {
    http: reqwest::Client,
    config: EbayConfig,
}

impl EbayClient {
    /// Create a client for the configured eBay application.
    ///
    /// # Errors
    ///
    /// Returns `EbayError::Http` if the HTTP client cannot be built.
    pub fn new(config: EbayConfig) -> Result<Self, EbayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            inner: Arc::new(EbayClientInner { http, config }),
        })
    }

    /// Sandbox or production.
    #[must_use]
    pub fn environment(&self) -> EbayEnvironment {
        self.inner.config.environment
    }

    /// Scopes requested during authorization.
    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.inner.config.scopes
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{path}", self.environment().api_host())
    }

    // =========================================================================
    // OAuth
    // =========================================================================

    /// URL of eBay's consent page for the authorization-code grant.
    ///
    /// # Errors
    ///
    /// Returns `EbayError::Parse` if the URL cannot be built.
    pub fn authorization_url(&self, state: &str) -> Result<Url, EbayError> {
        let config = &self.inner.config;
        let base = format!("{}/oauth2/authorize", config.environment.auth_host());
        let scope = config.scopes.join(" ");

        Url::parse_with_params(
            &base,
            &[
                ("client_id", config.client_id.as_str()),
                ("redirect_uri", config.ru_name.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| EbayError::Parse(e.to_string()))
    }

    /// Exchange an authorization code for user tokens.
    ///
    /// # Errors
    ///
    /// Returns `EbayError::OAuth` if eBay rejects the code.
    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str) -> Result<EbayToken, EbayError> {
        let config = &self.inner.config;
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", config.ru_name.as_str()),
        ])
        .await
    }

    /// Obtain a new access token from a refresh token.
    ///
    /// eBay does not rotate refresh tokens, so the result usually has none;
    /// use [`EbayToken::inherit_refresh_token`] before storing it.
    ///
    /// # Errors
    ///
    /// Returns `EbayError::OAuth` if the refresh token is invalid or expired.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_token(&self, refresh_token: &SecretString) -> Result<EbayToken, EbayError> {
        let scopes = self.inner.config.scopes.join(" ");
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.expose_secret()),
            ("scope", scopes.as_str()),
        ])
        .await
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<EbayToken, EbayError> {
        let config = &self.inner.config;
        let now = chrono::Utc::now().timestamp();

        let response = self
            .inner
            .http
            .post(self.api_url("/identity/v1/oauth2/token"))
            .basic_auth(&config.client_id, Some(config.client_secret.expose_secret()))
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let body: TokenResponse = response.json().await?;
            return Ok(body.into_token(now));
        }

        let text = response.text().await.unwrap_or_default();
        let error = serde_json::from_str::<TokenErrorResponse>(&text).map_or_else(
            |_| EbayError::Api {
                status: status.as_u16(),
                message: truncate(&text),
            },
            |body| body.into_error(status.as_u16()),
        );

        tracing::warn!(status = %status, error = %error, "eBay token request failed");
        Err(error)
    }

    // =========================================================================
    // Sell APIs
    // =========================================================================

    /// One page of the seller's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `EbayError::Unauthorized` if the token is rejected.
    #[instrument(skip(self, access_token))]
    pub async fn get_orders(
        &self,
        access_token: &SecretString,
        limit: u32,
        offset: u32,
    ) -> Result<OrdersPage, EbayError> {
        self.get_json(
            access_token,
            "/sell/fulfillment/v1/order",
            &[
                ("limit", limit.clamp(1, MAX_PAGE_SIZE).to_string()),
                ("offset", offset.to_string()),
            ],
        )
        .await
    }

    /// One page of the seller's inventory items (listings by SKU).
    ///
    /// # Errors
    ///
    /// Returns `EbayError::Unauthorized` if the token is rejected.
    #[instrument(skip(self, access_token))]
    pub async fn get_inventory_items(
        &self,
        access_token: &SecretString,
        limit: u32,
        offset: u32,
    ) -> Result<InventoryItemsPage, EbayError> {
        self.get_json(
            access_token,
            "/sell/inventory/v1/inventory_item",
            &[
                ("limit", limit.clamp(1, MAX_PAGE_SIZE).to_string()),
                ("offset", offset.to_string()),
            ],
        )
        .await
    }

    /// Daily listing traffic between two dates (inclusive).
    ///
    /// The report's shape depends on the requested metrics, so it is passed
    /// through as JSON.
    ///
    /// # Errors
    ///
    /// Returns `EbayError::Unauthorized` if the token is rejected.
    #[instrument(skip(self, access_token))]
    pub async fn get_traffic_report(
        &self,
        access_token: &SecretString,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<serde_json::Value, EbayError> {
        self.get_json(
            access_token,
            "/sell/analytics/v1/traffic_report",
            &[
                ("dimension", "DAY".to_string()),
                ("metric", TRAFFIC_METRICS.to_string()),
                (
                    "filter",
                    traffic_filter(&self.inner.config.marketplace_id, start, end),
                ),
            ],
        )
        .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        access_token: &SecretString,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, EbayError> {
        let response = self
            .inner
            .http
            .get(self.api_url(path))
            .bearer_auth(access_token.expose_secret())
            .header("X-EBAY-C-MARKETPLACE-ID", &self.inner.config.marketplace_id)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let text = response.text().await?;
            return serde_json::from_str(&text).map_err(|e| EbayError::Parse(e.to_string()));
        }

        match status {
            StatusCode::UNAUTHORIZED => Err(EbayError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok());
                Err(EbayError::RateLimited(retry_after))
            }
            _ => {
                let text = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ApiErrorResponse>(&text)
                    .ok()
                    .and_then(ApiErrorResponse::first_message)
                    .unwrap_or_else(|| truncate(&text));
                Err(EbayError::Api {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

const TRAFFIC_METRICS: &str =
    "LISTING_IMPRESSION_TOTAL,LISTING_VIEWS_TOTAL,CLICK_THROUGH_RATE,TRANSACTION";

/// `filter` parameter of the traffic report,
/// e.g. `marketplace_ids:{EBAY_US},date_range:[20260601..20260630]`.
fn traffic_filter(marketplace_id: &str, start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "marketplace_ids:{{{marketplace_id}}},date_range:[{}..{}]",
        start.format("%Y%m%d"),
        end.format("%Y%m%d")
    )
}

fn truncate(text: &str) -> String {
    const MAX: usize = 300;
    if text.len() <= MAX {
        return text.to_string();
    }
    let mut end = MAX;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", text.get(..end).unwrap_or_default())
}
