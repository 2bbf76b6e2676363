//! eBay connection lifecycle.
//!
//! Every eBay call goes through [`EbayService::access_token`], which refreshes
//! and persists the user's token when it is about to expire.

use secrecy::SecretString;
use sqlx::PgPool;
use tracing::instrument;

use stockroom_core::UserId;

use crate::db::EbayTokenRepository;
use crate::db::ebay_tokens::EbayConnection;
use crate::ebay::{EbayClient, EbayToken};
use crate::error::AppError;

/// Refresh when the access token has less than this many seconds left.
pub const REFRESH_WINDOW_SECS: i64 = 300;

/// What to do with a stored token before calling eBay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenAction {
    /// Token is good for a while yet.
    Use,
    /// Token is close to expiry and a refresh token is available.
    Refresh,
    /// Token cannot be used or refreshed; the user has to reconnect.
    Reconnect,
}

/// Decide how to get a usable access token from `token`.
#[must_use]
pub fn token_action(token: &EbayToken) -> TokenAction {
    if !token.expires_within(REFRESH_WINDOW_SECS) {
        TokenAction::Use
    } else if token.can_refresh() {
        TokenAction::Refresh
    } else if token.is_expired() {
        TokenAction::Reconnect
    } else {
        TokenAction::Use
    }
}

/// eBay connection service for one request.
pub struct EbayService<'a> {
    client: &'a EbayClient,
    tokens: EbayTokenRepository<'a>,
}

impl<'a> EbayService<'a> {
    /// Create a new eBay service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, client: &'a EbayClient) -> Self {
        Self {
            client,
            tokens: EbayTokenRepository::new(pool),
        }
    }

    /// Finish the OAuth flow: exchange `code` and store the tokens.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Ebay` if eBay rejects the code.
    #[instrument(skip(self, code), fields(user_id = %user_id))]
    pub async fn connect(&self, user_id: UserId, code: &str) -> Result<EbayConnection, AppError> {
        let token = self.client.exchange_code(code).await?;
        let connection = self
            .tokens
            .save(user_id, self.client.environment(), &token, self.client.scopes())
            .await?;

        tracing::info!(environment = %connection.environment, "eBay account connected");
        Ok(connection)
    }

    /// A usable access token, refreshed and persisted first if needed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::EbayNotConnected` if there is no stored token or it
    /// has expired beyond refresh.
    /// Returns `AppError::Ebay` if the refresh grant fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn access_token(&self, user_id: UserId) -> Result<SecretString, AppError> {
        let connection = self
            .tokens
            .get(user_id)
            .await?
            .ok_or(AppError::EbayNotConnected)?;

        if connection.environment != self.client.environment() {
            tracing::warn!(
                stored = %connection.environment,
                configured = %self.client.environment(),
                "eBay token belongs to another environment"
            );
            return Err(AppError::EbayNotConnected);
        }

        match token_action(&connection.token) {
            TokenAction::Use => Ok(connection.token.access_token),
            TokenAction::Reconnect => {
                tracing::warn!("eBay token expired and cannot be refreshed");
                Err(AppError::EbayNotConnected)
            }
            TokenAction::Refresh => {
                let Some(refresh_token) = connection.token.refresh_token.as_ref() else {
                    return Err(AppError::EbayNotConnected);
                };

                let refreshed = self
                    .client
                    .refresh_token(refresh_token)
                    .await?
                    .inherit_refresh_token(&connection.token);

                if !self.tokens.update_tokens(user_id, &refreshed).await? {
                    return Err(AppError::EbayNotConnected);
                }

                tracing::debug!(
                    expires_at = refreshed.access_token_expires_at,
                    "eBay access token refreshed"
                );
                Ok(refreshed.access_token)
            }
        }
    }
}
