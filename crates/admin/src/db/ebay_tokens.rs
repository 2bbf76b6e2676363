//! eBay OAuth token repository.
//!
//! One row per connected user. Tokens are stored as issued by eBay and are
//! wrapped in [`SecretString`] as soon as they leave the database.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;

use stockroom_core::{EbayEnvironment, EbayTokenId, UserId};

use super::RepositoryError;
use crate::ebay::EbayToken;

/// A user's stored eBay connection.
///
/// Implements `Debug` manually to redact tokens.
#[derive(Clone)]
pub struct EbayConnection {
    pub id: EbayTokenId,
    pub user_id: UserId,
    pub environment: EbayEnvironment,
    pub token: EbayToken,
    pub scopes: Vec<String>,
    pub connected_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for EbayConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EbayConnection")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("environment", &self.environment)
            .field("token", &self.token)
            .field("scopes", &self.scopes)
            .field("connected_at", &self.connected_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

#[derive(sqlx::FromRow)]
struct EbayTokenRow {
    id: EbayTokenId,
    user_id: UserId,
    environment: EbayEnvironment,
    access_token: String,
    refresh_token: Option<String>,
    access_token_expires_at: i64,
    refresh_token_expires_at: Option<i64>,
    scopes: Vec<String>,
    connected_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EbayTokenRow> for EbayConnection {
    fn from(row: EbayTokenRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            environment: row.environment,
            token: EbayToken {
                access_token: SecretString::from(row.access_token),
                refresh_token: row.refresh_token.map(SecretString::from),
                access_token_expires_at: row.access_token_expires_at,
                refresh_token_expires_at: row.refresh_token_expires_at,
            },
            scopes: row.scopes,
            connected_at: row.connected_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for eBay token database operations.
pub struct EbayTokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> EbayTokenRepository<'a> {
    /// Create a new eBay token repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user's connection, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, user_id: UserId) -> Result<Option<EbayConnection>, RepositoryError> {
        let row = sqlx::query_as::<_, EbayTokenRow>(
            r"
            SELECT id, user_id, environment, access_token, refresh_token,
                   access_token_expires_at, refresh_token_expires_at, scopes,
                   connected_at, updated_at
            FROM backoffice.ebay_token
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(EbayConnection::from))
    }

    /// Store a freshly authorized connection, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn save(
        &self,
        user_id: UserId,
        environment: EbayEnvironment,
        token: &EbayToken,
        scopes: &[String],
    ) -> Result<EbayConnection, RepositoryError> {
        let row = sqlx::query_as::<_, EbayTokenRow>(
            r"
            INSERT INTO backoffice.ebay_token (
                user_id, environment, access_token, refresh_token,
                access_token_expires_at, refresh_token_expires_at, scopes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id) DO UPDATE SET
                environment = EXCLUDED.environment,
                access_token = EXCLUDED.access_token,
                refresh_token = EXCLUDED.refresh_token,
                access_token_expires_at = EXCLUDED.access_token_expires_at,
                refresh_token_expires_at = EXCLUDED.refresh_token_expires_at,
                scopes = EXCLUDED.scopes,
                connected_at = now(),
                updated_at = now()
            RETURNING id, user_id, environment, access_token, refresh_token,
                      access_token_expires_at, refresh_token_expires_at, scopes,
                      connected_at, updated_at
            ",
        )
        .bind(user_id)
        .bind(environment)
        .bind(token.access_token.expose_secret())
        .bind(token.refresh_token.as_ref().map(|t| t.expose_secret()))
        .bind(token.access_token_expires_at)
        .bind(token.refresh_token_expires_at)
        .bind(scopes)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Replace the tokens after a refresh. Returns `false` if the user has
    /// disconnected in the meantime.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_tokens(
        &self,
        user_id: UserId,
        token: &EbayToken,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE backoffice.ebay_token
            SET access_token = $2,
                refresh_token = $3,
                access_token_expires_at = $4,
                refresh_token_expires_at = $5,
                updated_at = now()
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .bind(token.access_token.expose_secret())
        .bind(token.refresh_token.as_ref().map(|t| t.expose_secret()))
        .bind(token.access_token_expires_at)
        .bind(token.refresh_token_expires_at)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Forget a user's connection. Returns `false` if there was none.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM backoffice.ebay_token WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
