//! Packaging repository.

use sqlx::PgPool;

use stockroom_core::{PackagingId, UserId};

use super::RepositoryError;
use crate::models::{Packaging, PackagingInput};

/// Repository for packaging database operations.
pub struct PackagingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PackagingRepository<'a> {
    /// Create a new packaging repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's packaging by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Packaging>, RepositoryError> {
        let packaging = sqlx::query_as::<_, Packaging>(
            r"
            SELECT id, user_id, name, description, unit_cost, quantity, created_at, updated_at
            FROM backoffice.packaging
            WHERE user_id = $1 AND deleted_at IS NULL
            ORDER BY name, id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(packaging)
    }

    /// Get one of a user's packaging records.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        user_id: UserId,
        id: PackagingId,
    ) -> Result<Option<Packaging>, RepositoryError> {
        let packaging = sqlx::query_as::<_, Packaging>(
            r"
            SELECT id, user_id, name, description, unit_cost, quantity, created_at, updated_at
            FROM backoffice.packaging
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            ",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(packaging)
    }

    /// Create a packaging record.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        input: &PackagingInput,
    ) -> Result<Packaging, RepositoryError> {
        let packaging = sqlx::query_as::<_, Packaging>(
            r"
            INSERT INTO backoffice.packaging (user_id, name, description, unit_cost, quantity)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, name, description, unit_cost, quantity, created_at, updated_at
            ",
        )
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.unit_cost)
        .bind(input.quantity)
        .fetch_one(self.pool)
        .await?;

        Ok(packaging)
    }

    /// Replace a packaging record's name and description.
    ///
    /// Unit cost and quantity are opening values; afterwards they move only
    /// through replenishment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the record does not exist.
    pub async fn update(
        &self,
        user_id: UserId,
        id: PackagingId,
        input: &PackagingInput,
    ) -> Result<Packaging, RepositoryError> {
        let packaging = sqlx::query_as::<_, Packaging>(
            r"
            UPDATE backoffice.packaging
            SET name = $3,
                description = $4,
                updated_at = now()
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            RETURNING id, user_id, name, description, unit_cost, quantity, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.description)
        .fetch_optional(self.pool)
        .await?;

        packaging.ok_or(RepositoryError::NotFound)
    }

    /// Whether a live product still uses this packaging.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn is_in_use(&self, user_id: UserId, id: PackagingId) -> Result<bool, RepositoryError> {
        let in_use = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (
                SELECT 1
                FROM backoffice.product
                WHERE user_id = $1 AND packaging_id = $2 AND deleted_at IS NULL
            )
            ",
        )
        .bind(user_id)
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(in_use)
    }

    /// Soft-delete a packaging record. Returns `false` if there was nothing to delete.
    ///
    /// The delete statement re-checks for referencing products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a live product references it.
    pub async fn soft_delete(
        &self,
        user_id: UserId,
        id: PackagingId,
    ) -> Result<bool, RepositoryError> {
        if self.is_in_use(user_id, id).await? {
            return Err(RepositoryError::Conflict(
                "packaging is still used by a product".to_string(),
            ));
        }

        let result = sqlx::query(
            r"
            UPDATE backoffice.packaging
            SET deleted_at = now(), updated_at = now()
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
              AND NOT EXISTS (
                  SELECT 1 FROM backoffice.product
                  WHERE packaging_id = $1 AND user_id = $2 AND deleted_at IS NULL
              )
            ",
        )
        .bind(id)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
