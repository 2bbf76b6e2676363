//! Product repository.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use stockroom_core::{PackagingId, ProductId, UserId};

use super::{Page, RepositoryError};
use crate::models::{Product, ProductInput};

const DUPLICATE_SKU: &str = "a product with this SKU already exists";

/// Repository for product database operations.
///
/// Stock level and COG changes driven by receipts go through
/// [`super::ReplenishmentRepository`]; this repository only does plain CRUD.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's products by SKU, optionally matching `search` against SKU or name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        user_id: UserId,
        search: Option<&str>,
        page: Page,
    ) -> Result<Vec<Product>, RepositoryError> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)));

        let products = sqlx::query_as::<_, Product>(
            r"
            SELECT id, user_id, sku, name, description, price, quantity, cog, packaging_id,
                   ebay_item_id, created_at, updated_at
            FROM backoffice.product
            WHERE user_id = $1
              AND deleted_at IS NULL
              AND ($2::text IS NULL OR sku ILIKE $2 OR name ILIKE $2)
            ORDER BY sku
            LIMIT $3 OFFSET $4
            ",
        )
        .bind(user_id)
        .bind(pattern)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Get one of a user's products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        user_id: UserId,
        id: ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            r"
            SELECT id, user_id, sku, name, description, price, quantity, cog, packaging_id,
                   ebay_item_id, created_at, updated_at
            FROM backoffice.product
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            ",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Create a product with its opening stock and cost.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the SKU is taken or the
    /// packaging is not one of the user's live records.
    pub async fn create(
        &self,
        user_id: UserId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        check_packaging(&mut tx, user_id, input.packaging_id).await?;

        let product = sqlx::query_as::<_, Product>(
            r"
            INSERT INTO backoffice.product (
                user_id, sku, name, description, price, quantity, cog, packaging_id, ebay_item_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, user_id, sku, name, description, price, quantity, cog, packaging_id,
                      ebay_item_id, created_at, updated_at
            ",
        )
        .bind(user_id)
        .bind(&input.sku)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.quantity)
        .bind(input.cog)
        .bind(input.packaging_id)
        .bind(&input.ebay_item_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::on_unique_violation(e, DUPLICATE_SKU))?;

        tx.commit().await?;
        Ok(product)
    }

    /// Replace a product's descriptive fields.
    ///
    /// Quantity and COG are left alone; after creation they move only
    /// through replenishment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Conflict` if the SKU is taken or the
    /// packaging is not one of the user's live records.
    pub async fn update(
        &self,
        user_id: UserId,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        check_packaging(&mut tx, user_id, input.packaging_id).await?;

        let product = sqlx::query_as::<_, Product>(
            r"
            UPDATE backoffice.product
            SET sku = $3,
                name = $4,
                description = $5,
                price = $6,
                packaging_id = $7,
                ebay_item_id = $8,
                updated_at = now()
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            RETURNING id, user_id, sku, name, description, price, quantity, cog, packaging_id,
                      ebay_item_id, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(user_id)
        .bind(&input.sku)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.packaging_id)
        .bind(&input.ebay_item_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| RepositoryError::on_unique_violation(e, DUPLICATE_SKU))?
        .ok_or(RepositoryError::NotFound)?;

        tx.commit().await?;
        Ok(product)
    }

    /// Soft-delete a product. Returns `false` if there was nothing to delete.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn soft_delete(&self, user_id: UserId, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE backoffice.product
            SET deleted_at = now(), updated_at = now()
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            ",
        )
        .bind(id)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Number of live products a user has, for plan limits.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_active(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*)
            FROM backoffice.product
            WHERE user_id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Products at or below `threshold` units, emptiest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn low_stock(
        &self,
        user_id: UserId,
        threshold: i32,
        limit: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(
            r"
            SELECT id, user_id, sku, name, description, price, quantity, cog, packaging_id,
                   ebay_item_id, created_at, updated_at
            FROM backoffice.product
            WHERE user_id = $1 AND deleted_at IS NULL AND quantity <= $2
            ORDER BY quantity, sku
            LIMIT $3
            ",
        )
        .bind(user_id)
        .bind(threshold)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Value of all stock on hand at cost.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stock_value(&self, user_id: UserId) -> Result<Decimal, RepositoryError> {
        let value = sqlx::query_scalar::<_, Decimal>(
            r"
            SELECT COALESCE(SUM(GREATEST(quantity, 0) * cog), 0)
            FROM backoffice.product
            WHERE user_id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(value.round_dp(2))
    }
}

/// A product may only point at packaging its owner still has.
///
/// The row is share-locked so a concurrent soft delete waits for the product write.
async fn check_packaging(
    conn: &mut PgConnection,
    user_id: UserId,
    packaging_id: Option<PackagingId>,
) -> Result<(), RepositoryError> {
    let Some(packaging_id) = packaging_id else {
        return Ok(());
    };

    sqlx::query_scalar::<_, PackagingId>(
        r"
        SELECT id FROM backoffice.packaging
        WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
        FOR SHARE
        ",
    )
    .bind(packaging_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?
    .map(|_| ())
    .ok_or_else(|| RepositoryError::Conflict(format!("packaging {packaging_id} does not exist")))
}

/// Escape `LIKE` wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("MUG-01"), "MUG-01");
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
