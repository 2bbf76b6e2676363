//! Plan repository.

use rust_decimal::Decimal;
use sqlx::PgPool;

use stockroom_core::PlanId;

use super::RepositoryError;
use crate::models::Plan;

/// Plan a new account starts on.
pub const DEFAULT_PLAN_CODE: &str = "free";

/// Built-in plans: `(code, name, monthly_price_cents, max_products)`.
pub const DEFAULT_PLANS: &[(&str, &str, i64, Option<i32>)] = &[
    ("free", "Free", 0, Some(25)),
    ("pro", "Pro", 1900, Some(1000)),
    ("business", "Business", 4900, None),
];

/// Repository for subscription plans.
pub struct PlanRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PlanRepository<'a> {
    /// Create a new plan repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List every plan, cheapest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Plan>, RepositoryError> {
        let plans = sqlx::query_as::<_, Plan>(
            r"
            SELECT id, code, name, monthly_price, max_products, created_at
            FROM backoffice.plan
            ORDER BY monthly_price, id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(plans)
    }

    /// Get a plan by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: PlanId) -> Result<Option<Plan>, RepositoryError> {
        let plan = sqlx::query_as::<_, Plan>(
            r"
            SELECT id, code, name, monthly_price, max_products, created_at
            FROM backoffice.plan
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(plan)
    }

    /// Get a plan by its code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_code(&self, code: &str) -> Result<Option<Plan>, RepositoryError> {
        let plan = sqlx::query_as::<_, Plan>(
            r"
            SELECT id, code, name, monthly_price, max_products, created_at
            FROM backoffice.plan
            WHERE code = $1
            ",
        )
        .bind(code)
        .fetch_optional(self.pool)
        .await?;

        Ok(plan)
    }

    /// Insert or update the built-in plans. Returns the number of plans written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn seed_defaults(&self) -> Result<usize, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for (code, name, price_cents, max_products) in DEFAULT_PLANS {
            sqlx::query(
                r"
                INSERT INTO backoffice.plan (code, name, monthly_price, max_products)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (code) DO UPDATE
                SET name = EXCLUDED.name,
                    monthly_price = EXCLUDED.monthly_price,
                    max_products = EXCLUDED.max_products
                ",
            )
            .bind(*code)
            .bind(*name)
            .bind(Decimal::new(*price_cents, 2))
            .bind(*max_products)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(DEFAULT_PLANS.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_plan_is_seeded() {
        assert!(DEFAULT_PLANS.iter().any(|(code, ..)| *code == DEFAULT_PLAN_CODE));
    }

    #[test]
    fn test_only_top_plan_is_unlimited() {
        let unlimited: Vec<_> = DEFAULT_PLANS
            .iter()
            .filter(|(.., max)| max.is_none())
            .map(|(code, ..)| *code)
            .collect();
        assert_eq!(unlimited, vec!["business"]);
    }
}
