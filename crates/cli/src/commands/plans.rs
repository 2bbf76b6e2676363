//! Subscription plan commands.

use stockroom_admin::db::{PlanRepository, RepositoryError};
use thiserror::Error;

use super::{CommandError, connect};

/// Errors that can occur while managing plans.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Insert the built-in plans, updating names, prices and limits of
/// existing ones.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a write fails.
pub async fn seed() -> Result<(), PlanError> {
    let pool = connect().await?;

    let written = PlanRepository::new(&pool).seed_defaults().await?;

    tracing::info!(plans = written, "Plans seeded");
    Ok(())
}

/// Log every plan with its price and product limit.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn list() -> Result<(), PlanError> {
    let pool = connect().await?;

    for plan in PlanRepository::new(&pool).list_all().await? {
        let limit = plan
            .max_products
            .map_or_else(|| "unlimited".to_string(), |n| n.to_string());
        tracing::info!(
            "{:<10} {:<12} {:>8}/mo  products: {}",
            plan.code,
            plan.name,
            plan.monthly_price,
            limit
        );
    }

    Ok(())
}
