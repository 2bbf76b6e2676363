//! Account and plan types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use stockroom_core::{Email, PlanId, UserId};

/// A registered account.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub plan_id: PlanId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A subscription plan.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Plan {
    pub id: PlanId,
    /// Stable identifier used by the API (`free`, `pro`, `business`).
    pub code: String,
    pub name: String,
    pub monthly_price: Decimal,
    /// `None` means unlimited.
    pub max_products: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl Plan {
    /// Whether an account already holding `current` products may add one more.
    #[must_use]
    pub fn allows_another_product(&self, current: i64) -> bool {
        self.max_products
            .is_none_or(|max| current < i64::from(max))
    }

    /// Whether an account holding `count` products fits inside this plan.
    #[must_use]
    pub fn fits_product_count(&self, count: i64) -> bool {
        self.max_products.is_none_or(|max| count <= i64::from(max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(max_products: Option<i32>) -> Plan {
        Plan {
            id: PlanId::new(1),
            code: "free".to_string(),
            name: "Free".to_string(),
            monthly_price: Decimal::ZERO,
            max_products,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_limited_plan_stops_at_max() {
        let free = plan(Some(25));
        assert!(free.allows_another_product(24));
        assert!(!free.allows_another_product(25));
        assert!(free.fits_product_count(25));
        assert!(!free.fits_product_count(26));
    }

    #[test]
    fn test_unlimited_plan_always_allows() {
        let business = plan(None);
        assert!(business.allows_another_product(1_000_000));
        assert!(business.fits_product_count(i64::MAX));
    }
}
