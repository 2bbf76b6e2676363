//! Inline input checks for request handlers.
//!
//! Each helper returns the first problem found as a [`ValidationError`]
//! naming the offending field, which the admin crate turns into a 400.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Request field name.
    pub field: &'static str,
    /// Human readable reason.
    pub message: String,
}

impl ValidationError {
    /// Build an error for `field`.
    #[must_use]
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Trim `value` and reject it if nothing is left.
///
/// # Errors
///
/// Returns a [`ValidationError`] for blank input or input longer than `max_len`.
pub fn require_non_empty(
    field: &'static str,
    value: &str,
    max_len: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    if trimmed.chars().count() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {max_len} characters"),
        ));
    }
    Ok(trimmed.to_owned())
}

/// Trim an optional string, mapping blank input to `None`.
#[must_use]
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Largest quantity a single request may carry.
pub const MAX_QUANTITY: i32 = 1_000_000;

/// Quantities received, ordered or replenished must be at least one.
///
/// # Errors
///
/// Returns a [`ValidationError`] if `quantity <= 0` or `quantity > MAX_QUANTITY`.
pub fn require_positive_quantity(field: &'static str, quantity: i32) -> Result<(), ValidationError> {
    if quantity <= 0 {
        return Err(ValidationError::new(field, "must be greater than zero"));
    }
    require_max_quantity(field, quantity)
}

/// Stock counts on create/update may be zero but never negative.
///
/// # Errors
///
/// Returns a [`ValidationError`] if `quantity < 0` or `quantity > MAX_QUANTITY`.
pub fn require_non_negative_quantity(
    field: &'static str,
    quantity: i32,
) -> Result<(), ValidationError> {
    if quantity < 0 {
        return Err(ValidationError::new(field, "must not be negative"));
    }
    require_max_quantity(field, quantity)
}

fn require_max_quantity(field: &'static str, quantity: i32) -> Result<(), ValidationError> {
    if quantity > MAX_QUANTITY {
        return Err(ValidationError::new(
            field,
            format!("must be at most {MAX_QUANTITY}"),
        ));
    }
    Ok(())
}

/// Prices, costs, tax and shipping may be zero but never negative.
///
/// # Errors
///
/// Returns a [`ValidationError`] if `value < 0`.
pub fn require_non_negative(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new(field, "must not be negative"));
    }
    Ok(())
}

/// Expense amounts must be strictly positive.
///
/// # Errors
///
/// Returns a [`ValidationError`] if `value <= 0`.
pub fn require_positive_amount(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value <= Decimal::ZERO {
        return Err(ValidationError::new(field, "must be greater than zero"));
    }
    Ok(())
}

/// `later` (when present) must not precede `earlier`.
///
/// # Errors
///
/// Returns a [`ValidationError`] on `later < earlier`.
pub fn require_date_order(
    field: &'static str,
    earlier: NaiveDate,
    later: Option<NaiveDate>,
) -> Result<(), ValidationError> {
    match later {
        Some(later) if later < earlier => Err(ValidationError::new(
            field,
            format!("must be on or after {earlier}"),
        )),
        _ => Ok(()),
    }
}
