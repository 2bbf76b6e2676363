//! Cost-of-goods arithmetic.
//!
//! Unit costs carry 4 decimal places, money totals carry 2. All rounding is
//! half away from zero.

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept for unit costs and COG.
pub const UNIT_COST_SCALE: u32 = 4;

/// Decimal places kept for money totals.
pub const MONEY_SCALE: u32 = 2;

fn round_unit(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(UNIT_COST_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// New unit cost after adding `added_qty` units at `added_unit_cost` to a
/// stock of `on_hand_qty` units valued at `on_hand_cost` each.
///
/// Stock that is empty (or negative after oversells) carries no cost
/// history, so the incoming cost is taken as-is.
///
/// ```
/// use rust_decimal::Decimal;
/// use stockroom_core::cost::weighted_average_cost;
///
/// // 10 @ 2.00 + 30 @ 4.00 = 40 @ 3.50
/// let cog = weighted_average_cost(10, Decimal::new(200, 2), 30, Decimal::new(400, 2));
/// assert_eq!(cog, Decimal::new(35000, 4));
/// ```
#[must_use]
pub fn weighted_average_cost(
    on_hand_qty: i32,
    on_hand_cost: Decimal,
    added_qty: i32,
    added_unit_cost: Decimal,
) -> Decimal {
    if on_hand_qty <= 0 || added_qty <= 0 {
        return if added_qty <= 0 {
            round_unit(on_hand_cost)
        } else {
            round_unit(added_unit_cost)
        };
    }

    let on_hand = Decimal::from(on_hand_qty);
    let added = Decimal::from(added_qty);
    let total_value = on_hand * on_hand_cost + added * added_unit_cost;

    round_unit(total_value / (on_hand + added))
}

/// `quantity * unit_cost`, rounded to cents.
#[must_use]
pub fn line_total(quantity: i32, unit_cost: Decimal) -> Decimal {
    round_money(Decimal::from(quantity) * unit_cost)
}

/// Split `shipping` across lines in proportion to their totals.
///
/// Shares are rounded to cents and the rounding remainder is assigned to the
/// last line, so the shares always sum to exactly `shipping`. Lines that all
/// total zero share the cost equally.
#[must_use]
pub fn allocate_shipping(shipping: Decimal, line_totals: &[Decimal]) -> Vec<Decimal> {
    let Some(last_index) = line_totals.len().checked_sub(1) else {
        return Vec::new();
    };

    let grand_total: Decimal = line_totals.iter().copied().sum();
    let count = Decimal::from(line_totals.len());

    let mut shares = Vec::with_capacity(line_totals.len());
    let mut allocated = Decimal::ZERO;

    for (index, line) in line_totals.iter().enumerate() {
        let share = if index == last_index {
            shipping - allocated
        } else if grand_total.is_zero() {
            round_money(shipping / count)
        } else {
            round_money(shipping * *line / grand_total)
        };
        allocated += share;
        shares.push(share);
    }

    shares
}

/// Unit cost including a line's share of shipping.
#[must_use]
pub fn landed_unit_cost(unit_cost: Decimal, quantity: i32, shipping_share: Decimal) -> Decimal {
    if quantity <= 0 {
        return round_unit(unit_cost);
    }
    round_unit(unit_cost + shipping_share / Decimal::from(quantity))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap_or_default()
    }

    #[test]
    fn test_weighted_average_blends_costs() {
        assert_eq!(weighted_average_cost(10, d("2.00"), 30, d("4.00")), d("3.5"));
        assert_eq!(weighted_average_cost(3, d("1.00"), 1, d("2.00")), d("1.25"));
    }

    #[test]
    fn test_weighted_average_rounds_to_four_places() {
        // (1*1 + 2*2) / 3 = 1.666...
        assert_eq!(weighted_average_cost(1, d("1"), 2, d("2")), d("1.6667"));
    }

    #[test]
    fn test_empty_stock_takes_incoming_cost() {
        assert_eq!(weighted_average_cost(0, d("9.99"), 5, d("1.50")), d("1.5"));
        assert_eq!(weighted_average_cost(-4, d("9.99"), 5, d("1.50")), d("1.5"));
    }

    #[test]
    fn test_zero_added_keeps_existing_cost() {
        assert_eq!(weighted_average_cost(5, d("2.25"), 0, d("100")), d("2.25"));
    }

    #[test]
    fn test_line_total_rounds_to_cents() {
        assert_eq!(line_total(3, d("0.3333")), d("1.00"));
        assert_eq!(line_total(2, d("1.005")), d("2.01"));
    }

    #[test]
    fn test_allocate_shipping_is_proportional_and_exact() {
        let shares = allocate_shipping(d("10.00"), &[d("10"), d("20"), d("70")]);
        assert_eq!(shares, vec![d("1.00"), d("2.00"), d("7.00")]);

        let shares = allocate_shipping(d("10.00"), &[d("1"), d("1"), d("1")]);
        assert_eq!(shares.iter().copied().sum::<Decimal>(), d("10.00"));
        assert_eq!(shares.last().copied(), Some(d("3.34")));
    }

    #[test]
    fn test_allocate_shipping_zero_totals_split_evenly() {
        let shares = allocate_shipping(d("5.00"), &[Decimal::ZERO, Decimal::ZERO]);
        assert_eq!(shares, vec![d("2.50"), d("2.50")]);
        assert!(allocate_shipping(d("5.00"), &[]).is_empty());
    }

    #[test]
    fn test_landed_unit_cost_spreads_share_over_units() {
        assert_eq!(landed_unit_cost(d("2.00"), 4, d("1.00")), d("2.25"));
        assert_eq!(landed_unit_cost(d("2.00"), 0, d("1.00")), d("2"));
    }
}
