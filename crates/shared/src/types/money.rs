//! Currency-precision helpers for decimal amounts.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts and balances are `rust_decimal::Decimal` values with two
//! decimal places, matching the `NUMERIC(14,2)` columns they are stored in.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places carried by every wallet amount.
pub const CURRENCY_SCALE: u32 = 2;

/// Returns true if `amount` can be stored without rounding.
///
/// Trailing zeros do not count, so `10.500` is accepted while `10.005` is not.
#[must_use]
pub fn has_currency_precision(amount: Decimal) -> bool {
    amount.normalize().scale() <= CURRENCY_SCALE
}

/// Rescales `amount` to exactly two decimal places for display.
#[must_use]
pub fn to_currency_scale(amount: Decimal) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(CURRENCY_SCALE);
    rounded
}

#[cfg(test)]
#[path = "money_tests.rs"]
mod tests;
