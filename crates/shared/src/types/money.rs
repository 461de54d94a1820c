//! Money helpers with cent precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Every amount in the ledger is a `rust_decimal::Decimal` with at most two
//! fractional digits.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of fractional digits kept for money amounts.
pub const CENT_SCALE: u32 = 2;

/// Largest amount a `NUMERIC(19, 2)` column holds: 99,999,999,999,999,999.99.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0x89E7_FFFF, 0x8AC7_2304, 0, false, CENT_SCALE);

/// Returns true when `amount` fits a `NUMERIC(19, 2)` column.
#[must_use]
pub fn is_storable(amount: Decimal) -> bool {
    amount.abs() <= MAX_AMOUNT
}

/// Returns true when `amount` has no digits beyond the cent.
///
/// Trailing zeros do not count: `1.500` is cent-precise, `1.005` is not.
#[must_use]
pub fn is_cent_precise(amount: Decimal) -> bool {
    amount.normalize().scale() <= CENT_SCALE
}

/// Rounds to the cent using banker's rounding (half to even).
#[must_use]
pub fn round_to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CENT_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Formats an amount with exactly two fractional digits.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    let mut rounded = round_to_cents(amount);
    rounded.rescale(CENT_SCALE);
    rounded.to_string()
}

#[cfg(test)]
#[path = "money_tests.rs"]
mod tests;
