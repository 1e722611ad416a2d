//! Currency rounding used by every monetary quantity in the engine.
//!
//! Amounts are rounded to minor-unit precision (2 dp) at the point they are
//! computed, never once at the end. Ties go to the even neighbour
//! (banker's rounding), so 5.005 becomes 5.00 and 5.015 becomes 5.02.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::Money;

/// Decimal places of the currency minor unit.
pub const MONEY_DP: u32 = 2;

/// Human-readable name of the rounding policy, reported in metadata.
pub const ROUNDING_POLICY: &str = "half_even_2dp";

/// Round an amount to the currency minor unit, ties to even.
///
/// The result always carries exactly two decimal places, so `120` is
/// reported as `120.00`.
pub fn round_money(amount: Decimal) -> Money {
    let mut rounded = amount.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(MONEY_DP);
    rounded
}
