//! Money helpers for whole-yen amounts
//!
//! Every monetary amount on the platform is a whole-yen `Decimal`
//! (zero-decimal currency). Calculations keep intermediate precision and
//! round at each monetary step; the rounding policy is half-up
//! (`MidpointAwayFromZero`) everywhere except coupon discounts, which floor.

use rust_decimal::prelude::*;

/// Yen has no minor unit; every stored amount has scale 0
const DECIMAL_PLACES: u32 = 0;

/// Tolerance for monetary comparisons (¥1, absorbs split rounding)
pub const YEN_TOLERANCE: Decimal = Decimal::ONE;

/// Round to a whole yen, half-up
#[inline]
pub fn round_yen(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Floor to a whole yen
#[inline]
pub fn floor_yen(value: Decimal) -> Decimal {
    value.floor()
}

/// Compare two amounts within the ¥1 tolerance
#[inline]
pub fn yen_eq(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() <= YEN_TOLERANCE
}
