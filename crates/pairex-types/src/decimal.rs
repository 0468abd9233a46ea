//! Fixed-scale decimal arithmetic for ledger math.
//!
//! Every monetary quantity in Pairex is a [`Decimal`] carrying at most
//! [`DECIMAL_SCALE`] fractional digits. Products are truncated toward zero at
//! that scale — never rounded — so a multiplication can only understate a
//! value, and Σ checks stay exact. Floating point is forbidden in ledger
//! arithmetic.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::{ExchangeError, Result};

/// Fixed number of fractional digits carried by all monetary values.
pub const DECIMAL_SCALE: u32 = 18;

/// Truncate a value toward zero at [`DECIMAL_SCALE`] fractional digits.
#[must_use]
pub fn to_scale(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_SCALE, RoundingStrategy::ToZero)
}

/// Multiply two scale-18 values, truncating the product at scale 18.
///
/// # Errors
/// Returns `ArithmeticOverflow` if the product exceeds `Decimal` range.
pub fn mul(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_mul(b)
        .map(to_scale)
        .ok_or(ExchangeError::ArithmeticOverflow)
}
