//! Tolerance-based comparison of monetary amounts.
//!
//! Every amount in tally is a [`Decimal`]. Sums of step amounts are exact, but
//! values derived by division (a depreciation step, an amortization step) carry
//! a long tail of digits, so "is this zero" questions are answered against a
//! fixed absolute [`TOLERANCE`] instead of exact equality.

use rust_decimal::Decimal;

/// Absolute tolerance used for every monetary zero / equality test: `0.000001`.
pub const TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 6);

/// Check if an amount is zero within [`TOLERANCE`].
///
/// ```
/// use tally_core::amount::is_zero;
/// use rust_decimal_macros::dec;
///
/// assert!(is_zero(dec!(0.0000004)));
/// assert!(!is_zero(dec!(0.01)));
/// ```
#[must_use]
pub fn is_zero(value: Decimal) -> bool {
    value.abs() <= TOLERANCE
}

/// Check if an amount is strictly positive beyond [`TOLERANCE`].
#[must_use]
pub fn is_positive(value: Decimal) -> bool {
    value > TOLERANCE
}

/// Check if an amount is strictly negative beyond [`TOLERANCE`].
#[must_use]
pub fn is_negative(value: Decimal) -> bool {
    value < -TOLERANCE
}

/// Check if two amounts are equal within [`TOLERANCE`].
#[must_use]
pub fn is_near(a: Decimal, b: Decimal) -> bool {
    is_zero(a - b)
}

/// Sign of an amount under [`TOLERANCE`]: `1`, `-1`, or `0` for near-zero values.
#[must_use]
pub fn sign(value: Decimal) -> i8 {
    if is_positive(value) {
        1
    } else if is_negative(value) {
        -1
    } else {
        0
    }
}
