//! Money formatting
//!
//! Amounts leave the service as fixed-point strings with exactly two
//! decimal places.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places rendered for monetary values
pub const CENT_SCALE: u32 = 2;

/// Round half-to-even to cents.
///
/// A value that rounds to zero is returned as plain zero, so it never
/// renders as `-0.00`.
pub fn round_to_cents(value: Decimal) -> Decimal {
    let rounded = value.round_dp_with_strategy(CENT_SCALE, RoundingStrategy::MidpointNearestEven);
    if rounded.is_zero() {
        Decimal::ZERO
    } else {
        rounded
    }
}

/// Render as a signed fixed-point string, e.g. `-1304.67` or `0.00`
pub fn format_cents(value: Decimal) -> String {
    format!("{:.2}", round_to_cents(value))
}
