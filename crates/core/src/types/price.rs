//! Price display helpers using decimal arithmetic.
//!
//! Prices are carried as [`Decimal`] so that cart totals never drift the way
//! binary floating point would (`0.1 + 0.2`).

use rust_decimal::{Decimal, RoundingStrategy};

/// Format a decimal amount as a dollar price string (e.g. `$19.99`).
///
/// Rounds half away from zero to two places.
///
/// ```
/// use rust_decimal::Decimal;
/// use storefront_state_core::format_price;
///
/// assert_eq!(format_price(Decimal::new(1999, 2)), "$19.99");
/// assert_eq!(format_price(Decimal::ZERO), "$0.00");
/// ```
#[must_use]
pub fn format_price(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("${rounded:.2}")
}
