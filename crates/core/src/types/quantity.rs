//! Caller-side quantity validation.
//!
//! The cart store assumes it is handed whole quantities. Raw user input
//! (form fields, CLI arguments) goes through [`parse_quantity`] first:
//! fractions are floored, anything non-numeric is rejected.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Errors that can occur when parsing a quantity.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// The input string is empty.
    #[error("quantity cannot be empty")]
    Empty,
    /// The input is not a number.
    #[error("quantity must be a number, got {0:?}")]
    NotANumber(String),
    /// The input does not fit the supported range.
    #[error("quantity {0} is out of range")]
    OutOfRange(String),
}

/// Parse a quantity from user input, flooring fractional values.
///
/// The result is signed: zero and negative values are valid here because
/// `update_quantity` treats them as removal.
///
/// # Errors
///
/// Returns an error if the input is empty, not a decimal number, or
/// outside the `i64` range after flooring.
///
/// ```
/// use storefront_state_core::parse_quantity;
///
/// assert_eq!(parse_quantity("3"), Ok(3));
/// assert_eq!(parse_quantity("2.9"), Ok(2));
/// assert_eq!(parse_quantity("-1.5"), Ok(-2));
/// assert!(parse_quantity("two").is_err());
/// ```
pub fn parse_quantity(input: &str) -> Result<i64, QuantityError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(QuantityError::Empty);
    }

    let value: Decimal = trimmed
        .parse()
        .map_err(|_| QuantityError::NotANumber(trimmed.to_owned()))?;

    value
        .floor()
        .to_i64()
        .ok_or_else(|| QuantityError::OutOfRange(trimmed.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whole_numbers() {
        assert_eq!(parse_quantity("1"), Ok(1));
        assert_eq!(parse_quantity(" 12 "), Ok(12));
        assert_eq!(parse_quantity("0"), Ok(0));
        assert_eq!(parse_quantity("-5"), Ok(-5));
    }

    #[test]
    fn test_parse_floors_fractions() {
        assert_eq!(parse_quantity("2.5"), Ok(2));
        assert_eq!(parse_quantity("0.99"), Ok(0));
        assert_eq!(parse_quantity("-0.5"), Ok(-1));
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse_quantity(""), Err(QuantityError::Empty));
        assert_eq!(parse_quantity("   "), Err(QuantityError::Empty));
    }

    #[test]
    fn test_parse_not_a_number() {
        assert!(matches!(
            parse_quantity("abc"),
            Err(QuantityError::NotANumber(_))
        ));
        assert!(matches!(
            parse_quantity("NaN"),
            Err(QuantityError::NotANumber(_))
        ));
        assert!(matches!(
            parse_quantity("1.2.3"),
            Err(QuantityError::NotANumber(_))
        ));
    }

    #[test]
    fn test_parse_out_of_range() {
        assert!(matches!(
            parse_quantity("99999999999999999999"),
            Err(QuantityError::OutOfRange(_))
        ));
    }
}
