//! Utility functions for converting user-facing token amounts

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount must not be negative: {0}")]
    Negative(Decimal),
    #[error("amount {amount} has more than {decimals} decimal places")]
    TooPrecise { amount: Decimal, decimals: u8 },
    #[error("amount {0} does not fit into an on-chain integer")]
    Overflow(Decimal),
}

/// Converts a display amount (e.g. `10.5`) into base units with `decimals`
/// fractional digits.
///
/// Trailing zeros beyond `decimals` are accepted.
/// Any other extra digit is rejected, never rounded.
pub fn to_base_units(amount: Decimal, decimals: u8) -> Result<u64, AmountError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AmountError::Negative(amount));
    }
    let normalized = amount.normalize();
    if normalized.scale() > u32::from(decimals) {
        return Err(AmountError::TooPrecise { amount, decimals });
    }

    Decimal::TEN
        .checked_powu(u64::from(decimals))
        .and_then(|scale| normalized.checked_mul(scale))
        .and_then(|units| units.to_u64())
        .ok_or(AmountError::Overflow(amount))
}

/// Formats base units back into a display string, trimming trailing zeros.
pub fn format_base_units(amount: u64, decimals: u8) -> String {
    match Decimal::try_from_i128_with_scale(i128::from(amount), u32::from(decimals)) {
        Ok(display) => display.normalize().to_string(),
        // scale beyond what Decimal can carry
        Err(_) => amount.to_string(),
    }
}

/// Checks that `value` is hex encoded, optionally of an exact byte length.
pub fn is_hex_of_len(value: &str, bytes: Option<usize>) -> bool {
    match hex::decode(value) {
        Ok(decoded) => !decoded.is_empty() && bytes.map_or(true, |len| decoded.len() == len),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn converts_whole_and_fractional_amounts() {
        assert_eq!(to_base_units(dec!(10), 8).unwrap(), 1_000_000_000);
        assert_eq!(to_base_units(dec!(0.1), 8).unwrap(), 10_000_000);
        assert_eq!(to_base_units(dec!(1.23456789), 8).unwrap(), 123_456_789);
        assert_eq!(to_base_units(dec!(7), 0).unwrap(), 7);
    }

    #[test]
    fn avoids_float_rounding() {
        assert_eq!(to_base_units(dec!(0.3), 8).unwrap(), 30_000_000);
        assert_eq!(to_base_units(dec!(2.675), 3).unwrap(), 2675);
        assert_eq!(to_base_units(dec!(12345678.123456789), 9).unwrap(), 12_345_678_123_456_789);
    }

    #[test]
    fn rejects_bad_amounts() {
        assert!(matches!(to_base_units(dec!(-1), 8), Err(AmountError::Negative(_))));
        assert!(matches!(
            to_base_units(dec!(0.123), 2),
            Err(AmountError::TooPrecise { decimals: 2, .. })
        ));
        assert!(matches!(
            to_base_units(dec!(184467440737.09551616), 8),
            Err(AmountError::Overflow(_))
        ));
    }

    #[test]
    fn accepts_trailing_zero_precision() {
        assert_eq!(to_base_units(dec!(1.5000), 2).unwrap(), 150);
    }

    #[test]
    fn formats_base_units() {
        assert_eq!(format_base_units(1_000_000_000, 8), "10");
        assert_eq!(format_base_units(123_456_789, 8), "1.23456789");
        assert_eq!(format_base_units(5, 2), "0.05");
        assert_eq!(format_base_units(42, 0), "42");
    }

    #[test]
    fn hex_length_check() {
        assert!(is_hex_of_len("0000000000000000", Some(8)));
        assert!(!is_hex_of_len("00", Some(8)));
        assert!(!is_hex_of_len("zz", None));
        assert!(!is_hex_of_len("", None));
    }
}
