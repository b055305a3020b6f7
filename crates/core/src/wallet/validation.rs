//! Business rule validation for top-up requests.

use rust_decimal::Decimal;
use topup_shared::types::{CURRENCY_SCALE, has_currency_precision};

use super::error::WalletError;

/// Checks a requested amount against the top-up rules, in order:
/// positive, at most two decimal places, not above `limit`.
///
/// # Errors
///
/// Returns `WalletError::InvalidAmount` or `WalletError::AmountExceedsLimit`.
pub fn validate_amount(amount: Decimal, limit: Decimal) -> Result<(), WalletError> {
    if amount <= Decimal::ZERO {
        return Err(WalletError::InvalidAmount(
            "amount must be greater than zero".to_string(),
        ));
    }
    if !has_currency_precision(amount) {
        return Err(WalletError::InvalidAmount(format!(
            "amount must have at most {CURRENCY_SCALE} decimal places"
        )));
    }
    if amount > limit {
        return Err(WalletError::AmountExceedsLimit { amount, limit });
    }
    Ok(())
}

/// Longest payment method tag the record store can hold.
pub const MAX_PAYMENT_METHOD_LEN: usize = 64;

/// Checks that a payment method tag is present and fits the store column.
///
/// # Errors
///
/// Returns `WalletError::InvalidPaymentMethod` for a blank tag or one longer
/// than [`MAX_PAYMENT_METHOD_LEN`] characters after trimming.
pub fn validate_payment_method(method: &str) -> Result<(), WalletError> {
    let method = method.trim();
    if method.is_empty() || method.chars().count() > MAX_PAYMENT_METHOD_LEN {
        return Err(WalletError::InvalidPaymentMethod);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    const LIMIT: Decimal = dec!(100000.00);

    #[rstest]
    #[case(dec!(0.01))]
    #[case(dec!(50.00))]
    #[case(dec!(100.5))]
    #[case(dec!(100000.00))]
    fn test_accepts(#[case] amount: Decimal) {
        assert!(validate_amount(amount, LIMIT).is_ok());
    }

    #[rstest]
    #[case(dec!(0))]
    #[case(dec!(-5.00))]
    #[case(dec!(0.001))]
    fn test_rejects_invalid(#[case] amount: Decimal) {
        assert!(matches!(
            validate_amount(amount, LIMIT),
            Err(WalletError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_rejects_above_limit() {
        let err = validate_amount(dec!(100000.01), LIMIT).unwrap_err();
        assert!(matches!(
            err,
            WalletError::AmountExceedsLimit { amount, limit }
                if amount == dec!(100000.01) && limit == LIMIT
        ));
    }

    #[test]
    fn test_non_positive_checked_before_limit() {
        // A negative amount is invalid regardless of any ceiling.
        assert!(matches!(
            validate_amount(dec!(-1), dec!(-10)),
            Err(WalletError::InvalidAmount(_))
        ));
    }

    #[rstest]
    #[case(String::new())]
    #[case("   ".to_string())]
    #[case("x".repeat(MAX_PAYMENT_METHOD_LEN + 1))]
    fn test_rejects_method(#[case] method: String) {
        assert!(matches!(
            validate_payment_method(&method),
            Err(WalletError::InvalidPaymentMethod)
        ));
    }

    #[rstest]
    #[case("credit_card".to_string())]
    #[case("x".repeat(MAX_PAYMENT_METHOD_LEN))]
    #[case(format!("  {}  ", "x".repeat(MAX_PAYMENT_METHOD_LEN)))]
    fn test_accepts_method(#[case] method: String) {
        assert!(validate_payment_method(&method).is_ok());
    }
}
