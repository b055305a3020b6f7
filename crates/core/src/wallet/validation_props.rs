//! Property-based tests for top-up amount rules.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::error::WalletError;
use super::validation::validate_amount;

/// Ceiling used by the reference configuration.
fn limit() -> Decimal {
    Decimal::new(10_000_000, 2)
}

/// Amounts from 0.01 to the ceiling, in cents.
fn allowed_amount() -> impl Strategy<Value = Decimal> {
    (1i64..=10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Zero and negative amounts down to -1,000,000.00.
fn non_positive_amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(-cents, 2))
}

/// Amounts above the ceiling up to ten times it.
fn over_limit_amount() -> impl Strategy<Value = Decimal> {
    (10_000_001i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every non-positive amount is rejected as invalid.
    #[test]
    fn prop_non_positive_rejected(amount in non_positive_amount()) {
        prop_assert!(matches!(
            validate_amount(amount, limit()),
            Err(WalletError::InvalidAmount(_))
        ));
    }

    /// Every amount above the ceiling is rejected with the limit error.
    #[test]
    fn prop_over_limit_rejected(amount in over_limit_amount()) {
        let rejected = matches!(
            validate_amount(amount, limit()),
            Err(WalletError::AmountExceedsLimit { .. })
        );
        prop_assert!(rejected);
    }

    /// Every positive whole-cent amount up to the ceiling is accepted.
    #[test]
    fn prop_allowed_accepted(amount in allowed_amount()) {
        prop_assert!(validate_amount(amount, limit()).is_ok());
    }

    /// Sub-cent fractions are rejected even when otherwise in range.
    #[test]
    fn prop_sub_cent_rejected(cents in 1i64..10_000_000i64, extra in 1i64..10i64) {
        let amount = Decimal::new(cents * 10 + extra, 3);
        prop_assert!(matches!(
            validate_amount(amount, limit()),
            Err(WalletError::InvalidAmount(_))
        ));
    }
}
