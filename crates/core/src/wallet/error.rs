//! Wallet error types.

use rust_decimal::Decimal;
use thiserror::Error;
use topup_shared::AppError;
use topup_shared::types::{TransactionId, UserId};

/// Failure reported by a durable record store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The record an update targeted does not exist.
    #[error("record not found: {0}")]
    NotFound(String),

    /// The backend rejected or failed the operation.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Failure reported by the transaction cache.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// The cache backend could not be reached.
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    /// A cached value could not be encoded or decoded.
    #[error("cache serialization error: {0}")]
    Serialization(String),
}

/// A store or cache call that did not run to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CallError {
    /// The caller canceled the request.
    #[error("call canceled")]
    Canceled,

    /// The request deadline passed.
    #[error("call timed out")]
    Timeout,
}

/// Errors returned by the top-up engine.
#[derive(Debug, Error)]
pub enum WalletError {
    /// The user does not exist.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// The amount is zero, negative, or finer than two decimal places.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// The amount is above the configured top-up ceiling.
    #[error("amount {amount} exceeds maximum allowed {limit}")]
    AmountExceedsLimit {
        /// Requested amount.
        amount: Decimal,
        /// Configured ceiling.
        limit: Decimal,
    },

    /// The payment method tag is empty or too long.
    #[error("payment method is required and must be at most 64 characters")]
    InvalidPaymentMethod,

    /// No transaction with this ID exists.
    #[error("transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// The transaction was already settled or its validity window has passed.
    #[error("transaction {0} expired or already completed")]
    TransactionExpiredOrCompleted(TransactionId),

    /// A settlement write failed.
    #[error("update failed: {0}")]
    UpdateFailed(String),

    /// A non-settlement persistence call failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The request was canceled.
    #[error("request canceled")]
    Canceled,

    /// The request deadline passed.
    #[error("request timed out")]
    Timeout,
}

impl From<CallError> for WalletError {
    fn from(err: CallError) -> Self {
        match err {
            CallError::Canceled => Self::Canceled,
            CallError::Timeout => Self::Timeout,
        }
    }
}

impl WalletError {
    /// Returns true if the error was caused by the client's input.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound(_)
                | Self::InvalidAmount(_)
                | Self::AmountExceedsLimit { .. }
                | Self::InvalidPaymentMethod
                | Self::TransactionNotFound(_)
                | Self::TransactionExpiredOrCompleted(_)
        )
    }
}

impl From<WalletError> for AppError {
    fn from(err: WalletError) -> Self {
        let message = err.to_string();
        match err {
            WalletError::UserNotFound(_) | WalletError::TransactionNotFound(_) => {
                Self::NotFound(message)
            }
            WalletError::InvalidAmount(_) | WalletError::InvalidPaymentMethod => {
                Self::Validation(message)
            }
            WalletError::AmountExceedsLimit { .. } => Self::BusinessRule(message),
            WalletError::TransactionExpiredOrCompleted(_) => Self::Conflict(message),
            WalletError::UpdateFailed(_) | WalletError::Store(_) => Self::Database(message),
            WalletError::Canceled => Self::Unavailable(message),
            WalletError::Timeout => Self::Timeout(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_client_errors_map_to_4xx() {
        let cases = [
            WalletError::UserNotFound(UserId::new()),
            WalletError::InvalidAmount("must be greater than zero".into()),
            WalletError::AmountExceedsLimit {
                amount: dec!(100000.01),
                limit: dec!(100000.00),
            },
            WalletError::InvalidPaymentMethod,
            WalletError::TransactionNotFound(TransactionId::new()),
            WalletError::TransactionExpiredOrCompleted(TransactionId::new()),
        ];

        for err in cases {
            assert!(err.is_client_error());
            let app: AppError = err.into();
            assert!(app.is_client_error(), "{app} should be 4xx");
        }
    }

    #[test]
    fn test_server_errors_map_to_5xx() {
        let cases = [
            WalletError::UpdateFailed("connection reset".into()),
            WalletError::Store(StoreError::Backend("connection reset".into())),
            WalletError::Canceled,
            WalletError::Timeout,
        ];

        for err in cases {
            assert!(!err.is_client_error());
            let app: AppError = err.into();
            assert!(app.status_code() >= 500);
        }
    }

    #[test]
    fn test_specific_status_codes() {
        let expired: AppError =
            WalletError::TransactionExpiredOrCompleted(TransactionId::new()).into();
        assert_eq!(expired.status_code(), 409);

        let limit: AppError = WalletError::AmountExceedsLimit {
            amount: dec!(2),
            limit: dec!(1),
        }
        .into();
        assert_eq!(limit.status_code(), 422);

        let timeout: AppError = WalletError::Timeout.into();
        assert_eq!(timeout.status_code(), 504);
    }

    #[test]
    fn test_call_error_conversion() {
        assert!(matches!(
            WalletError::from(CallError::Canceled),
            WalletError::Canceled
        ));
        assert!(matches!(
            WalletError::from(CallError::Timeout),
            WalletError::Timeout
        ));
    }
}
