//! Transport-facing error classification.
//!
//! Domain errors convert into [`AppError`], which fixes the HTTP status and
//! the stable `error` code returned to clients.

use thiserror::Error;

/// An error as the API reports it.
#[derive(Debug, Error)]
pub enum AppError {
    /// The referenced user or transaction does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed input: bad amount precision, blank payment method.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Well-formed input that a top-up rule refuses.
    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    /// The transaction is no longer in a state that allows the operation.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The record store failed.
    #[error("Database error: {0}")]
    Database(String),

    /// The request was canceled before it completed.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// A downstream call did not finish within the request deadline.
    #[error("Timed out: {0}")]
    Timeout(String),
}

impl AppError {
    /// HTTP status for the response.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::BusinessRule(_) => 422,
            Self::Database(_) => 500,
            Self::Unavailable(_) => 503,
            Self::Timeout(_) => 504,
        }
    }

    /// Stable machine-readable code for the `error` field.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::BusinessRule(_) => "BUSINESS_RULE_VIOLATION",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Unavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Timeout(_) => "TIMEOUT",
        }
    }

    /// True for 4xx errors, which are not logged as failures.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self.status_code(), 400..=499)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::Validation(String::new()), 400, "VALIDATION_ERROR")]
    #[case(AppError::NotFound(String::new()), 404, "NOT_FOUND")]
    #[case(AppError::Conflict(String::new()), 409, "CONFLICT")]
    #[case(AppError::BusinessRule(String::new()), 422, "BUSINESS_RULE_VIOLATION")]
    #[case(AppError::Database(String::new()), 500, "DATABASE_ERROR")]
    #[case(AppError::Unavailable(String::new()), 503, "SERVICE_UNAVAILABLE")]
    #[case(AppError::Timeout(String::new()), 504, "TIMEOUT")]
    fn test_classification(#[case] err: AppError, #[case] status: u16, #[case] code: &str) {
        assert_eq!(err.status_code(), status);
        assert_eq!(err.error_code(), code);
        assert_eq!(err.is_client_error(), status < 500);
    }

    #[test]
    fn test_display_carries_message() {
        assert_eq!(
            AppError::Conflict("already completed".into()).to_string(),
            "Conflict: already completed"
        );
        assert_eq!(AppError::Timeout("store".into()).to_string(), "Timed out: store");
    }
}
