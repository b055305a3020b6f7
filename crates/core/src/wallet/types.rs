//! Wallet domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use topup_shared::types::{TransactionId, UserId};

/// Lifecycle status of a top-up transaction.
///
/// The only legal transition is `Verified -> Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Staged by verify, waiting for confirmation.
    Verified,
    /// Settled; the amount has been credited. Terminal.
    Completed,
}

impl TransactionStatus {
    /// Returns the wire/storage name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "verified" => Ok(Self::Verified),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Unknown transaction status: {s}")),
        }
    }
}

/// A wallet owner and their balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User ID.
    pub id: UserId,
    /// Current balance, two decimal places.
    pub balance: Decimal,
}

/// A staged or settled top-up.
///
/// This is also the shape mirrored into the cache as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction ID, generated at verify time.
    pub id: TransactionId,
    /// Owning user.
    pub user_id: UserId,
    /// Amount to credit, strictly positive.
    pub amount: Decimal,
    /// Opaque payment method tag, e.g. `credit_card`.
    pub payment_method: String,
    /// Lifecycle status.
    pub status: TransactionStatus,
    /// When verify staged the transaction.
    pub created_at: DateTime<Utc>,
    /// Confirmation must happen strictly before this instant.
    pub expires_at: DateTime<Utc>,
}

impl Transaction {
    /// Returns true if the transaction is still `Verified` and `now` is before its expiry.
    #[must_use]
    pub fn is_confirmable(&self, now: DateTime<Utc>) -> bool {
        self.status == TransactionStatus::Verified && now < self.expires_at
    }

    /// Returns true if the validity window has passed.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn pending(now: DateTime<Utc>) -> Transaction {
        Transaction {
            id: TransactionId::new(),
            user_id: UserId::new(),
            amount: dec!(50.00),
            payment_method: "credit_card".to_string(),
            status: TransactionStatus::Verified,
            created_at: now,
            expires_at: now + Duration::minutes(15),
        }
    }

    #[test]
    fn test_confirmable_before_expiry() {
        let now = Utc::now();
        assert!(pending(now).is_confirmable(now + Duration::minutes(14)));
    }

    #[test]
    fn test_not_confirmable_at_expiry_boundary() {
        let now = Utc::now();
        let txn = pending(now);
        assert!(!txn.is_confirmable(txn.expires_at));
        assert!(txn.is_expired(txn.expires_at));
    }

    #[test]
    fn test_completed_is_never_confirmable() {
        let now = Utc::now();
        let mut txn = pending(now);
        txn.status = TransactionStatus::Completed;
        assert!(!txn.is_confirmable(now));
    }

    #[test]
    fn test_json_shape() {
        let now = Utc::now();
        let txn = pending(now);
        let value = serde_json::to_value(&txn).unwrap();
        assert_eq!(value["status"], "verified");
        assert_eq!(value["amount"], "50.00");
        assert_eq!(value["payment_method"], "credit_card");

        let back: Transaction = serde_json::from_value(value).unwrap();
        assert_eq!(back, txn);
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(
            "completed".parse::<TransactionStatus>().unwrap(),
            TransactionStatus::Completed
        );
        assert!("pending".parse::<TransactionStatus>().is_err());
    }
}
