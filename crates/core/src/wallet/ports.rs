//! Capability interfaces the engine is built against.
//!
//! Implementations are injected into [`WalletService`](super::WalletService)
//! at construction. The durable store is the source of truth; the cache is
//! a lossy optimization whose absence may only change latency.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use topup_shared::types::{TransactionId, UserId};

use super::error::{CacheError, StoreError};
use super::types::{Transaction, TransactionStatus, User};

/// Durable, key-indexed record store for users and transactions.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Point lookup of a user.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Inserts a new transaction record.
    async fn create_transaction(&self, txn: &Transaction) -> Result<(), StoreError>;

    /// Point lookup of a transaction.
    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, StoreError>;

    /// Sets the status to `new` only if it currently equals `expected`.
    ///
    /// Returns `false` when the guard did not match (or the record is missing).
    async fn update_transaction_status(
        &self,
        id: TransactionId,
        expected: TransactionStatus,
        new: TransactionStatus,
    ) -> Result<bool, StoreError>;

    /// Adds `delta` to the user's balance in place.
    ///
    /// Must be a single additive update, never a read-modify-write.
    async fn add_to_user_balance(&self, id: UserId, delta: Decimal) -> Result<(), StoreError>;

    /// Settles a transaction atomically.
    ///
    /// In one unit: moves the record from `Verified` to `Completed` only if it
    /// is still `Verified` and `now` is before its expiry, and credits the
    /// owner's balance with the stored amount. Returns the settled record, or
    /// `None` if the guard rejected it, in which case nothing was written.
    async fn settle_transaction(
        &self,
        id: TransactionId,
        now: DateTime<Utc>,
    ) -> Result<Option<Transaction>, StoreError>;

    /// Deletes `Verified` transactions whose expiry is before `before`.
    ///
    /// `Completed` records are never removed.
    async fn purge_expired_transactions(&self, before: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Key/value cache with per-entry expiration.
#[async_trait]
pub trait TransactionCache: Send + Sync {
    /// Returns the cached value, `None` on a miss.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores a value that expires after `ttl`.
    async fn set_with_ttl(&self, key: &str, value: String, ttl: Duration)
    -> Result<(), CacheError>;

    /// Removes a value. Removing an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Builds the cache key for a transaction.
#[must_use]
pub fn cache_key(id: TransactionId) -> String {
    format!("txn:{id}")
}
