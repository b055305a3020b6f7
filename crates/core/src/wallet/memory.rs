//! In-process record store.
//!
//! Backs local runs (`memory://`) and tests. Every operation takes one lock
//! over both tables, so settlement is atomic with respect to other calls.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use topup_shared::types::{TransactionId, UserId, to_currency_scale};

use super::error::StoreError;
use super::ports::RecordStore;
use super::types::{Transaction, TransactionStatus, User};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    transactions: HashMap<TransactionId, Transaction>,
}

/// A thread-safe in-memory store for users and transactions.
///
/// Clones share the same underlying tables.
#[derive(Default, Clone)]
pub struct InMemoryRecordStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryRecordStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a user.
    pub async fn insert_user(&self, id: UserId, balance: Decimal) -> User {
        let user = User {
            id,
            balance: to_currency_scale(balance),
        };
        self.tables.write().await.users.insert(id, user.clone());
        user
    }

    /// Number of stored transactions, in any status.
    pub async fn transaction_count(&self) -> usize {
        self.tables.read().await.transactions.len()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn create_transaction(&self, txn: &Transaction) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&txn.user_id) {
            return Err(StoreError::NotFound(format!("user {}", txn.user_id)));
        }
        if tables.transactions.contains_key(&txn.id) {
            return Err(StoreError::Backend(format!(
                "duplicate transaction id {}",
                txn.id
            )));
        }
        tables.transactions.insert(txn.id, txn.clone());
        Ok(())
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        Ok(self.tables.read().await.transactions.get(&id).cloned())
    }

    async fn update_transaction_status(
        &self,
        id: TransactionId,
        expected: TransactionStatus,
        new: TransactionStatus,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.transactions.get_mut(&id) {
            Some(txn) if txn.status == expected => {
                txn.status = new;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn add_to_user_balance(&self, id: UserId, delta: Decimal) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))?;
        user.balance += delta;
        Ok(())
    }

    async fn settle_transaction(
        &self,
        id: TransactionId,
        now: DateTime<Utc>,
    ) -> Result<Option<Transaction>, StoreError> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;

        let Some(txn) = tables.transactions.get_mut(&id) else {
            return Ok(None);
        };
        if !txn.is_confirmable(now) {
            return Ok(None);
        }
        let Some(user) = tables.users.get_mut(&txn.user_id) else {
            return Err(StoreError::NotFound(format!("user {}", txn.user_id)));
        };

        user.balance += txn.amount;
        txn.status = TransactionStatus::Completed;
        Ok(Some(txn.clone()))
    }

    async fn purge_expired_transactions(&self, before: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        let start = tables.transactions.len();
        tables.transactions.retain(|_, txn| {
            txn.status == TransactionStatus::Completed || txn.expires_at >= before
        });
        Ok((start - tables.transactions.len()) as u64)
    }
}
