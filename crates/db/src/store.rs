//! Postgres-backed [`RecordStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};
use topup_core::wallet::{RecordStore, StoreError, Transaction, TransactionStatus, User};
use topup_shared::types::{TransactionId, UserId};
use tracing::{debug, warn};

use crate::entities::{sea_orm_active_enums::WalletTransactionStatus, wallet_transactions, wallet_users};
use crate::repositories::{CreateTransactionInput, TransactionRepository, UserRepository};

/// Record store over the `wallet_users` and `wallet_transactions` tables.
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    db: DatabaseConnection,
    users: UserRepository,
    transactions: TransactionRepository,
}

impl PgRecordStore {
    /// Creates a store over an open connection pool.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            users: UserRepository::new(db.clone()),
            transactions: TransactionRepository::new(db.clone()),
            db,
        }
    }
}

fn backend(err: DbErr) -> StoreError {
    StoreError::Backend(err.to_string())
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let user = self.users.find_by_id(id.into_inner()).await.map_err(backend)?;
        Ok(user.map(User::from))
    }

    async fn create_transaction(&self, txn: &Transaction) -> Result<(), StoreError> {
        self.transactions
            .create(CreateTransactionInput {
                id: txn.id.into_inner(),
                user_id: txn.user_id.into_inner(),
                amount: txn.amount,
                payment_method: txn.payment_method.clone(),
                status: txn.status.into(),
                created_at: txn.created_at,
                expires_at: txn.expires_at,
            })
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        let txn = self
            .transactions
            .find_by_id(id.into_inner())
            .await
            .map_err(backend)?;
        Ok(txn.map(Transaction::from))
    }

    async fn update_transaction_status(
        &self,
        id: TransactionId,
        expected: TransactionStatus,
        new: TransactionStatus,
    ) -> Result<bool, StoreError> {
        self.transactions
            .update_status_if(id.into_inner(), expected.into(), new.into())
            .await
            .map_err(backend)
    }

    async fn add_to_user_balance(&self, id: UserId, delta: Decimal) -> Result<(), StoreError> {
        let updated = self
            .users
            .add_to_balance(id.into_inner(), delta)
            .await
            .map_err(backend)?;
        if updated {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("user {id}")))
        }
    }

    async fn settle_transaction(
        &self,
        id: TransactionId,
        now: DateTime<Utc>,
    ) -> Result<Option<Transaction>, StoreError> {
        // Dropping `txn` without commit rolls back, including when the
        // caller's deadline drops this future mid-flight.
        let txn = self.db.begin().await.map_err(backend)?;

        let Some(settled) = TransactionRepository::complete_if_confirmable(&txn, id.into_inner(), now)
            .await
            .map_err(backend)?
        else {
            txn.rollback().await.map_err(backend)?;
            debug!(transaction_id = %id, "Settlement guard did not match");
            return Ok(None);
        };

        let credited = UserRepository::credit(&txn, settled.user_id, settled.amount, now)
            .await
            .map_err(backend)?;
        if !credited {
            txn.rollback().await.map_err(backend)?;
            warn!(transaction_id = %id, user_id = %settled.user_id, "Owner missing during settlement");
            return Err(StoreError::NotFound(format!("user {}", settled.user_id)));
        }

        txn.commit().await.map_err(backend)?;
        Ok(Some(Transaction::from(settled)))
    }

    async fn purge_expired_transactions(&self, before: DateTime<Utc>) -> Result<u64, StoreError> {
        self.transactions
            .purge_expired(before)
            .await
            .map_err(backend)
    }
}

impl From<TransactionStatus> for WalletTransactionStatus {
    fn from(status: TransactionStatus) -> Self {
        match status {
            TransactionStatus::Verified => Self::Verified,
            TransactionStatus::Completed => Self::Completed,
        }
    }
}

impl From<WalletTransactionStatus> for TransactionStatus {
    fn from(status: WalletTransactionStatus) -> Self {
        match status {
            WalletTransactionStatus::Verified => Self::Verified,
            WalletTransactionStatus::Completed => Self::Completed,
        }
    }
}

impl From<wallet_users::Model> for User {
    fn from(model: wallet_users::Model) -> Self {
        Self {
            id: UserId::from_uuid(model.id),
            balance: model.balance,
        }
    }
}

impl From<wallet_transactions::Model> for Transaction {
    fn from(model: wallet_transactions::Model) -> Self {
        Self {
            id: TransactionId::from_uuid(model.id),
            user_id: UserId::from_uuid(model.user_id),
            amount: model.amount,
            payment_method: model.payment_method,
            status: model.status.into(),
            created_at: model.created_at.with_timezone(&Utc),
            expires_at: model.expires_at.with_timezone(&Utc),
        }
    }
}
