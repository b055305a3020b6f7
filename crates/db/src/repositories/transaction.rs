//! Wallet transaction repository for top-up records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::entities::{sea_orm_active_enums::WalletTransactionStatus, wallet_transactions};

/// Input for staging a new top-up transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    /// Transaction ID, generated by the caller.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Amount to credit.
    pub amount: Decimal,
    /// Payment method tag.
    pub payment_method: String,
    /// Initial status.
    pub status: WalletTransactionStatus,
    /// Staging time.
    pub created_at: DateTime<Utc>,
    /// End of the validity window.
    pub expires_at: DateTime<Utc>,
}

/// Transaction repository for top-up records.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts a transaction record.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, including when the owning
    /// user does not exist.
    pub async fn create(
        &self,
        input: CreateTransactionInput,
    ) -> Result<wallet_transactions::Model, DbErr> {
        let completed_at = match input.status {
            WalletTransactionStatus::Completed => Some(input.created_at.into()),
            WalletTransactionStatus::Verified => None,
        };

        let transaction = wallet_transactions::ActiveModel {
            id: Set(input.id),
            user_id: Set(input.user_id),
            amount: Set(input.amount),
            payment_method: Set(input.payment_method),
            status: Set(input.status),
            created_at: Set(input.created_at.into()),
            expires_at: Set(input.expires_at.into()),
            completed_at: Set(completed_at),
        };

        transaction.insert(&self.db).await
    }

    /// Finds a transaction by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<wallet_transactions::Model>, DbErr> {
        wallet_transactions::Entity::find_by_id(id)
            .one(&self.db)
            .await
    }

    /// Moves a transaction from `expected` to `new` status.
    ///
    /// Returns `false` if the record is missing or not in `expected`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn update_status_if(
        &self,
        id: Uuid,
        expected: WalletTransactionStatus,
        new: WalletTransactionStatus,
    ) -> Result<bool, DbErr> {
        let completed_at: Option<DateTime<Utc>> = match new {
            WalletTransactionStatus::Completed => Some(Utc::now()),
            WalletTransactionStatus::Verified => None,
        };

        let result = wallet_transactions::Entity::update_many()
            .col_expr(wallet_transactions::Column::Status, new.as_enum())
            .col_expr(
                wallet_transactions::Column::CompletedAt,
                Expr::value(completed_at),
            )
            .filter(wallet_transactions::Column::Id.eq(id))
            .filter(wallet_transactions::Column::Status.eq(expected))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Marks a verified, unexpired transaction completed on the given connection.
    ///
    /// The status and expiry guard live in the `WHERE` clause, so of any
    /// number of concurrent callers at most one gets the row back.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn complete_if_confirmable<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<wallet_transactions::Model>, DbErr> {
        let mut updated = wallet_transactions::Entity::update_many()
            .col_expr(
                wallet_transactions::Column::Status,
                WalletTransactionStatus::Completed.as_enum(),
            )
            .col_expr(
                wallet_transactions::Column::CompletedAt,
                Expr::value(Some(now)),
            )
            .filter(wallet_transactions::Column::Id.eq(id))
            .filter(wallet_transactions::Column::Status.eq(WalletTransactionStatus::Verified))
            .filter(wallet_transactions::Column::ExpiresAt.gt(now))
            .exec_with_returning(conn)
            .await?;

        Ok(updated.pop())
    }

    /// Deletes verified transactions that expired before `before`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn purge_expired(&self, before: DateTime<Utc>) -> Result<u64, DbErr> {
        let result = wallet_transactions::Entity::delete_many()
            .filter(wallet_transactions::Column::Status.eq(WalletTransactionStatus::Verified))
            .filter(wallet_transactions::Column::ExpiresAt.lt(before))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}
