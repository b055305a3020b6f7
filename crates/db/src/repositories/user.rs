//! Wallet user repository for database operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set,
};
use uuid::Uuid;

use crate::entities::wallet_users;

/// Wallet user repository.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<wallet_users::Model>, DbErr> {
        wallet_users::Entity::find_by_id(id).one(&self.db).await
    }

    /// Creates a user with an opening balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, id: Uuid, balance: Decimal) -> Result<wallet_users::Model, DbErr> {
        let now = Utc::now().into();
        let user = wallet_users::ActiveModel {
            id: Set(id),
            balance: Set(balance),
            created_at: Set(now),
            updated_at: Set(now),
        };

        user.insert(&self.db).await
    }

    /// Adds `delta` to a user's balance.
    ///
    /// Returns `false` if the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn add_to_balance(&self, id: Uuid, delta: Decimal) -> Result<bool, DbErr> {
        Self::credit(&self.db, id, delta, Utc::now()).await
    }

    /// Adds `delta` to a user's balance on the given connection.
    ///
    /// Issues a single `balance = balance + delta` update so concurrent
    /// credits never overwrite each other. Accepts a `DatabaseTransaction`
    /// so it can join a larger unit of work.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn credit<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
        delta: Decimal,
        now: DateTime<Utc>,
    ) -> Result<bool, DbErr> {
        let result = wallet_users::Entity::update_many()
            .col_expr(
                wallet_users::Column::Balance,
                Expr::col(wallet_users::Column::Balance).add(delta),
            )
            .col_expr(wallet_users::Column::UpdatedAt, Expr::value(now))
            .filter(wallet_users::Column::Id.eq(id))
            .exec(conn)
            .await?;

        Ok(result.rows_affected == 1)
    }
}
