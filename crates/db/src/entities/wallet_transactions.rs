//! `SeaORM` Entity for wallet_transactions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::WalletTransactionStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "wallet_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub amount: Decimal,
    pub payment_method: String,
    pub status: WalletTransactionStatus,
    pub created_at: DateTimeWithTimeZone,
    pub expires_at: DateTimeWithTimeZone,
    pub completed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::wallet_users::Entity",
        from = "Column::UserId",
        to = "super::wallet_users::Column::Id"
    )]
    WalletUsers,
}

impl Related<super::wallet_users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WalletUsers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
