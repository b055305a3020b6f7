//! `SeaORM` active enums.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "wallet_transaction_status"
)]
pub enum WalletTransactionStatus {
    #[sea_orm(string_value = "verified")]
    Verified,
    #[sea_orm(string_value = "completed")]
    Completed,
}
