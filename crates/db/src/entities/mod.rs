//! `SeaORM` entities for the wallet schema.

pub mod prelude;

pub mod sea_orm_active_enums;
pub mod wallet_transactions;
pub mod wallet_users;
