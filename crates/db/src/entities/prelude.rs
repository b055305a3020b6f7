//! `SeaORM` entity prelude.

pub use super::wallet_transactions::Entity as WalletTransactions;
pub use super::wallet_users::Entity as WalletUsers;
