//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod transaction;
pub mod user;

pub use transaction::{CreateTransactionInput, TransactionRepository};
pub use user::UserRepository;
