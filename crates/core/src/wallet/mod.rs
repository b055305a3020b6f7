//! Wallet top-up engine.
//!
//! - Domain records (users, transactions)
//! - Capability ports (record store, cache, clock)
//! - Per-call cancellation and deadlines
//! - In-memory store and moka-backed cache
//! - The two-phase verify/confirm service

pub mod cache;
pub mod context;
pub mod error;
pub mod memory;
pub mod ports;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod validation_props;

pub use cache::{MokaTransactionCache, NoopCache};
pub use context::CallContext;
pub use error::{CacheError, CallError, StoreError, WalletError};
pub use memory::InMemoryRecordStore;
pub use ports::{Clock, RecordStore, SystemClock, TransactionCache, cache_key};
pub use service::{DEFAULT_CACHE_TIMEOUT, WalletRules, WalletService};
pub use types::{Transaction, TransactionStatus, User};
pub use validation::{MAX_PAYMENT_METHOD_LEN, validate_amount, validate_payment_method};
