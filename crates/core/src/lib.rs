//! Core business logic for the top-up service.
//!
//! This crate contains the transaction engine with ZERO web or database
//! dependencies. Persistence and caching are reached through the traits in
//! [`wallet::ports`]; the `db` crate supplies the Postgres implementation.
//!
//! # Modules
//!
//! - `wallet` - Two-phase top-up (verify, confirm) and balance lookup

pub mod wallet;
