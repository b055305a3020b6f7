//! Shared types, errors, and configuration for the top-up service.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for users and wallet transactions
//! - Currency-precision helpers for decimal amounts
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, CacheConfig, DatabaseConfig, ServerConfig, WalletConfig};
pub use error::AppError;
