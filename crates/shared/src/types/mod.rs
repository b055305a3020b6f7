//! Common types used across the application.

pub mod id;
pub mod money;

pub use id::*;
pub use money::{CURRENCY_SCALE, has_currency_precision, to_currency_scale};
