//! Application configuration management.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Pending-transaction cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Top-up rules.
    #[serde(default)]
    pub wallet: WalletConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL. `memory://` selects the in-process store.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

impl DatabaseConfig {
    /// Returns true if the URL selects the in-memory record store.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.url.starts_with("memory://")
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Pending-transaction cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Whether verified transactions are mirrored into the cache.
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// Maximum number of cached transactions.
    #[serde(default = "default_cache_capacity")]
    pub max_capacity: u64,
    /// Budget for each cache call, in milliseconds. A slower call counts as a miss.
    #[serde(default = "default_cache_call_timeout_ms")]
    pub call_timeout_ms: u64,
}

impl CacheConfig {
    /// Per-call cache budget as a `Duration`.
    #[must_use]
    pub const fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            max_capacity: default_cache_capacity(),
            call_timeout_ms: default_cache_call_timeout_ms(),
        }
    }
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_capacity() -> u64 {
    10_000
}

fn default_cache_call_timeout_ms() -> u64 {
    100
}

/// Top-up rules and timing.
#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    /// Largest amount a single top-up may carry.
    #[serde(default = "default_max_topup_amount")]
    pub max_topup_amount: Decimal,
    /// How long a verified transaction stays confirmable, in seconds.
    #[serde(default = "default_validity_window_secs")]
    pub validity_window_secs: u64,
    /// Deadline applied to each request's store and cache calls, in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// How long expired, unconfirmed transactions are kept before purging, in seconds.
    #[serde(default = "default_purge_retention_secs")]
    pub purge_retention_secs: u64,
    /// Interval between expiry sweeps, in seconds. Zero disables the sweeper.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            max_topup_amount: default_max_topup_amount(),
            validity_window_secs: default_validity_window_secs(),
            request_timeout_ms: default_request_timeout_ms(),
            purge_retention_secs: default_purge_retention_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl WalletConfig {
    /// Validity window as a `Duration`.
    #[must_use]
    pub const fn validity_window(&self) -> Duration {
        Duration::from_secs(self.validity_window_secs)
    }

    /// Per-request deadline as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Retention of expired transactions as a `Duration`.
    #[must_use]
    pub const fn purge_retention(&self) -> Duration {
        Duration::from_secs(self.purge_retention_secs)
    }

    /// Sweep interval, or `None` when the sweeper is disabled.
    #[must_use]
    pub const fn sweep_interval(&self) -> Option<Duration> {
        if self.sweep_interval_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.sweep_interval_secs))
        }
    }
}

fn default_max_topup_amount() -> Decimal {
    Decimal::new(10_000_000, 2) // 100000.00
}

fn default_validity_window_secs() -> u64 {
    900 // 15 minutes
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

fn default_purge_retention_secs() -> u64 {
    86_400 // 1 day
}

fn default_sweep_interval_secs() -> u64 {
    3_600
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TOPUP").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
