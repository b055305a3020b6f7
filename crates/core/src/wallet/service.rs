//! Two-phase top-up engine.
//!
//! `verify` validates a request and stages a `Verified` transaction in the
//! durable store, mirroring it into the cache for the validity window.
//! `confirm` resolves the transaction (cache first, store fallback), checks
//! that it is still confirmable and settles it through the store's atomic
//! `settle_transaction`, so a given transaction credits the balance at most
//! once no matter how many confirmations race.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use topup_shared::WalletConfig;
use topup_shared::types::{TransactionId, UserId, to_currency_scale};
use tracing::{debug, error, info, warn};

use super::context::CallContext;
use super::error::{CallError, WalletError};
use super::ports::{Clock, RecordStore, SystemClock, TransactionCache, cache_key};
use super::types::{Transaction, TransactionStatus, User};
use super::validation::{validate_amount, validate_payment_method};

/// Top-up rules applied by [`WalletService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletRules {
    /// Largest amount a single top-up may carry.
    pub max_topup_amount: Decimal,
    /// How long a verified transaction stays confirmable.
    pub validity_window: Duration,
}

impl WalletRules {
    /// Reference rules: 100000.00 ceiling, 15 minute window.
    pub const DEFAULT: Self = Self {
        max_topup_amount: Decimal::from_parts(10_000_000, 0, 0, false, 2),
        validity_window: Duration::from_secs(15 * 60),
    };
}

impl Default for WalletRules {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<&WalletConfig> for WalletRules {
    fn from(config: &WalletConfig) -> Self {
        Self {
            max_topup_amount: config.max_topup_amount,
            validity_window: config.validity_window(),
        }
    }
}

/// Budget for a single cache call unless overridden.
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_millis(100);

/// The transaction engine.
///
/// Cheap to share behind an `Arc`; holds no per-request state.
pub struct WalletService {
    store: Arc<dyn RecordStore>,
    cache: Arc<dyn TransactionCache>,
    clock: Arc<dyn Clock>,
    rules: WalletRules,
    cache_timeout: Duration,
}

impl WalletService {
    /// Creates an engine over the given store and cache using the system clock.
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        cache: Arc<dyn TransactionCache>,
        rules: WalletRules,
    ) -> Self {
        Self::with_clock(store, cache, Arc::new(SystemClock), rules)
    }

    /// Creates an engine with an explicit clock.
    #[must_use]
    pub fn with_clock(
        store: Arc<dyn RecordStore>,
        cache: Arc<dyn TransactionCache>,
        clock: Arc<dyn Clock>,
        rules: WalletRules,
    ) -> Self {
        Self {
            store,
            cache,
            clock,
            rules,
            cache_timeout: DEFAULT_CACHE_TIMEOUT,
        }
    }

    /// Caps each cache call at `timeout`; a slower cache counts as a miss.
    #[must_use]
    pub fn with_cache_timeout(mut self, timeout: Duration) -> Self {
        self.cache_timeout = timeout;
        self
    }

    /// The rules this engine enforces.
    #[must_use]
    pub const fn rules(&self) -> &WalletRules {
        &self.rules
    }

    /// Validates a top-up request and stages it as a `Verified` transaction.
    ///
    /// Checks, in order: the user exists, the amount is positive with at
    /// most two decimal places, the amount is within the ceiling, the
    /// payment method is present. Nothing is written unless all pass.
    ///
    /// # Errors
    ///
    /// Returns a validation error, `WalletError::Store` if the durable
    /// insert fails, or `Canceled`/`Timeout` from the context.
    pub async fn verify(
        &self,
        ctx: &CallContext,
        user_id: UserId,
        amount: Decimal,
        payment_method: &str,
    ) -> Result<Transaction, WalletError> {
        self.require_user(ctx, user_id).await?;

        if let Err(e) = validate_amount(amount, self.rules.max_topup_amount)
            .and_then(|()| validate_payment_method(payment_method))
        {
            warn!(%user_id, %amount, reason = %e, "Top-up rejected");
            return Err(e);
        }
        let amount = to_currency_scale(amount);

        let created_at = self.clock.now();
        let expires_at = TimeDelta::from_std(self.rules.validity_window)
            .ok()
            .and_then(|window| created_at.checked_add_signed(window))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let txn = Transaction {
            id: TransactionId::new(),
            user_id,
            amount,
            payment_method: payment_method.trim().to_string(),
            status: TransactionStatus::Verified,
            created_at,
            expires_at,
        };

        ctx.run(self.store.create_transaction(&txn))
            .await?
            .map_err(|e| {
                error!(%user_id, transaction_id = %txn.id, error = %e, "Failed to create transaction");
                WalletError::Store(e)
            })?;

        self.mirror_to_cache(ctx, &txn).await;

        info!(%user_id, transaction_id = %txn.id, %amount, "Transaction verified");
        Ok(txn)
    }

    /// Settles a verified transaction and credits the owner's balance.
    ///
    /// # Errors
    ///
    /// - `TransactionNotFound` if neither cache nor store knows the ID
    /// - `TransactionExpiredOrCompleted` if it was already settled, its
    ///   window has passed, or a concurrent confirmation won
    /// - `UpdateFailed` if the settlement write fails
    /// - `Canceled`/`Timeout` from the context
    pub async fn confirm(
        &self,
        ctx: &CallContext,
        transaction_id: TransactionId,
    ) -> Result<Transaction, WalletError> {
        let txn = self.resolve(ctx, transaction_id).await?;

        let now = self.clock.now();
        if !txn.is_confirmable(now) {
            if txn.status == TransactionStatus::Completed {
                warn!(%transaction_id, "Transaction already completed");
            } else if txn.is_expired(now) {
                warn!(%transaction_id, expires_at = %txn.expires_at, "Transaction expired");
            }
            return Err(WalletError::TransactionExpiredOrCompleted(transaction_id));
        }

        let settled = ctx
            .run(self.store.settle_transaction(transaction_id, now))
            .await?
            .map_err(|e| {
                error!(%transaction_id, error = %e, "Settlement failed");
                WalletError::UpdateFailed(e.to_string())
            })?;

        let Some(settled) = settled else {
            warn!(%transaction_id, "Settlement rejected by store guard");
            return Err(WalletError::TransactionExpiredOrCompleted(transaction_id));
        };

        self.evict_from_cache(ctx, transaction_id).await;

        info!(
            %transaction_id,
            user_id = %settled.user_id,
            amount = %settled.amount,
            "Transaction confirmed"
        );
        Ok(settled)
    }

    /// Reads a user and their balance.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound`, `WalletError::Store`, or `Canceled`/`Timeout`.
    pub async fn get_user(&self, ctx: &CallContext, user_id: UserId) -> Result<User, WalletError> {
        self.require_user(ctx, user_id).await
    }

    /// Deletes verified transactions that expired more than `retention` ago.
    ///
    /// Completed transactions are never touched. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns `WalletError::Store` or `Canceled`/`Timeout`.
    pub async fn purge_expired(
        &self,
        ctx: &CallContext,
        retention: Duration,
    ) -> Result<u64, WalletError> {
        let now = self.clock.now();
        let cutoff = TimeDelta::from_std(retention)
            .ok()
            .and_then(|retention| now.checked_sub_signed(retention))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let purged = ctx
            .run(self.store.purge_expired_transactions(cutoff))
            .await??;

        if purged > 0 {
            info!(purged, %cutoff, "Purged expired transactions");
        }
        Ok(purged)
    }

    /// Looks the transaction up in the cache, falling back to the store.
    ///
    /// Cache errors, slow reads and undecodable entries count as misses.
    /// Cancellation still aborts.
    async fn resolve(
        &self,
        ctx: &CallContext,
        transaction_id: TransactionId,
    ) -> Result<Transaction, WalletError> {
        let key = cache_key(transaction_id);

        let cached = match self.cache_context(ctx).run(self.cache.get(&key)).await {
            Ok(result) => result,
            Err(CallError::Canceled) => return Err(WalletError::Canceled),
            Err(CallError::Timeout) => {
                warn!(%transaction_id, "Cache read timed out, using store");
                Ok(None)
            }
        };

        match cached {
            Ok(Some(json)) => match serde_json::from_str::<Transaction>(&json) {
                Ok(txn) if txn.id == transaction_id => {
                    debug!(%transaction_id, "Resolved transaction from cache");
                    return Ok(txn);
                }
                Ok(_) => warn!(%transaction_id, "Cached entry has mismatched ID"),
                Err(e) => warn!(%transaction_id, error = %e, "Undecodable cache entry"),
            },
            Ok(None) => {}
            Err(e) => warn!(%transaction_id, error = %e, "Cache read failed, using store"),
        }

        ctx.run(self.store.get_transaction(transaction_id))
            .await??
            .ok_or_else(|| {
                warn!(%transaction_id, "Transaction not found");
                WalletError::TransactionNotFound(transaction_id)
            })
    }

    /// The request context narrowed to the per-call cache budget.
    fn cache_context(&self, ctx: &CallContext) -> CallContext {
        ctx.timeout_after(self.cache_timeout)
    }

    async fn require_user(&self, ctx: &CallContext, user_id: UserId) -> Result<User, WalletError> {
        ctx.run(self.store.get_user(user_id))
            .await??
            .ok_or_else(|| {
                warn!(%user_id, "User not found");
                WalletError::UserNotFound(user_id)
            })
    }

    /// Best-effort cache write; failures only cost a store read later.
    async fn mirror_to_cache(&self, ctx: &CallContext, txn: &Transaction) {
        let json = match serde_json::to_string(txn) {
            Ok(json) => json,
            Err(e) => {
                warn!(transaction_id = %txn.id, error = %e, "Could not encode transaction for cache");
                return;
            }
        };

        let key = cache_key(txn.id);
        match self
            .cache_context(ctx)
            .run(self.cache.set_with_ttl(&key, json, self.rules.validity_window))
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(transaction_id = %txn.id, error = %e, "Cache write failed"),
            Err(e) => warn!(transaction_id = %txn.id, error = %e, "Cache write abandoned"),
        }
    }

    /// Best-effort cache eviction; a stale entry is harmless because the
    /// store's settlement guard rejects it.
    async fn evict_from_cache(&self, ctx: &CallContext, transaction_id: TransactionId) {
        let key = cache_key(transaction_id);
        match self.cache_context(ctx).run(self.cache.delete(&key)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(%transaction_id, error = %e, "Cache delete failed"),
            Err(e) => warn!(%transaction_id, error = %e, "Cache delete abandoned"),
        }
    }
}
