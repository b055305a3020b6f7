//! Top-up API Server
//!
//! Main entry point for the wallet top-up service.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use topup_api::{AppState, create_router};
use topup_core::wallet::{
    CallContext, InMemoryRecordStore, MokaTransactionCache, NoopCache, RecordStore,
    TransactionCache, WalletRules, WalletService,
};
use topup_db::{PgRecordStore, connect};
use topup_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "topup=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load()?;

    // Durable store
    let store: Arc<dyn RecordStore> = if config.database.is_in_memory() {
        warn!("Using in-memory record store; balances are lost on exit");
        Arc::new(InMemoryRecordStore::new())
    } else {
        let db = connect(&config.database).await?;
        info!("Connected to database");
        Arc::new(PgRecordStore::new(db))
    };

    // Pending-transaction cache
    let cache: Arc<dyn TransactionCache> = if config.cache.enabled {
        info!(max_capacity = config.cache.max_capacity, "Transaction cache enabled");
        Arc::new(MokaTransactionCache::with_capacity(config.cache.max_capacity))
    } else {
        info!("Transaction cache disabled");
        Arc::new(NoopCache)
    };

    let rules = WalletRules::from(&config.wallet);
    info!(
        max_topup_amount = %rules.max_topup_amount,
        validity_window_secs = rules.validity_window.as_secs(),
        "Wallet rules loaded"
    );

    let wallet = Arc::new(
        WalletService::new(store, cache, rules).with_cache_timeout(config.cache.call_timeout()),
    );
    let state = AppState::new(wallet.clone(), config.wallet.request_timeout());
    let shutdown = state.shutdown.clone();

    // Reaper for abandoned verified transactions
    let sweeper = config.wallet.sweep_interval().map(|interval| {
        tokio::spawn(run_sweeper(
            wallet,
            interval,
            config.wallet.purge_retention(),
            config.wallet.request_timeout(),
            shutdown.clone(),
        ))
    });

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    if let Some(sweeper) = sweeper {
        if let Err(e) = sweeper.await {
            error!(error = %e, "Sweeper task panicked");
        }
    }

    info!("Server stopped");
    Ok(())
}

/// Periodically deletes verified transactions past their retention.
async fn run_sweeper(
    wallet: Arc<WalletService>,
    interval: Duration,
    retention: Duration,
    call_timeout: Duration,
    shutdown: CancellationToken,
) {
    info!(
        interval_secs = interval.as_secs(),
        retention_secs = retention.as_secs(),
        "Expired transaction sweeper started"
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let ctx = CallContext::child_of(&shutdown, call_timeout);
                if let Err(e) = wallet.purge_expired(&ctx, retention).await {
                    warn!(error = %e, "Expired transaction sweep failed");
                }
            }
        }
    }

    info!("Expired transaction sweeper stopped");
}

/// Resolves on Ctrl+C, canceling every in-flight request context.
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
    shutdown.cancel();
}
