//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes for the two-phase top-up flow
//! - Error-to-response mapping
//! - Request and response types

pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio_util::sync::CancellationToken;
use topup_core::wallet::{CallContext, WalletService};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The top-up engine.
    pub wallet: Arc<WalletService>,
    /// Deadline applied to every request's store and cache calls.
    pub request_timeout: Duration,
    /// Canceled on shutdown; every request context derives from it.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Creates state with a fresh shutdown token.
    #[must_use]
    pub fn new(wallet: Arc<WalletService>, request_timeout: Duration) -> Self {
        Self {
            wallet,
            request_timeout,
            shutdown: CancellationToken::new(),
        }
    }

    /// Builds the context for one request.
    #[must_use]
    pub fn call_context(&self) -> CallContext {
        CallContext::child_of(&self.shutdown, self.request_timeout)
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
