//! Wallet top-up routes.
//!
//! `POST /wallet/verify` stages a top-up, `POST /wallet/confirm` settles it,
//! and `GET /users/{user_id}/balance` reads the current balance.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use topup_core::wallet::{TransactionStatus, WalletError};
use topup_shared::AppError;
use topup_shared::types::{TransactionId, UserId};
use tracing::error;

use crate::AppState;

/// Creates the wallet routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/wallet/verify", post(verify))
        .route("/wallet/confirm", post(confirm))
        .route("/users/{user_id}/balance", get(get_balance))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for staging a top-up.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    /// User to credit.
    pub user_id: UserId,
    /// Amount as a decimal string, e.g. `"50.00"`.
    pub amount: Decimal,
    /// Payment method tag, e.g. `"credit_card"`.
    pub payment_method: String,
}

/// Response for a staged top-up.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    /// ID to pass to confirm.
    pub transaction_id: TransactionId,
    /// Owning user.
    pub user_id: UserId,
    /// Amount staged.
    pub amount: Decimal,
    /// Payment method tag.
    pub payment_method: String,
    /// Always `verified`.
    pub status: TransactionStatus,
    /// Confirmation deadline (RFC 3339).
    pub expires_at: DateTime<Utc>,
}

/// Request body for settling a top-up.
#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    /// ID returned by verify.
    pub transaction_id: TransactionId,
}

/// Response for a settled top-up.
#[derive(Debug, Serialize)]
pub struct ConfirmResponse {
    /// Settled transaction.
    pub transaction_id: TransactionId,
    /// Owning user.
    pub user_id: UserId,
    /// Amount credited.
    pub amount: Decimal,
    /// Payment method tag.
    pub payment_method: String,
    /// Always `completed`.
    pub status: TransactionStatus,
    /// Balance after the credit.
    pub balance: Decimal,
}

/// Response for a balance lookup.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// User ID.
    pub user_id: UserId,
    /// Current balance.
    pub balance: Decimal,
}

// ============================================================================
// Handlers
// ============================================================================

async fn verify(State(state): State<AppState>, Json(req): Json<VerifyRequest>) -> Response {
    let ctx = state.call_context();

    match state
        .wallet
        .verify(&ctx, req.user_id, req.amount, &req.payment_method)
        .await
    {
        Ok(txn) => (
            StatusCode::OK,
            Json(VerifyResponse {
                transaction_id: txn.id,
                user_id: txn.user_id,
                amount: txn.amount,
                payment_method: txn.payment_method,
                status: txn.status,
                expires_at: txn.expires_at,
            }),
        )
            .into_response(),
        Err(e) => map_wallet_error(e),
    }
}

async fn confirm(State(state): State<AppState>, Json(req): Json<ConfirmRequest>) -> Response {
    let ctx = state.call_context();

    let txn = match state.wallet.confirm(&ctx, req.transaction_id).await {
        Ok(txn) => txn,
        Err(e) => return map_wallet_error(e),
    };

    // The credit is already committed; a failed read here only loses the
    // echo of the new balance.
    let user = match state.wallet.get_user(&ctx, txn.user_id).await {
        Ok(user) => user,
        Err(e) => {
            error!(transaction_id = %txn.id, error = %e, "Failed to fetch balance after confirm");
            return map_wallet_error(e);
        }
    };

    (
        StatusCode::OK,
        Json(ConfirmResponse {
            transaction_id: txn.id,
            user_id: txn.user_id,
            amount: txn.amount,
            payment_method: txn.payment_method,
            status: txn.status,
            balance: user.balance,
        }),
    )
        .into_response()
}

async fn get_balance(State(state): State<AppState>, Path(user_id): Path<UserId>) -> Response {
    let ctx = state.call_context();

    match state.wallet.get_user(&ctx, user_id).await {
        Ok(user) => (
            StatusCode::OK,
            Json(BalanceResponse {
                user_id: user.id,
                balance: user.balance,
            }),
        )
            .into_response(),
        Err(e) => map_wallet_error(e),
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Maps an engine error to a JSON error response.
fn map_wallet_error(e: WalletError) -> Response {
    let err = AppError::from(e);
    if !err.is_client_error() {
        error!(error = %err, "Wallet request failed");
    }

    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "error": err.error_code(),
            "message": err.to_string(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, header::CONTENT_TYPE};
    use http_body_util::BodyExt;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use serde_json::Value;
    use topup_core::wallet::{
        InMemoryRecordStore, MAX_PAYMENT_METHOD_LEN, MokaTransactionCache, WalletRules,
        WalletService,
    };
    use tower::ServiceExt;

    use crate::create_router;

    struct TestApp {
        router: Router,
        store: InMemoryRecordStore,
    }

    fn test_app() -> TestApp {
        let store = InMemoryRecordStore::new();
        let wallet = WalletService::new(
            Arc::new(store.clone()),
            Arc::new(MokaTransactionCache::new()),
            WalletRules::default(),
        );
        let state = AppState::new(Arc::new(wallet), Duration::from_secs(5));
        TestApp {
            router: create_router(state),
            store,
        }
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_verify_confirm_flow() {
        let app = test_app();
        let user = app.store.insert_user(UserId::new(), dec!(100.00)).await;

        let (status, verified) = send(
            &app.router,
            post_json(
                "/api/v1/wallet/verify",
                &json!({"user_id": user.id, "amount": "50.00", "payment_method": "credit_card"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(verified["status"], "verified");
        assert_eq!(verified["amount"], "50.00");
        assert_eq!(verified["payment_method"], "credit_card");
        let expires_at = verified["expires_at"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(expires_at).is_ok());

        let (status, confirmed) = send(
            &app.router,
            post_json(
                "/api/v1/wallet/confirm",
                &json!({"transaction_id": verified["transaction_id"]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(confirmed["status"], "completed");
        assert_eq!(confirmed["transaction_id"], verified["transaction_id"]);
        assert_eq!(confirmed["balance"], "150.00");

        let (status, balance) = send(
            &app.router,
            Request::builder()
                .uri(format!("/api/v1/users/{}/balance", user.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(balance["balance"], "150.00");
    }

    #[rstest]
    #[case("-5.00", "credit_card", StatusCode::BAD_REQUEST, "VALIDATION_ERROR")]
    #[case("0", "credit_card", StatusCode::BAD_REQUEST, "VALIDATION_ERROR")]
    #[case("1.005", "credit_card", StatusCode::BAD_REQUEST, "VALIDATION_ERROR")]
    #[case("10.00", "", StatusCode::BAD_REQUEST, "VALIDATION_ERROR")]
    #[case(
        "100000.01",
        "credit_card",
        StatusCode::UNPROCESSABLE_ENTITY,
        "BUSINESS_RULE_VIOLATION"
    )]
    #[tokio::test]
    async fn test_verify_rejections(
        #[case] amount: &str,
        #[case] method: &str,
        #[case] expected_status: StatusCode,
        #[case] expected_code: &str,
    ) {
        let app = test_app();
        let user = app.store.insert_user(UserId::new(), dec!(100.00)).await;

        let (status, body) = send(
            &app.router,
            post_json(
                "/api/v1/wallet/verify",
                &json!({"user_id": user.id, "amount": amount, "payment_method": method}),
            ),
        )
        .await;

        assert_eq!(status, expected_status);
        assert_eq!(body["error"], expected_code);
        assert_eq!(app.store.transaction_count().await, 0);
    }

    #[tokio::test]
    async fn test_verify_overlong_payment_method_is_400() {
        let app = test_app();
        let user = app.store.insert_user(UserId::new(), dec!(100.00)).await;
        let method = "x".repeat(MAX_PAYMENT_METHOD_LEN + 1);

        let (status, body) = send(
            &app.router,
            post_json(
                "/api/v1/wallet/verify",
                &json!({"user_id": user.id, "amount": "10.00", "payment_method": method}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");
        assert_eq!(app.store.transaction_count().await, 0);
    }

    #[tokio::test]
    async fn test_verify_unknown_user_is_404() {
        let app = test_app();

        let (status, body) = send(
            &app.router,
            post_json(
                "/api/v1/wallet/verify",
                &json!({"user_id": UserId::new(), "amount": "5.00", "payment_method": "credit_card"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_confirm_unknown_transaction_is_404() {
        let app = test_app();

        let (status, _) = send(
            &app.router,
            post_json(
                "/api/v1/wallet/confirm",
                &json!({"transaction_id": TransactionId::new()}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_second_confirm_is_conflict() {
        let app = test_app();
        let user = app.store.insert_user(UserId::new(), dec!(0)).await;

        let (_, verified) = send(
            &app.router,
            post_json(
                "/api/v1/wallet/verify",
                &json!({"user_id": user.id, "amount": "10.00", "payment_method": "bank_transfer"}),
            ),
        )
        .await;
        let confirm_body = json!({"transaction_id": verified["transaction_id"]});

        let (first, _) = send(&app.router, post_json("/api/v1/wallet/confirm", &confirm_body)).await;
        let (second, body) =
            send(&app.router, post_json("/api/v1/wallet/confirm", &confirm_body)).await;

        assert_eq!(first, StatusCode::OK);
        assert_eq!(second, StatusCode::CONFLICT);
        assert_eq!(body["error"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let app = test_app();

        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/wallet/verify")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_shutdown_cancels_requests() {
        let store = InMemoryRecordStore::new();
        let user = store.insert_user(UserId::new(), dec!(0)).await;
        let wallet = WalletService::new(
            Arc::new(store),
            Arc::new(MokaTransactionCache::new()),
            WalletRules::default(),
        );
        let state = AppState::new(Arc::new(wallet), Duration::from_secs(5));
        state.shutdown.cancel();
        let router = create_router(state);

        let (status, body) = send(
            &router,
            Request::builder()
                .uri(format!("/api/v1/users/{}/balance", user.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "SERVICE_UNAVAILABLE");
    }

    #[rstest]
    #[case(WalletError::TransactionExpiredOrCompleted(TransactionId::new()), StatusCode::CONFLICT)]
    #[case(WalletError::UpdateFailed("connection reset".to_string()), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(WalletError::Timeout, StatusCode::GATEWAY_TIMEOUT)]
    #[case(WalletError::Canceled, StatusCode::SERVICE_UNAVAILABLE)]
    fn test_error_status_mapping(#[case] err: WalletError, #[case] expected: StatusCode) {
        assert_eq!(map_wallet_error(err).status(), expected);
    }
}
