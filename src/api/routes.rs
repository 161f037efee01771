//! HTTP API Endpoints
//!
//! REST and WebSocket endpoints for pool deployment and deposits:
//! - POST /api/pools                      - Create a pool awaiting approval
//! - GET  /api/pools                      - List all pools
//! - GET  /api/pools/:id                  - Get pool status
//! - POST /api/pools/:id/approve          - Approve and start deployment
//! - POST /api/pools/:id/reject           - Reject a pending pool
//! - POST /api/pools/:id/retry/:step      - Re-submit one deployment step
//! - GET  /api/pools/:id/deposits/stats   - Per-pool deposit statistics
//! - POST /api/webhooks/transactions      - Signer transaction notifications
//! - POST /api/events/deposits            - On-chain deposit events
//! - GET  /api/deposits/pending           - Deposits awaiting fulfilment
//! - GET  /api/deposits/:pool_id/:address - Per-user deposit balances
//! - GET  /api/health                     - Health check
//! - WS   /ws/pools/:id                   - Subscribe to one pool's updates
//! - WS   /ws/pools                       - Subscribe to all pool updates

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};

use super::server::SharedAppState;
use crate::deployment::websocket::{ws_all_pools_handler, ws_pool_handler};
use crate::deployment::{DeployError, TxWebhookNotification};
use crate::ledger::{DepositEvent, LedgerError};
use crate::logging;
use crate::types::pool::{
    ApprovePoolRequest, CreatePoolRequest, DeployStep, PoolStatus, PoolStatusResponse,
    RejectPoolRequest,
};

/// Create the API router
pub fn create_router(state: SharedAppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Pool lifecycle endpoints
        .route("/api/pools", post(handle_create_pool).get(handle_list_pools))
        .route("/api/pools/:id", get(handle_get_pool))
        .route("/api/pools/:id/approve", post(handle_approve_pool))
        .route("/api/pools/:id/reject", post(handle_reject_pool))
        .route("/api/pools/:id/retry/:step", post(handle_retry_step))
        .route("/api/pools/:id/deposits/stats", get(handle_pool_deposit_stats))
        // Event ingestion endpoints
        .route("/api/webhooks/transactions", post(handle_tx_webhook))
        .route("/api/events/deposits", post(handle_deposit_event))
        // Deposit read endpoints
        .route("/api/deposits/pending", get(handle_pending_deposits))
        .route("/api/deposits/:pool_id/:address", get(handle_deposit_status))
        // WebSocket endpoints
        .route("/ws/pools/:id", get(ws_pool_handler_wrapper))
        .route("/ws/pools", get(ws_all_pools_handler_wrapper))
        // Health check
        .route("/api/health", get(handle_health))
        .layer(middleware::from_fn(log_requests))
        .layer(cors)
        .with_state(state)
}

/// Log every request and its response under one correlation id
async fn log_requests(request: Request, next: Next) -> Response {
    let correlation_id = logging::generate_correlation_id();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    logging::log_api_request(&method, &path, &correlation_id);

    let start = std::time::Instant::now();
    let response = next.run(request).await;
    logging::log_api_response(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_millis() as u64,
        &correlation_id,
    );
    response
}

/// Map a deployment error onto an HTTP error response
fn deploy_error_response(err: DeployError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match &err {
        DeployError::NotFound(_) => StatusCode::NOT_FOUND,
        DeployError::Validation(_) => StatusCode::BAD_REQUEST,
        DeployError::InvalidStatus { .. } => StatusCode::CONFLICT,
        DeployError::Submission { .. } => StatusCode::BAD_GATEWAY,
        DeployError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let body = match &err {
        DeployError::Submission { transaction_id, .. } => serde_json::json!({
            "error": err.to_string(),
            "transaction_id": transaction_id
        }),
        _ => serde_json::json!({ "error": err.to_string() }),
    };

    (status, Json(body))
}

// =============================================================================
// Pool Lifecycle Handlers
// =============================================================================

/// POST /api/pools
async fn handle_create_pool(
    State(state): State<SharedAppState>,
    Json(req): Json<CreatePoolRequest>,
) -> impl IntoResponse {
    match state.deployment.create_pool(req.created_by, &req.loans).await {
        Ok(record) => {
            let response = PoolStatusResponse::from(&record);
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => deploy_error_response(e).into_response(),
    }
}

/// Optional status filter for pool listings
#[derive(Debug, serde::Deserialize)]
struct ListPoolsQuery {
    status: Option<String>,
}

/// GET /api/pools[?status=...]
async fn handle_list_pools(
    State(state): State<SharedAppState>,
    Query(query): Query<ListPoolsQuery>,
) -> impl IntoResponse {
    let records = match query.status {
        Some(ref s) => {
            let status: PoolStatus = match s.parse() {
                Ok(status) => status,
                Err(e) => {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(serde_json::json!({ "error": e })),
                    )
                        .into_response()
                }
            };
            state.store.get_by_status(status).await
        }
        None => state.store.get_all().await,
    };

    match records {
        Ok(records) => {
            let pools: Vec<PoolStatusResponse> =
                records.iter().map(PoolStatusResponse::from).collect();
            let counts = state.store.count_by_status().await.unwrap_or_default();

            Json(serde_json::json!({
                "pools": pools,
                "counts": counts
            }))
            .into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

/// GET /api/pools/:id
async fn handle_get_pool(
    State(state): State<SharedAppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.deployment.get_pool(&id).await {
        Ok(record) => (StatusCode::OK, Json(PoolStatusResponse::from(&record))).into_response(),
        Err(e) => deploy_error_response(e).into_response(),
    }
}

/// POST /api/pools/:id/approve
async fn handle_approve_pool(
    State(state): State<SharedAppState>,
    Path(id): Path<String>,
    Json(req): Json<ApprovePoolRequest>,
) -> impl IntoResponse {
    match state
        .deployment
        .approve(&id, &req.approver_id, &req.wallet_id)
        .await
    {
        Ok(record) => {
            logging::log_pool_event("pool_approved", &record.id, &record.status.to_string(), None);
            (StatusCode::OK, Json(PoolStatusResponse::from(&record))).into_response()
        }
        Err(e) => {
            logging::log_pool_event("pool_approval_failed", &id, "", Some(&e.to_string()));
            deploy_error_response(e).into_response()
        }
    }
}

/// POST /api/pools/:id/reject
async fn handle_reject_pool(
    State(state): State<SharedAppState>,
    Path(id): Path<String>,
    Json(req): Json<RejectPoolRequest>,
) -> impl IntoResponse {
    match state
        .deployment
        .reject(&id, &req.approver_id, &req.reason)
        .await
    {
        Ok(record) => {
            logging::log_pool_event("pool_rejected", &record.id, &record.status.to_string(), None);
            (StatusCode::OK, Json(PoolStatusResponse::from(&record))).into_response()
        }
        Err(e) => deploy_error_response(e).into_response(),
    }
}

/// POST /api/pools/:id/retry/:step
async fn handle_retry_step(
    State(state): State<SharedAppState>,
    Path((id, step)): Path<(String, String)>,
    Json(req): Json<ApprovePoolRequest>,
) -> impl IntoResponse {
    let step: DeployStep = match step.parse() {
        Ok(step) => step,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": e })),
            )
                .into_response()
        }
    };

    match state
        .deployment
        .retry(&id, step, &req.approver_id, &req.wallet_id)
        .await
    {
        Ok(record) => (StatusCode::OK, Json(PoolStatusResponse::from(&record))).into_response(),
        Err(e) => deploy_error_response(e).into_response(),
    }
}

// =============================================================================
// Event Ingestion Handlers
// =============================================================================

/// POST /api/webhooks/transactions
///
/// Always 200: webhook providers retry on error statuses, and a
/// notification we cannot use must not be redelivered forever.
async fn handle_tx_webhook(
    State(state): State<SharedAppState>,
    Json(notification): Json<TxWebhookNotification>,
) -> impl IntoResponse {
    let outcome = state.reconciler.reconcile(&notification).await;
    Json(serde_json::json!({ "outcome": outcome }))
}

/// POST /api/events/deposits
async fn handle_deposit_event(
    State(state): State<SharedAppState>,
    Json(event): Json<DepositEvent>,
) -> impl IntoResponse {
    match state.ledger.apply(&event).await {
        Ok(status) => {
            logging::log_deposit_event(
                &format!("deposit_{}", event.kind),
                event.pool_id,
                &event.user_address,
                &event.amount,
                None,
            );
            (StatusCode::OK, Json(status)).into_response()
        }
        Err(e) => {
            logging::log_deposit_event(
                &format!("deposit_{}", event.kind),
                event.pool_id,
                &event.user_address,
                &event.amount,
                Some(&e.to_string()),
            );
            let status = match &e {
                LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
                LedgerError::InsufficientPending { .. }
                | LedgerError::InsufficientClaimable { .. } => StatusCode::CONFLICT,
                LedgerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(serde_json::json!({ "error": e.to_string() }))).into_response()
        }
    }
}

// =============================================================================
// Deposit Read Handlers
// =============================================================================

/// GET /api/deposits/:pool_id/:address
async fn handle_deposit_status(
    State(state): State<SharedAppState>,
    Path((pool_id, address)): Path<(u64, String)>,
) -> impl IntoResponse {
    Json(state.ledger.get_status(pool_id, &address).await)
}

/// GET /api/deposits/pending
async fn handle_pending_deposits(State(state): State<SharedAppState>) -> impl IntoResponse {
    let pending = state.ledger.list_pending().await;
    Json(serde_json::json!({
        "count": pending.len(),
        "deposits": pending
    }))
}

/// GET /api/pools/:id/deposits/stats
///
/// Stats are keyed by the on-chain pool id, so the pool must have
/// reached pool_created.
async fn handle_pool_deposit_stats(
    State(state): State<SharedAppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let record = match state.deployment.get_pool(&id).await {
        Ok(record) => record,
        Err(e) => return deploy_error_response(e).into_response(),
    };

    match record.onchain_pool_id {
        Some(onchain_id) => Json(state.ledger.pool_stats(onchain_id).await).into_response(),
        None => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({
                "error": format!("pool {} has not been created on-chain", id)
            })),
        )
            .into_response(),
    }
}

// =============================================================================
// Health and WebSocket
// =============================================================================

/// GET /api/health
async fn handle_health(State(state): State<SharedAppState>) -> impl IntoResponse {
    let counts = state.store.count_by_status().await.unwrap_or_default();
    Json(serde_json::json!({
        "status": "ok",
        "service": "poolforge-api",
        "version": env!("CARGO_PKG_VERSION"),
        "pools": counts
    }))
}

/// WebSocket handler wrapper for a single pool
async fn ws_pool_handler_wrapper(
    ws: axum::extract::ws::WebSocketUpgrade,
    Path(id): Path<String>,
    State(state): State<SharedAppState>,
) -> impl IntoResponse {
    ws_pool_handler(ws, Path(id), State(state.ws_state.clone())).await
}

/// WebSocket handler wrapper for all pools
async fn ws_all_pools_handler_wrapper(
    ws: axum::extract::ws::WebSocketUpgrade,
    State(state): State<SharedAppState>,
) -> impl IntoResponse {
    ws_all_pools_handler(ws, State(state.ws_state.clone())).await
}
