//! API Server Module
//!
//! Provides the Axum application builder and server startup logic.
//! Consolidates application state and router configuration.

use std::sync::Arc;

use crate::config::PoolForgeConfig;
use crate::deployment::websocket::{create_ws_state, SharedWebSocketState};
use crate::deployment::{
    DeploymentConfig, DeploymentService, PoolUpdatePublisher, WebhookReconciler,
};
use crate::ledger::DepositLedger;
use crate::orchestrator::{SignerClient, TxOrchestrator};
use crate::storage::{MemoryPoolStore, PoolStore};

/// Combined application state for all API endpoints
pub struct AppState {
    /// Deployment state machine
    pub deployment: Arc<DeploymentService>,
    /// Webhook reconciler
    pub reconciler: Arc<WebhookReconciler>,
    /// Deposit ledger
    pub ledger: DepositLedger,
    /// Pool store, shared with the deployment service
    pub store: Arc<dyn PoolStore>,
    /// WebSocket state for real-time updates
    pub ws_state: SharedWebSocketState,
}

/// Shared application state type
pub type SharedAppState = Arc<AppState>;

impl AppState {
    /// Create application state wired from configuration
    pub fn from_config(config: &PoolForgeConfig) -> SharedAppState {
        let signer = SignerClient::new(&config.signer_url, &config.signer_api_key);
        let orchestrator = TxOrchestrator::new(Arc::new(signer));

        let deployment_config = DeploymentConfig {
            factory_address: config.factory_address.clone(),
            collateral_ratio_wad: config.collateral_ratio_wad,
            fee_level: config.fee_level,
            default_wallet_id: config.default_wallet_id.clone(),
        };

        Self::new(Arc::new(MemoryPoolStore::new()), orchestrator, deployment_config)
    }

    /// Create application state with an explicit store and orchestrator
    pub fn new(
        store: Arc<dyn PoolStore>,
        orchestrator: TxOrchestrator,
        deployment_config: DeploymentConfig,
    ) -> SharedAppState {
        let ws_state = create_ws_state();
        let publisher = PoolUpdatePublisher::new(ws_state.clone());

        let deployment = Arc::new(DeploymentService::new(
            store.clone(),
            orchestrator,
            deployment_config,
        ));
        let reconciler = Arc::new(WebhookReconciler::new(
            store.clone(),
            deployment.clone(),
            publisher,
        ));

        Arc::new(Self {
            deployment,
            reconciler,
            ledger: DepositLedger::new(),
            store,
            ws_state,
        })
    }
}

/// Start the API server
pub async fn start_server(config: &PoolForgeConfig) -> Result<(), std::io::Error> {
    let state = AppState::from_config(config);
    let app = super::routes::create_router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.api_port));
    tracing::info!(
        target: "poolforge::api",
        %addr,
        "API server listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}
