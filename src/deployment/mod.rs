//! Pool Deployment Module
//!
//! Drives approved lending pools through their three-step on-chain
//! deployment and keeps observers informed:
//!
//! - **service**: the status state machine and step submissions
//! - **reconciler**: webhook entry point resolving tx ids to steps
//! - **websocket**: broadcast of status changes to subscribers
//!
//! All forward progress past an in-flight status comes from the
//! reconciler; the service itself never polls the chain.

pub mod reconciler;
pub mod service;
pub mod websocket;

// Re-exports
pub use reconciler::{ReconcileOutcome, TxWebhookNotification, TxWebhookStatus, WebhookReconciler};
pub use service::{DeployError, DeploymentConfig, DeploymentService, StepOutcome};
pub use websocket::{
    create_ws_state, PoolUpdatePublisher, SharedWebSocketState, WebSocketState,
};
