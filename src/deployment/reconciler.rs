//! Transaction Webhook Reconciler
//!
//! Entry point for status notifications pushed by the signing service.
//! Each notification carries the transaction id the orchestrator got at
//! submission time; the reconciler resolves it to a (pool, step) pair
//! through the store's transaction index and dispatches to the state
//! machine.
//!
//! Reconciliation never fails outward. Webhook providers retry on
//! non-2xx responses, and a retried notification we already processed
//! must land as a no-op, so every path returns an outcome instead of an
//! error.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::service::{DeployError, DeploymentService, StepOutcome};
use super::websocket::PoolUpdatePublisher;
use crate::storage::PoolStore;
use crate::types::pool::DeployStep;

/// Transaction status as reported by the signing service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TxWebhookStatus {
    /// Accepted into the mempool; not yet final
    Pending,
    /// Included and confirmed on-chain
    Completed,
    /// Reverted or dropped
    Failed,
}

/// Webhook notification body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxWebhookNotification {
    /// Transaction id assigned at submission
    pub transaction_id: String,
    /// On-chain transaction hash, present once mined
    #[serde(default)]
    pub transaction_hash: Option<String>,
    pub status: TxWebhookStatus,
    /// Failure detail, present on FAILED
    #[serde(default)]
    pub error_reason: Option<String>,
}

/// What a notification amounted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// Transaction id matches no tracked pool
    Unmatched,
    /// Matched but changed nothing (duplicate, stale, or interim status)
    NoOp,
    /// Advanced the pool to the step's target status
    Advanced,
    /// Moved the pool to failed
    MarkedFailed,
}

/// Reconciles webhook notifications against the deployment state machine
pub struct WebhookReconciler {
    store: Arc<dyn PoolStore>,
    deployment: Arc<DeploymentService>,
    publisher: PoolUpdatePublisher,
}

impl WebhookReconciler {
    pub fn new(
        store: Arc<dyn PoolStore>,
        deployment: Arc<DeploymentService>,
        publisher: PoolUpdatePublisher,
    ) -> Self {
        Self {
            store,
            deployment,
            publisher,
        }
    }

    /// Process one notification. Always succeeds; the outcome says
    /// whether anything changed.
    pub async fn reconcile(&self, notification: &TxWebhookNotification) -> ReconcileOutcome {
        let (record, step) = match self.store.find_by_tx_id(&notification.transaction_id).await {
            Ok(Some(found)) => found,
            Ok(None) => {
                tracing::warn!(
                    target: "poolforge::reconciler",
                    transaction_id = %notification.transaction_id,
                    "webhook for unknown transaction"
                );
                return ReconcileOutcome::Unmatched;
            }
            Err(e) => {
                tracing::error!(
                    target: "poolforge::reconciler",
                    transaction_id = %notification.transaction_id,
                    error = %e,
                    "tx index lookup failed"
                );
                return ReconcileOutcome::NoOp;
            }
        };

        match notification.status {
            TxWebhookStatus::Pending => {
                // Interim signal; the pool is already in flight
                tracing::debug!(
                    target: "poolforge::reconciler",
                    pool_id = %record.id,
                    step = %step,
                    "transaction pending"
                );
                ReconcileOutcome::NoOp
            }
            TxWebhookStatus::Completed => self.apply_completed(&record.id, step, notification).await,
            TxWebhookStatus::Failed => self.apply_failed(&record.id, notification).await,
        }
    }

    async fn apply_completed(
        &self,
        pool_id: &str,
        step: DeployStep,
        notification: &TxWebhookNotification,
    ) -> ReconcileOutcome {
        let tx_hash = notification
            .transaction_hash
            .as_deref()
            .unwrap_or(&notification.transaction_id);

        match self
            .deployment
            .on_step_completed(pool_id, step, tx_hash)
            .await
        {
            Ok(StepOutcome::Applied(record)) => {
                self.publisher.publish_pool_status(&record).await;
                ReconcileOutcome::Advanced
            }
            Ok(StepOutcome::Superseded) => ReconcileOutcome::NoOp,
            Err(DeployError::NotFound(_)) => ReconcileOutcome::Unmatched,
            Err(e) => {
                tracing::error!(
                    target: "poolforge::reconciler",
                    pool_id = %pool_id,
                    step = %step,
                    error = %e,
                    "confirmation could not be applied"
                );
                ReconcileOutcome::NoOp
            }
        }
    }

    async fn apply_failed(
        &self,
        pool_id: &str,
        notification: &TxWebhookNotification,
    ) -> ReconcileOutcome {
        let reason = notification.error_reason.as_deref().unwrap_or("");

        match self.deployment.on_step_failed(pool_id, reason).await {
            Ok(StepOutcome::Applied(record)) => {
                self.publisher.publish_pool_status(&record).await;
                ReconcileOutcome::MarkedFailed
            }
            Ok(StepOutcome::Superseded) => ReconcileOutcome::NoOp,
            Err(DeployError::NotFound(_)) => ReconcileOutcome::Unmatched,
            Err(e) => {
                tracing::error!(
                    target: "poolforge::reconciler",
                    pool_id = %pool_id,
                    error = %e,
                    "failure notification could not be applied"
                );
                ReconcileOutcome::NoOp
            }
        }
    }
}
