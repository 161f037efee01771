//! Deployment State Machine
//!
//! Owns a pool's lifecycle status and drives it through the three
//! on-chain steps:
//!
//! pending → approved → deploying_pool → pool_created → configuring_pool
//! → pool_configured → deploying_loans → deployed
//!
//! Each step is submit-then-wait: the service never polls, and all
//! forward progress past an in-flight status requires an external
//! confirmation delivered through the webhook reconciler.
//!
//! Every status advance is a compare-and-set against the expected prior
//! status, so duplicate confirmations can neither double-advance a pool
//! nor double-issue the next step's transaction. Submission calls run
//! without any store lock held.

use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::orchestrator::{AbiParam, FeeLevel, SubmitOutcome, TxOrchestrator};
use crate::storage::{PoolStore, StorageError};
use crate::types::pool::{DeployStep, LoanAggregates, LoanInput, PoolRecord, PoolStatus};

/// Deployment service errors
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("Pool not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Cannot {action} while pool is {actual}")]
    InvalidStatus {
        action: &'static str,
        actual: PoolStatus,
    },

    #[error("Transaction submission failed: {reason}")]
    Submission {
        reason: String,
        /// Correlation id of the failed attempt
        transaction_id: String,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DeployError {
    /// Map a storage error, turning a CAS conflict into the typed
    /// business-rule failure for the attempted action.
    fn from_storage(err: StorageError, action: &'static str) -> Self {
        match err {
            StorageError::NotFound(id) => Self::NotFound(id),
            StorageError::StatusConflict { actual, .. } => Self::InvalidStatus { action, actual },
            other => Self::Storage(other.to_string()),
        }
    }
}

/// Result of dispatching a confirmation to the state machine
#[derive(Debug)]
pub enum StepOutcome {
    /// The confirmation advanced the pool; carries the updated record
    Applied(PoolRecord),
    /// The pool had already advanced past this step; nothing changed
    Superseded,
}

/// Deployment configuration
#[derive(Debug, Clone)]
pub struct DeploymentConfig {
    /// Pool factory contract address
    pub factory_address: String,
    /// Collateralization ratio, 18-decimal fixed point
    pub collateral_ratio_wad: u128,
    /// Fee level for all deployment submissions
    pub fee_level: FeeLevel,
    /// Fallback wallet when a pool has none recorded
    pub default_wallet_id: String,
}

/// Deployment state machine over an injected store and orchestrator
pub struct DeploymentService {
    store: Arc<dyn PoolStore>,
    orchestrator: TxOrchestrator,
    config: DeploymentConfig,
}

impl DeploymentService {
    pub fn new(
        store: Arc<dyn PoolStore>,
        orchestrator: TxOrchestrator,
        config: DeploymentConfig,
    ) -> Self {
        Self {
            store,
            orchestrator,
            config,
        }
    }

    /// Create a new pool awaiting approval. Loan aggregates are
    /// computed here exactly once and frozen on the record.
    pub async fn create_pool(
        &self,
        created_by: String,
        loans: &[LoanInput],
    ) -> Result<PoolRecord, DeployError> {
        if created_by.trim().is_empty() {
            return Err(DeployError::Validation("empty creator id".to_string()));
        }
        let aggregates = LoanAggregates::from_loans(loans).ok_or_else(|| {
            DeployError::Validation(
                "loan batch is empty or contains invalid principals/rates".to_string(),
            )
        })?;

        let record = PoolRecord::new(created_by, aggregates);
        self.store
            .insert(&record)
            .await
            .map_err(|e| DeployError::from_storage(e, "create"))?;

        tracing::info!(
            target: "poolforge::deployment",
            pool_id = %record.id,
            loan_count = record.aggregates.loan_count,
            "pool created"
        );
        Ok(record)
    }

    /// Approve a pending pool and submit the pool-creation transaction.
    ///
    /// On submission failure the provisional approval is rolled back and
    /// the pool stays pending; nothing was committed on-chain.
    pub async fn approve(
        &self,
        pool_id: &str,
        approver_id: &str,
        wallet_id: &str,
    ) -> Result<PoolRecord, DeployError> {
        if approver_id.trim().is_empty() || wallet_id.trim().is_empty() {
            return Err(DeployError::Validation(
                "approver id and wallet id are required".to_string(),
            ));
        }

        // Claim the pool so a concurrent approve loses the race here
        let approver = approver_id.to_string();
        let wallet = wallet_id.to_string();
        let record = self
            .store
            .update_if_status(
                pool_id,
                &[PoolStatus::Pending],
                Box::new(move |r| r.mark_approved(approver, wallet)),
            )
            .await
            .map_err(|e| DeployError::from_storage(e, "approve"))?;

        // Network call with no lock held
        let outcome = self.submit_step(&record, DeployStep::CreatePool).await;

        if outcome.is_failed() {
            // Roll back so the pool can be approved again later
            let _ = self
                .store
                .update_if_status(
                    pool_id,
                    &[PoolStatus::Approved],
                    Box::new(|r| r.revert_approval()),
                )
                .await;
            return Err(DeployError::Submission {
                reason: outcome.error.unwrap_or_else(|| "unknown".to_string()),
                transaction_id: outcome.transaction_id,
            });
        }

        self.record_submission(pool_id, DeployStep::CreatePool, PoolStatus::Approved, outcome)
            .await
    }

    /// Reject a pending pool. Terminal; requires a non-empty reason.
    pub async fn reject(
        &self,
        pool_id: &str,
        approver_id: &str,
        reason: &str,
    ) -> Result<PoolRecord, DeployError> {
        if reason.trim().is_empty() {
            return Err(DeployError::Validation(
                "rejection reason is required".to_string(),
            ));
        }

        let approver = approver_id.to_string();
        let reason = reason.to_string();
        let record = self
            .store
            .update_if_status(
                pool_id,
                &[PoolStatus::Pending],
                Box::new(move |r| r.mark_rejected(approver, reason)),
            )
            .await
            .map_err(|e| DeployError::from_storage(e, "reject"))?;

        tracing::info!(
            target: "poolforge::deployment",
            pool_id = %record.id,
            "pool rejected"
        );
        Ok(record)
    }

    /// Handle a confirmed deployment step and immediately submit the
    /// next one. A confirmation for a step the pool has already moved
    /// past is a safe no-op (`StepOutcome::Superseded`).
    pub async fn on_step_completed(
        &self,
        pool_id: &str,
        step: DeployStep,
        tx_hash: &str,
    ) -> Result<StepOutcome, DeployError> {
        let hash = tx_hash.to_string();
        let result = self
            .store
            .update_if_status(
                pool_id,
                &[step.in_flight_status()],
                Box::new(move |r| {
                    if step == DeployStep::CreatePool {
                        r.onchain_pool_id = Some(derive_onchain_pool_id(&hash));
                    }
                    r.set_step_tx_hash(step, hash);
                    r.status = step.target_status();
                }),
            )
            .await;

        let record = match result {
            Ok(record) => record,
            Err(StorageError::StatusConflict { id, actual }) => {
                tracing::debug!(
                    target: "poolforge::deployment",
                    pool_id = %id,
                    step = %step,
                    actual = %actual,
                    "stale step confirmation ignored"
                );
                return Ok(StepOutcome::Superseded);
            }
            Err(e) => return Err(DeployError::from_storage(e, "confirm")),
        };

        tracing::info!(
            target: "poolforge::deployment",
            pool_id = %record.id,
            step = %step,
            status = %record.status,
            "deployment step confirmed"
        );

        let next = match step.next() {
            Some(next) => next,
            None => return Ok(StepOutcome::Applied(record)), // terminal deployed
        };

        // Kick off the next step. If the submission fails the pool
        // stays at the step's target status and an operator retry of
        // the next step picks it up from there.
        let outcome = self.submit_step(&record, next).await;
        if outcome.is_failed() {
            tracing::warn!(
                target: "poolforge::deployment",
                pool_id = %record.id,
                step = %next,
                error = outcome.error.as_deref().unwrap_or("unknown"),
                "next step submission failed; awaiting operator retry"
            );
            return Ok(StepOutcome::Applied(record));
        }

        let updated = self
            .record_submission(pool_id, next, step.target_status(), outcome)
            .await?;
        Ok(StepOutcome::Applied(updated))
    }

    /// Move an in-flight pool to failed, preserving recorded tx ids.
    pub async fn on_step_failed(
        &self,
        pool_id: &str,
        error: &str,
    ) -> Result<StepOutcome, DeployError> {
        let message = if error.trim().is_empty() {
            "transaction failed on-chain".to_string()
        } else {
            error.to_string()
        };

        let failable = [
            PoolStatus::DeployingPool,
            PoolStatus::PoolCreated,
            PoolStatus::ConfiguringPool,
            PoolStatus::PoolConfigured,
            PoolStatus::DeployingLoans,
        ];

        let result = self
            .store
            .update_if_status(
                pool_id,
                &failable,
                Box::new(move |r| r.mark_failed(message)),
            )
            .await;

        match result {
            Ok(record) => {
                tracing::warn!(
                    target: "poolforge::deployment",
                    pool_id = %record.id,
                    error = record.last_error.as_deref().unwrap_or(""),
                    "deployment step failed"
                );
                Ok(StepOutcome::Applied(record))
            }
            Err(StorageError::StatusConflict { id, actual }) => {
                tracing::debug!(
                    target: "poolforge::deployment",
                    pool_id = %id,
                    actual = %actual,
                    "failure notification ignored"
                );
                Ok(StepOutcome::Superseded)
            }
            Err(e) => Err(DeployError::from_storage(e, "fail")),
        }
    }

    /// Operator-initiated retry of exactly one step. Shares the same
    /// submission path as the primary flow; only that step's
    /// transaction id/hash are overwritten.
    pub async fn retry(
        &self,
        pool_id: &str,
        step: DeployStep,
        approver_id: &str,
        wallet_id: &str,
    ) -> Result<PoolRecord, DeployError> {
        if approver_id.trim().is_empty() || wallet_id.trim().is_empty() {
            return Err(DeployError::Validation(
                "approver id and wallet id are required".to_string(),
            ));
        }

        let record = self
            .store
            .get(pool_id)
            .await
            .map_err(|e| DeployError::from_storage(e, "retry"))?
            .ok_or_else(|| DeployError::NotFound(pool_id.to_string()))?;

        let observed = record.status;
        match observed.pipeline_rank() {
            // A step that already succeeded must not be re-submitted
            Some(rank) if rank >= step.target_status().pipeline_rank().unwrap_or(u8::MAX) => {
                return Err(DeployError::InvalidStatus {
                    action: "retry",
                    actual: observed,
                });
            }
            // The pool has not reached this step yet
            Some(rank) if rank < step.prior_status().pipeline_rank().unwrap_or(0) => {
                return Err(DeployError::InvalidStatus {
                    action: "retry",
                    actual: observed,
                });
            }
            Some(_) => {}
            None if observed == PoolStatus::Failed => {}
            None => {
                return Err(DeployError::InvalidStatus {
                    action: "retry",
                    actual: observed,
                });
            }
        }

        // A hash is only ever recorded by confirmation; re-running a
        // confirmed step would mint a second on-chain identity
        if record.step_tx_hash(step).is_some() {
            return Err(DeployError::InvalidStatus {
                action: "retry",
                actual: observed,
            });
        }

        if step != DeployStep::CreatePool && record.onchain_pool_id.is_none() {
            return Err(DeployError::Validation(
                "pool has no on-chain id yet; retry pool creation first".to_string(),
            ));
        }

        // Re-submit with the retry wallet; new submission, new key
        let mut submit_record = record.clone();
        submit_record.wallet_id = Some(wallet_id.to_string());
        let outcome = self.submit_step(&submit_record, step).await;

        if outcome.is_failed() {
            return Err(DeployError::Submission {
                reason: outcome.error.unwrap_or_else(|| "unknown".to_string()),
                transaction_id: outcome.transaction_id,
            });
        }

        let tx_id = outcome.transaction_id;
        let wallet = wallet_id.to_string();
        let updated = self
            .store
            .update_if_status(
                pool_id,
                &[observed],
                Box::new(move |r| {
                    r.wallet_id = Some(wallet);
                    r.set_step_tx_id(step, tx_id);
                    r.status = step.in_flight_status();
                }),
            )
            .await
            .map_err(|e| DeployError::from_storage(e, "retry"))?;

        tracing::info!(
            target: "poolforge::deployment",
            pool_id = %updated.id,
            step = %step,
            "deployment step re-submitted"
        );
        Ok(updated)
    }

    /// Pool status read for the presentation layer
    pub async fn get_pool(&self, pool_id: &str) -> Result<PoolRecord, DeployError> {
        self.store
            .get(pool_id)
            .await
            .map_err(|e| DeployError::from_storage(e, "get"))?
            .ok_or_else(|| DeployError::NotFound(pool_id.to_string()))
    }

    /// List all pools
    pub async fn list_pools(&self) -> Result<Vec<PoolRecord>, DeployError> {
        self.store
            .get_all()
            .await
            .map_err(|e| DeployError::from_storage(e, "list"))
    }

    /// Build and submit one step's transaction. One code path serves
    /// first submissions and retries alike.
    async fn submit_step(&self, record: &PoolRecord, step: DeployStep) -> SubmitOutcome {
        let agg = &record.aggregates;
        // Pool id is only absent for the creation step
        let onchain_id = record.onchain_pool_id.unwrap_or(0);

        let (signature, params) = match step {
            DeployStep::CreatePool => (
                "createPool(uint256,uint256)",
                vec![
                    AbiParam::Uint(agg.total_principal as u128),
                    AbiParam::Uint(agg.loan_count as u128),
                ],
            ),
            DeployStep::ConfigurePool => (
                "configurePool(uint256,uint256,uint256)",
                vec![
                    AbiParam::Uint(onchain_id as u128),
                    AbiParam::Uint(self.config.collateral_ratio_wad),
                    AbiParam::Uint(agg.avg_interest_rate_wad),
                ],
            ),
            DeployStep::DeployLoans => (
                "batchInitLoans(uint256,uint256,uint256,uint256)",
                vec![
                    AbiParam::Uint(onchain_id as u128),
                    AbiParam::Uint(agg.total_principal as u128),
                    AbiParam::Uint(agg.loan_count as u128),
                    AbiParam::Uint(agg.avg_term_months as u128),
                ],
            ),
        };

        let wallet_id = record
            .wallet_id
            .clone()
            .unwrap_or_else(|| self.config.default_wallet_id.clone());

        self.orchestrator
            .submit(
                &self.config.factory_address,
                signature,
                params,
                &wallet_id,
                self.config.fee_level,
            )
            .await
    }

    /// Record a successful submission: advance to the step's in-flight
    /// status and store its transaction id, CAS-guarded on `expected`.
    async fn record_submission(
        &self,
        pool_id: &str,
        step: DeployStep,
        expected: PoolStatus,
        outcome: SubmitOutcome,
    ) -> Result<PoolRecord, DeployError> {
        let tx_id = outcome.transaction_id;
        self.store
            .update_if_status(
                pool_id,
                &[expected],
                Box::new(move |r| {
                    r.set_step_tx_id(step, tx_id);
                    r.status = step.in_flight_status();
                }),
            )
            .await
            .map_err(|e| DeployError::from_storage(e, "record submission"))
    }
}

/// Derive a deterministic numeric on-chain pool identifier from the
/// pool-creation transaction hash.
pub fn derive_onchain_pool_id(tx_hash: &str) -> u64 {
    let digest = Sha256::digest(tx_hash.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::signer::{MockTxSubmitter, SignerError};
    use crate::storage::MemoryPoolStore;

    const FACTORY: &str = "0x3333333333333333333333333333333333333333";

    fn test_config() -> DeploymentConfig {
        DeploymentConfig {
            factory_address: FACTORY.to_string(),
            collateral_ratio_wad: 1_500_000_000_000_000_000, // 1.5
            fee_level: FeeLevel::Medium,
            default_wallet_id: "ops-wallet".to_string(),
        }
    }

    fn sample_loans() -> Vec<LoanInput> {
        vec![LoanInput {
            principal: "250000".to_string(),
            interest_rate_percent: 9.5,
            term_months: 36,
        }]
    }

    fn service_with(mock: MockTxSubmitter) -> (DeploymentService, Arc<MemoryPoolStore>) {
        let store = Arc::new(MemoryPoolStore::new());
        let orchestrator = TxOrchestrator::new(Arc::new(mock));
        let service = DeploymentService::new(store.clone(), orchestrator, test_config());
        (service, store)
    }

    fn submit_ok(mock: &mut MockTxSubmitter, times: usize) {
        let counter = std::sync::atomic::AtomicUsize::new(0);
        mock.expect_submit().times(times).returning(move |_| {
            let n = counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(format!("tx-{}", n))
        });
    }

    #[tokio::test]
    async fn test_create_pool_freezes_aggregates() {
        let (service, _) = service_with(MockTxSubmitter::new());
        let record = service
            .create_pool("creator".to_string(), &sample_loans())
            .await
            .unwrap();

        assert_eq!(record.status, PoolStatus::Pending);
        assert_eq!(record.aggregates.total_principal, 250_000_000_000);
        assert_eq!(record.aggregates.loan_count, 1);
    }

    #[tokio::test]
    async fn test_create_pool_rejects_invalid_batch() {
        let (service, _) = service_with(MockTxSubmitter::new());
        let result = service.create_pool("creator".to_string(), &[]).await;
        assert!(matches!(result, Err(DeployError::Validation(_))));
    }

    #[tokio::test]
    async fn test_approve_submits_and_advances() {
        let mut mock = MockTxSubmitter::new();
        submit_ok(&mut mock, 1);
        let (service, _) = service_with(mock);

        let pool = service
            .create_pool("creator".to_string(), &sample_loans())
            .await
            .unwrap();
        let approved = service.approve(&pool.id, "admin", "wallet-1").await.unwrap();

        assert_eq!(approved.status, PoolStatus::DeployingPool);
        assert_eq!(approved.create_tx_id.as_deref(), Some("tx-0"));
        assert_eq!(approved.approved_by.as_deref(), Some("admin"));
        assert_eq!(approved.wallet_id.as_deref(), Some("wallet-1"));
    }

    #[tokio::test]
    async fn test_approve_twice_rejected() {
        let mut mock = MockTxSubmitter::new();
        submit_ok(&mut mock, 1);
        let (service, _) = service_with(mock);

        let pool = service
            .create_pool("creator".to_string(), &sample_loans())
            .await
            .unwrap();
        service.approve(&pool.id, "admin", "wallet-1").await.unwrap();

        let second = service.approve(&pool.id, "admin2", "wallet-2").await;
        assert!(matches!(
            second,
            Err(DeployError::InvalidStatus {
                action: "approve",
                actual: PoolStatus::DeployingPool,
            })
        ));
    }

    #[tokio::test]
    async fn test_approve_submission_failure_rolls_back() {
        let mut mock = MockTxSubmitter::new();
        mock.expect_submit()
            .times(1)
            .returning(|_| Err(SignerError::Rejected("out of gas".to_string())));
        let (service, _) = service_with(mock);

        let pool = service
            .create_pool("creator".to_string(), &sample_loans())
            .await
            .unwrap();
        let result = service.approve(&pool.id, "admin", "wallet-1").await;

        assert!(matches!(result, Err(DeployError::Submission { .. })));

        let record = service.get_pool(&pool.id).await.unwrap();
        assert_eq!(record.status, PoolStatus::Pending);
        assert!(record.approved_by.is_none());
        assert!(record.create_tx_id.is_none());
    }

    #[tokio::test]
    async fn test_reject_requires_reason_and_pending() {
        let (service, _) = service_with(MockTxSubmitter::new());
        let pool = service
            .create_pool("creator".to_string(), &sample_loans())
            .await
            .unwrap();

        let no_reason = service.reject(&pool.id, "admin", "  ").await;
        assert!(matches!(no_reason, Err(DeployError::Validation(_))));

        let rejected = service
            .reject(&pool.id, "admin", "incomplete loan data")
            .await
            .unwrap();
        assert_eq!(rejected.status, PoolStatus::Rejected);
        assert_eq!(
            rejected.rejection_reason.as_deref(),
            Some("incomplete loan data")
        );

        // Terminal: no further transition
        let again = service.reject(&pool.id, "admin", "again").await;
        assert!(matches!(again, Err(DeployError::InvalidStatus { .. })));
        let approve = service.approve(&pool.id, "admin", "wallet-1").await;
        assert!(matches!(approve, Err(DeployError::InvalidStatus { .. })));
    }

    #[tokio::test]
    async fn test_step_completion_advances_and_submits_next() {
        let mut mock = MockTxSubmitter::new();
        submit_ok(&mut mock, 2); // approve + configure
        let (service, _) = service_with(mock);

        let pool = service
            .create_pool("creator".to_string(), &sample_loans())
            .await
            .unwrap();
        service.approve(&pool.id, "admin", "wallet-1").await.unwrap();

        let outcome = service
            .on_step_completed(&pool.id, DeployStep::CreatePool, "0xhash1")
            .await
            .unwrap();

        let record = match outcome {
            StepOutcome::Applied(r) => r,
            StepOutcome::Superseded => panic!("expected applied"),
        };
        assert_eq!(record.status, PoolStatus::ConfiguringPool);
        assert!(record.onchain_pool_id.is_some());
        assert_eq!(record.create_tx_hash.as_deref(), Some("0xhash1"));
        assert_eq!(record.configure_tx_id.as_deref(), Some("tx-1"));
    }

    #[tokio::test]
    async fn test_duplicate_completion_is_superseded_no_resubmit() {
        let mut mock = MockTxSubmitter::new();
        submit_ok(&mut mock, 2); // exactly two: create + configure
        let (service, _) = service_with(mock);

        let pool = service
            .create_pool("creator".to_string(), &sample_loans())
            .await
            .unwrap();
        service.approve(&pool.id, "admin", "wallet-1").await.unwrap();

        service
            .on_step_completed(&pool.id, DeployStep::CreatePool, "0xhash1")
            .await
            .unwrap();
        let replay = service
            .on_step_completed(&pool.id, DeployStep::CreatePool, "0xhash1")
            .await
            .unwrap();

        assert!(matches!(replay, StepOutcome::Superseded));
        // mock's times(2) would fail on drop if a third submission happened
        let record = service.get_pool(&pool.id).await.unwrap();
        assert_eq!(record.status, PoolStatus::ConfiguringPool);
    }

    #[tokio::test]
    async fn test_full_pipeline_to_deployed() {
        let mut mock = MockTxSubmitter::new();
        submit_ok(&mut mock, 3); // create, configure, deploy loans
        let (service, _) = service_with(mock);

        let pool = service
            .create_pool("creator".to_string(), &sample_loans())
            .await
            .unwrap();
        service.approve(&pool.id, "admin", "wallet-1").await.unwrap();

        service
            .on_step_completed(&pool.id, DeployStep::CreatePool, "0xhash1")
            .await
            .unwrap();
        service
            .on_step_completed(&pool.id, DeployStep::ConfigurePool, "0xhash2")
            .await
            .unwrap();
        let last = service
            .on_step_completed(&pool.id, DeployStep::DeployLoans, "0xhash3")
            .await
            .unwrap();

        let record = match last {
            StepOutcome::Applied(r) => r,
            StepOutcome::Superseded => panic!("expected applied"),
        };
        assert_eq!(record.status, PoolStatus::Deployed);
        assert_eq!(record.deploy_loans_tx_hash.as_deref(), Some("0xhash3"));
        // every step's correlation survived
        assert!(record.create_tx_id.is_some());
        assert!(record.configure_tx_id.is_some());
        assert!(record.deploy_loans_tx_id.is_some());
    }

    #[tokio::test]
    async fn test_step_failure_marks_failed_and_keeps_tx_ids() {
        let mut mock = MockTxSubmitter::new();
        submit_ok(&mut mock, 1);
        let (service, _) = service_with(mock);

        let pool = service
            .create_pool("creator".to_string(), &sample_loans())
            .await
            .unwrap();
        service.approve(&pool.id, "admin", "wallet-1").await.unwrap();

        let outcome = service
            .on_step_failed(&pool.id, "reverted: bad config")
            .await
            .unwrap();

        let record = match outcome {
            StepOutcome::Applied(r) => r,
            StepOutcome::Superseded => panic!("expected applied"),
        };
        assert_eq!(record.status, PoolStatus::Failed);
        assert_eq!(record.last_error.as_deref(), Some("reverted: bad config"));
        assert!(record.create_tx_id.is_some());
    }

    #[tokio::test]
    async fn test_failure_from_pending_is_ignored() {
        let (service, _) = service_with(MockTxSubmitter::new());
        let pool = service
            .create_pool("creator".to_string(), &sample_loans())
            .await
            .unwrap();

        let outcome = service.on_step_failed(&pool.id, "boom").await.unwrap();
        assert!(matches!(outcome, StepOutcome::Superseded));
        let record = service.get_pool(&pool.id).await.unwrap();
        assert_eq!(record.status, PoolStatus::Pending);
    }

    #[tokio::test]
    async fn test_retry_after_failure_resubmits_one_step() {
        let mut mock = MockTxSubmitter::new();
        submit_ok(&mut mock, 2); // approve + retry
        let (service, _) = service_with(mock);

        let pool = service
            .create_pool("creator".to_string(), &sample_loans())
            .await
            .unwrap();
        service.approve(&pool.id, "admin", "wallet-1").await.unwrap();
        service.on_step_failed(&pool.id, "nonce clash").await.unwrap();

        let retried = service
            .retry(&pool.id, DeployStep::CreatePool, "admin", "wallet-2")
            .await
            .unwrap();

        assert_eq!(retried.status, PoolStatus::DeployingPool);
        // the step's tx id was overwritten with the new submission
        assert_eq!(retried.create_tx_id.as_deref(), Some("tx-1"));
        assert_eq!(retried.wallet_id.as_deref(), Some("wallet-2"));
    }

    #[tokio::test]
    async fn test_retry_of_succeeded_step_rejected() {
        let mut mock = MockTxSubmitter::new();
        submit_ok(&mut mock, 2); // approve + configure
        let (service, _) = service_with(mock);

        let pool = service
            .create_pool("creator".to_string(), &sample_loans())
            .await
            .unwrap();
        service.approve(&pool.id, "admin", "wallet-1").await.unwrap();
        service
            .on_step_completed(&pool.id, DeployStep::CreatePool, "0xhash1")
            .await
            .unwrap();

        // pool is now configuring_pool (rank past pool_created)
        let result = service
            .retry(&pool.id, DeployStep::CreatePool, "admin", "wallet-1")
            .await;
        assert!(matches!(
            result,
            Err(DeployError::InvalidStatus { action: "retry", .. })
        ));
    }

    #[tokio::test]
    async fn test_retry_from_failed_skips_confirmed_steps() {
        let mut mock = MockTxSubmitter::new();
        submit_ok(&mut mock, 3); // approve + configure + configure retry
        let (service, _) = service_with(mock);

        let pool = service
            .create_pool("creator".to_string(), &sample_loans())
            .await
            .unwrap();
        service.approve(&pool.id, "admin", "wallet-1").await.unwrap();
        service
            .on_step_completed(&pool.id, DeployStep::CreatePool, "0xhash1")
            .await
            .unwrap();
        service.on_step_failed(&pool.id, "reverted").await.unwrap();
        let onchain_id = service.get_pool(&pool.id).await.unwrap().onchain_pool_id;

        // Pool creation already confirmed; re-running it would mint a
        // second on-chain identity
        let create_retry = service
            .retry(&pool.id, DeployStep::CreatePool, "admin", "wallet-1")
            .await;
        assert!(matches!(
            create_retry,
            Err(DeployError::InvalidStatus { action: "retry", .. })
        ));

        // The failed configure step is still retriable
        let retried = service
            .retry(&pool.id, DeployStep::ConfigurePool, "admin", "wallet-1")
            .await
            .unwrap();
        assert_eq!(retried.status, PoolStatus::ConfiguringPool);
        assert_eq!(retried.create_tx_hash.as_deref(), Some("0xhash1"));
        assert_eq!(retried.onchain_pool_id, onchain_id);
    }

    #[tokio::test]
    async fn test_retry_of_unreached_step_rejected() {
        let mut mock = MockTxSubmitter::new();
        submit_ok(&mut mock, 1);
        let (service, _) = service_with(mock);

        let pool = service
            .create_pool("creator".to_string(), &sample_loans())
            .await
            .unwrap();
        service.approve(&pool.id, "admin", "wallet-1").await.unwrap();

        // still deploying_pool; loan deployment has not been reached
        let result = service
            .retry(&pool.id, DeployStep::DeployLoans, "admin", "wallet-1")
            .await;
        assert!(matches!(result, Err(DeployError::InvalidStatus { .. })));
    }

    #[tokio::test]
    async fn test_retry_configure_requires_onchain_id() {
        let (service, store) = service_with(MockTxSubmitter::new());

        let pool = service
            .create_pool("creator".to_string(), &sample_loans())
            .await
            .unwrap();
        // Force a failed state without an on-chain id
        store
            .update_if_status(
                &pool.id,
                &[PoolStatus::Pending],
                Box::new(|r| r.mark_failed("early failure".to_string())),
            )
            .await
            .unwrap();

        let result = service
            .retry(&pool.id, DeployStep::ConfigurePool, "admin", "wallet-1")
            .await;
        assert!(matches!(result, Err(DeployError::Validation(_))));
    }

    #[tokio::test]
    async fn test_retry_submission_failure_leaves_status() {
        let mut mock = MockTxSubmitter::new();
        let calls = std::sync::atomic::AtomicUsize::new(0);
        mock.expect_submit().times(2).returning(move |_| {
            if calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 0 {
                Ok("tx-0".to_string())
            } else {
                Err(SignerError::Rejected("signer down".to_string()))
            }
        });
        let (service, _) = service_with(mock);

        let pool = service
            .create_pool("creator".to_string(), &sample_loans())
            .await
            .unwrap();
        service.approve(&pool.id, "admin", "wallet-1").await.unwrap();
        service.on_step_failed(&pool.id, "reverted").await.unwrap();

        let result = service
            .retry(&pool.id, DeployStep::CreatePool, "admin", "wallet-1")
            .await;
        assert!(matches!(result, Err(DeployError::Submission { .. })));

        let record = service.get_pool(&pool.id).await.unwrap();
        assert_eq!(record.status, PoolStatus::Failed);
        // original correlation untouched
        assert_eq!(record.create_tx_id.as_deref(), Some("tx-0"));
    }

    #[test]
    fn test_onchain_pool_id_derivation() {
        let a = derive_onchain_pool_id("0xhash1");
        let b = derive_onchain_pool_id("0xhash1");
        let c = derive_onchain_pool_id("0xhash2");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
