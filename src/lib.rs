//! PoolForge Backend - Tokenized Lending Pool Orchestration
//!
//! Backend services for deploying tokenized lending pools on-chain and
//! tracking investor deposits:
//!
//! 1. **Deployment** - Drives approved pools through the three-step
//!    on-chain deployment (create, configure, batch-init loans)
//! 2. **Orchestrator** - Submits contract executions to the external
//!    signing service with per-attempt idempotency keys
//! 3. **Reconciler** - Applies transaction webhooks to the state machine
//! 4. **Ledger** - Rebuilds per-user deposit balances from on-chain events
//!
//! Confirmation is always push-based: the backend submits transactions
//! and waits for the signer's webhooks, it never polls the chain.

pub mod api;
pub mod common;
pub mod config;
pub mod deployment;
pub mod ledger;
pub mod logging;
pub mod orchestrator;
pub mod storage;
pub mod types;

// Re-exports: configuration and errors
pub use common::{PoolForgeError, Result};
pub use config::{ConfigError, Environment, PoolForgeConfig};

// Re-exports: deployment state machine
pub use deployment::{
    DeployError, DeploymentConfig, DeploymentService, PoolUpdatePublisher, ReconcileOutcome,
    StepOutcome, TxWebhookNotification, TxWebhookStatus, WebhookReconciler,
};

// Re-exports: transaction orchestrator
pub use orchestrator::{
    AbiParam, FeeLevel, SignerClient, SignerError, SubmitOutcome, SubmitStatus, TxOrchestrator,
};

// Re-exports: deposit ledger
pub use ledger::{DepositEvent, DepositEventKind, DepositLedger, LedgerError};

// Re-exports: storage
pub use storage::{MemoryPoolStore, PoolStore, StorageError};

// Re-exports: core types
pub use types::pool::{DeployStep, LoanInput, PoolRecord, PoolStatus};
