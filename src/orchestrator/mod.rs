//! Transaction Orchestrator Module
//!
//! Encodes deployment intents into contract calls and submits them via
//! the external custodial signing service.
//!
//! ## Components
//!
//! - **types**: fee levels, ABI parameters, submission outcomes
//! - **signer**: `TxSubmitter` trait + HTTP signer client
//! - **service**: `TxOrchestrator` validation and submission logic

pub mod service;
pub mod signer;
pub mod types;

// Re-exports
pub use service::{is_valid_contract_address, TxOrchestrator};
pub use signer::{SignerClient, SignerError, SignerRequest, TxSubmitter};
pub use types::{AbiParam, FeeLevel, SubmitOutcome, SubmitStatus};
