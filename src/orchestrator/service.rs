//! Transaction Orchestrator
//!
//! Encodes a deployment intent into a contract call and submits it
//! through the external signer. Every call gets a fresh idempotency
//! key; retries at a higher level are new submissions with new keys.
//!
//! This layer never returns `Err`: submission problems come back as a
//! `SubmitOutcome` with `SubmitStatus::Failed` so the state machine can
//! leave the pool's status untouched.

use std::sync::Arc;
use uuid::Uuid;

use super::signer::{SignerRequest, TxSubmitter};
use super::types::{AbiParam, FeeLevel, SubmitOutcome, SubmitStatus};

/// Check basic EVM address syntax: 0x followed by 40 hex digits
pub fn is_valid_contract_address(address: &str) -> bool {
    let hex_part = match address.strip_prefix("0x") {
        Some(rest) => rest,
        None => return false,
    };
    hex_part.len() == 40 && hex_part.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Transaction orchestrator over an injected submitter
pub struct TxOrchestrator {
    submitter: Arc<dyn TxSubmitter>,
}

impl TxOrchestrator {
    pub fn new(submitter: Arc<dyn TxSubmitter>) -> Self {
        Self { submitter }
    }

    /// Validate, encode and submit a contract call.
    ///
    /// Numeric parameters must already be scaled to their contract
    /// fixed-point representation by the caller (see `types::units`).
    pub async fn submit(
        &self,
        contract_address: &str,
        function_signature: &str,
        parameters: Vec<AbiParam>,
        wallet_id: &str,
        fee_level: FeeLevel,
    ) -> SubmitOutcome {
        // Fresh key per call, never reused even across retries
        let idempotency_key = Uuid::new_v4().to_string();

        if !is_valid_contract_address(contract_address) {
            return Self::failed(
                idempotency_key,
                format!("invalid contract address: {}", contract_address),
            );
        }
        if function_signature.trim().is_empty() {
            return Self::failed(idempotency_key, "empty function signature".to_string());
        }
        if wallet_id.trim().is_empty() {
            return Self::failed(idempotency_key, "empty wallet id".to_string());
        }

        let request = SignerRequest {
            contract_address: contract_address.to_string(),
            function_signature: function_signature.to_string(),
            abi_parameters: parameters.iter().map(AbiParam::to_json).collect(),
            wallet_id: wallet_id.to_string(),
            idempotency_key: idempotency_key.clone(),
            fee_level,
        };

        match self.submitter.submit(request).await {
            Ok(transaction_id) => {
                tracing::info!(
                    target: "poolforge::orchestrator",
                    %transaction_id,
                    function = function_signature,
                    "transaction submitted"
                );
                SubmitOutcome {
                    transaction_id,
                    status: SubmitStatus::Pending,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(
                    target: "poolforge::orchestrator",
                    idempotency_key = %idempotency_key,
                    function = function_signature,
                    error = %e,
                    "transaction submission failed"
                );
                Self::failed(idempotency_key, e.to_string())
            }
        }
    }

    fn failed(fallback_id: String, error: String) -> SubmitOutcome {
        SubmitOutcome {
            transaction_id: fallback_id,
            status: SubmitStatus::Failed,
            error: Some(error),
        }
    }
}
