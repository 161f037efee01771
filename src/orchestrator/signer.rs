//! External Signing Service Client
//!
//! HTTP client for the custodial transaction-signing/broadcast service.
//! The service accepts a contract execution request and returns a
//! transaction id; confirmation is delivered later via webhook.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::types::FeeLevel;

/// Signer client errors
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Submission rejected by signer: {0}")]
    Rejected(String),

    #[error("Invalid signer response: {0}")]
    InvalidResponse(String),
}

/// Contract execution request sent to the signing service
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerRequest {
    pub contract_address: String,
    pub function_signature: String,
    pub abi_parameters: Vec<serde_json::Value>,
    pub wallet_id: String,
    pub idempotency_key: String,
    pub fee_level: FeeLevel,
}

/// Signer response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignerResponse {
    transaction_id: String,
}

/// Abstraction over the external signer, mocked in tests
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TxSubmitter: Send + Sync {
    /// Submit a contract execution; returns the signer's transaction id
    async fn submit(&self, request: SignerRequest) -> Result<String, SignerError>;
}

/// HTTP signer client
#[derive(Debug, Clone)]
pub struct SignerClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SignerClient {
    /// Create a new client with custom URL
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl TxSubmitter for SignerClient {
    async fn submit(&self, request: SignerRequest) -> Result<String, SignerError> {
        let url = format!("{}/v1/transactions/contract-execution", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !resp.status().is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            return Err(SignerError::Rejected(error_text));
        }

        let body: SignerResponse = resp
            .json()
            .await
            .map_err(|e| SignerError::InvalidResponse(e.to_string()))?;

        if body.transaction_id.is_empty() {
            return Err(SignerError::InvalidResponse(
                "empty transaction id".to_string(),
            ));
        }

        Ok(body.transaction_id)
    }
}
