//! Transaction Orchestrator Types

use serde::{Deserialize, Serialize};

/// Fee level forwarded to the external signing service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FeeLevel {
    Low,
    Medium,
    High,
}

impl Default for FeeLevel {
    fn default() -> Self {
        Self::Medium
    }
}

impl std::fmt::Display for FeeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

impl std::str::FromStr for FeeLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            other => Err(format!("unknown fee level: {}", other)),
        }
    }
}

/// A contract call parameter, already scaled to its fixed-point
/// representation where numeric
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiParam {
    /// Unsigned integer, sent as a decimal string to avoid JSON
    /// precision loss
    Uint(u128),
    /// EVM address
    Address(String),
    /// Plain string
    Str(String),
    Bool(bool),
}

impl AbiParam {
    /// Encode for the signer payload
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Uint(v) => serde_json::Value::String(v.to_string()),
            Self::Address(s) | Self::Str(s) => serde_json::Value::String(s.clone()),
            Self::Bool(b) => serde_json::Value::Bool(*b),
        }
    }
}

/// Outcome status of a submission attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitStatus {
    /// Accepted by the signer; confirmation arrives out-of-band
    Pending,
    /// Rejected before or during submission; nothing on-chain
    Failed,
}

/// Result of a submission attempt. Never an `Err` across the public
/// boundary: failures are carried in `status`/`error`.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    /// Signer-assigned transaction id, or the idempotency key as a
    /// fallback correlation id when the call failed
    pub transaction_id: String,
    pub status: SubmitStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubmitOutcome {
    pub fn is_failed(&self) -> bool {
        self.status == SubmitStatus::Failed
    }
}
