//! Deposit Ledger Types
//!
//! Types for reconstructing per-user claimable balances from the
//! on-chain deposit event stream:
//! requested → fulfilled → claimed

use serde::{Deserialize, Serialize};

use crate::types::units;

/// Kind of deposit event emitted by the on-chain deposit flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositEventKind {
    /// User requested a deposit; funds committed but not yet fulfilled
    Requested,
    /// Deposit matched into the pool; amount becomes claimable
    Fulfilled,
    /// User claimed fulfilled funds
    Claimed,
}

impl std::fmt::Display for DepositEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Requested => write!(f, "requested"),
            Self::Fulfilled => write!(f, "fulfilled"),
            Self::Claimed => write!(f, "claimed"),
        }
    }
}

/// A decoded deposit event. Transient: consumed to mutate the ledger,
/// never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositEvent {
    #[serde(rename = "type")]
    pub kind: DepositEventKind,
    pub pool_id: u64,
    pub user_address: String,
    /// Positive decimal string, at most 6 fractional digits
    pub amount: String,
    pub tx_hash: String,
    pub timestamp: u64,
}

/// Per-(pool, user) balance entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DepositEntry {
    /// Requested but not yet fulfilled, micro-units
    pub pending: u64,
    /// Fulfilled and claimable, micro-units
    pub claimable: u64,
    /// Claimed to date, micro-units
    pub claimed: u64,
    /// Timestamp of the last applied event
    pub last_updated: u64,
}

/// Per-user deposit status returned on the read surface
#[derive(Debug, Clone, Serialize)]
pub struct DepositStatusResponse {
    pub pool_id: u64,
    pub user_address: String,
    pub pending: String,
    pub claimable: String,
    pub claimed: String,
    pub last_updated: u64,
}

impl DepositStatusResponse {
    pub fn from_entry(pool_id: u64, user_address: &str, entry: &DepositEntry) -> Self {
        Self {
            pool_id,
            user_address: user_address.to_string(),
            pending: units::units6_to_string(entry.pending),
            claimable: units::units6_to_string(entry.claimable),
            claimed: units::units6_to_string(entry.claimed),
            last_updated: entry.last_updated,
        }
    }
}

/// Admin queue item: an entry with unfulfilled pending balance
#[derive(Debug, Clone, Serialize)]
pub struct PendingDeposit {
    pub pool_id: u64,
    pub user_address: String,
    pub pending: String,
    pub last_updated: u64,
}

/// Aggregated deposit statistics for one pool
#[derive(Debug, Clone, Serialize)]
pub struct PoolDepositStats {
    pub pool_id: u64,
    pub total_pending: String,
    pub total_claimed: String,
    pub unique_depositors: u64,
    /// Average in-flow position (pending + claimable) per depositor
    pub avg_position: String,
}
