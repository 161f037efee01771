//! Deposit Ledger Service
//!
//! Reconstructs pending/claimable/claimed balances per (pool, user)
//! from the stream of deposit events. The ledger is a derived cache of
//! the authoritative on-chain event log: applying an event is a pure
//! function of (current state, event), so a full replay yields the same
//! state.
//!
//! Conservation invariant: for every entry, the sum of historical
//! requested amounts equals pending + claimable + claimed.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::types::{
    DepositEntry, DepositEvent, DepositEventKind, DepositStatusResponse, PendingDeposit,
    PoolDepositStats,
};
use crate::orchestrator::is_valid_contract_address;
use crate::types::units;

/// Deposit ledger errors
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Invalid deposit event: {0}")]
    Validation(String),

    #[error("Insufficient pending balance: have {available}, fulfilling {requested}")]
    InsufficientPending { available: u64, requested: u64 },

    #[error("Insufficient claimable balance: have {available}, claiming {requested}")]
    InsufficientClaimable { available: u64, requested: u64 },

    #[error("Ledger invariant violated: {0}")]
    Internal(String),
}

/// In-memory deposit ledger keyed by (pool id, user address)
///
/// One lock guards the whole map; `apply` runs its validate-then-mutate
/// sequence under a single write guard with no await inside, so events
/// for the same key can never interleave mid-transition.
#[derive(Clone)]
pub struct DepositLedger {
    entries: Arc<RwLock<HashMap<(u64, String), DepositEntry>>>,
}

impl DepositLedger {
    /// Create a new empty ledger
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Validate an event and return its amount in micro-units
    fn validate(event: &DepositEvent) -> Result<u64, LedgerError> {
        if !is_valid_contract_address(&event.user_address) {
            return Err(LedgerError::Validation(format!(
                "invalid user address: {}",
                event.user_address
            )));
        }
        if event.tx_hash.trim().is_empty() {
            return Err(LedgerError::Validation("missing tx hash".to_string()));
        }
        if event.timestamp == 0 {
            return Err(LedgerError::Validation("missing timestamp".to_string()));
        }
        units::parse_units6(&event.amount).ok_or_else(|| {
            LedgerError::Validation(format!("invalid amount: {:?}", event.amount))
        })
    }

    /// Compute the next entry state. Pure: no side effects, so a
    /// rejected event provably mutates nothing.
    fn transition(
        entry: &DepositEntry,
        kind: DepositEventKind,
        amount: u64,
        timestamp: u64,
    ) -> Result<DepositEntry, LedgerError> {
        let mut next = *entry;

        match kind {
            DepositEventKind::Requested => {
                next.pending = entry.pending.checked_add(amount).ok_or_else(|| {
                    LedgerError::Internal("pending balance overflow".to_string())
                })?;
            }
            DepositEventKind::Fulfilled => {
                if entry.pending < amount {
                    return Err(LedgerError::InsufficientPending {
                        available: entry.pending,
                        requested: amount,
                    });
                }
                next.pending = entry.pending - amount;
                next.claimable = entry.claimable.checked_add(amount).ok_or_else(|| {
                    LedgerError::Internal("claimable balance overflow".to_string())
                })?;
            }
            DepositEventKind::Claimed => {
                if entry.claimable < amount {
                    return Err(LedgerError::InsufficientClaimable {
                        available: entry.claimable,
                        requested: amount,
                    });
                }
                next.claimable = entry.claimable - amount;
                next.claimed = entry.claimed.checked_add(amount).ok_or_else(|| {
                    LedgerError::Internal("claimed balance overflow".to_string())
                })?;
            }
        }

        next.last_updated = timestamp;
        Ok(next)
    }

    /// Apply a deposit event, returning the updated entry state.
    ///
    /// Invalid events are rejected before any lookup; rejected events
    /// never create or mutate an entry, so partial application is not
    /// observable.
    pub async fn apply(&self, event: &DepositEvent) -> Result<DepositStatusResponse, LedgerError> {
        let amount = Self::validate(event)?;
        let key = (event.pool_id, event.user_address.to_lowercase());

        let mut entries = self.entries.write().await;
        let current = entries.get(&key).copied().unwrap_or_default();
        let next = Self::transition(&current, event.kind, amount, event.timestamp)?;

        // Committed only after the full transition succeeded
        entries.insert(key.clone(), next);
        drop(entries);

        tracing::debug!(
            target: "poolforge::ledger",
            kind = %event.kind,
            pool_id = event.pool_id,
            user = %key.1,
            amount = %event.amount,
            "deposit event applied"
        );

        Ok(DepositStatusResponse::from_entry(key.0, &key.1, &next))
    }

    /// Get a defensive copy of a user's status; all zeros when absent
    pub async fn get_status(&self, pool_id: u64, user_address: &str) -> DepositStatusResponse {
        let key = (pool_id, user_address.to_lowercase());
        let entries = self.entries.read().await;

        match entries.get(&key) {
            Some(entry) => DepositStatusResponse::from_entry(pool_id, &key.1, entry),
            None => {
                let empty = DepositEntry {
                    last_updated: now_secs(),
                    ..Default::default()
                };
                DepositStatusResponse::from_entry(pool_id, &key.1, &empty)
            }
        }
    }

    /// All entries with pending balance, oldest update first
    pub async fn list_pending(&self) -> Vec<PendingDeposit> {
        let entries = self.entries.read().await;
        let mut pending: Vec<PendingDeposit> = entries
            .iter()
            .filter(|(_, e)| e.pending > 0)
            .map(|((pool_id, user), e)| PendingDeposit {
                pool_id: *pool_id,
                user_address: user.clone(),
                pending: units::units6_to_string(e.pending),
                last_updated: e.last_updated,
            })
            .collect();

        pending.sort_by_key(|p| p.last_updated);
        pending
    }

    /// Aggregate deposit statistics for one pool
    pub async fn pool_stats(&self, pool_id: u64) -> PoolDepositStats {
        let entries = self.entries.read().await;

        let mut total_pending: u64 = 0;
        let mut total_claimable: u64 = 0;
        let mut total_claimed: u64 = 0;
        let mut depositors: u64 = 0;

        for ((pid, _), entry) in entries.iter() {
            if *pid != pool_id {
                continue;
            }
            depositors += 1;
            total_pending = total_pending.saturating_add(entry.pending);
            total_claimable = total_claimable.saturating_add(entry.claimable);
            total_claimed = total_claimed.saturating_add(entry.claimed);
        }

        let avg_position = if depositors == 0 {
            0
        } else {
            total_pending.saturating_add(total_claimable) / depositors
        };

        PoolDepositStats {
            pool_id,
            total_pending: units::units6_to_string(total_pending),
            total_claimed: units::units6_to_string(total_claimed),
            unique_depositors: depositors,
            avg_position: units::units6_to_string(avg_position),
        }
    }

    /// Clear all state. Recovery and testing only; normal operation
    /// never removes entries.
    pub async fn reset(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
        tracing::warn!(target: "poolforge::ledger", "ledger reset");
    }
}

impl Default for DepositLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
