//! Deposit Ledger Module
//!
//! Reconstructs per-user claimable balances from the on-chain deposit
//! event stream:
//!
//! ```text
//! REQUESTED -> pending     FULFILLED -> claimable     CLAIMED -> claimed
//! ```
//!
//! The ledger is a derived cache of the authoritative event log. It
//! supports full rebuild-by-replay and keeps a strict conservation
//! invariant: requested totals always equal pending + claimable + claimed.
//!
//! ## Components
//!
//! - **types**: deposit events, balance entries, read-surface responses
//! - **service**: the `DepositLedger` map and its transition rules

pub mod service;
pub mod types;

// Re-exports
pub use service::{DepositLedger, LedgerError};
pub use types::{
    DepositEntry, DepositEvent, DepositEventKind, DepositStatusResponse, PendingDeposit,
    PoolDepositStats,
};
