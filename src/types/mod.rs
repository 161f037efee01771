//! Shared Types Module
//!
//! Data types shared across the poolforge backend.

pub mod pool;
pub mod units;

// Re-exports for convenience
pub use pool::{
    ApprovePoolRequest, CreatePoolRequest, DeployStep, LoanAggregates, LoanInput, PoolRecord,
    PoolStatus, PoolStatusResponse, PoolStatusUpdate, RejectPoolRequest,
};
pub use units::{
    parse_units6, percent_to_wad, ratio_to_wad, tokens_to_units6, units6_to_string,
    UNITS_PER_TOKEN, WAD,
};
