//! Storage Layer Module
//!
//! Provides persistence for pool records.
//!
//! This module contains:
//! - Storage trait definitions for abstraction
//! - In-memory implementation with a transaction-id secondary index

pub mod memory;
pub mod traits;

// Re-exports for convenience
pub use memory::MemoryPoolStore;
pub use traits::{PoolStore, StorageError, StorageResult};
