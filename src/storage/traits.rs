//! Storage Trait Definitions
//!
//! Abstract storage interface for pool records. The deployment state
//! machine treats the store as a synchronous get/update dependency, so
//! a durable implementation can be swapped in later without touching
//! call sites.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

use crate::types::pool::{DeployStep, PoolRecord, PoolStatus};

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Status conflict for {id}: currently {actual}")]
    StatusConflict { id: String, actual: PoolStatus },

    #[error("Database error: {0}")]
    Database(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Pool storage interface
///
/// Implementations:
/// - `MemoryPoolStore` - In-memory storage with a transaction-id index
#[async_trait]
pub trait PoolStore: Send + Sync {
    /// Insert a new pool record
    async fn insert(&self, record: &PoolRecord) -> StorageResult<()>;

    /// Get a pool by ID
    async fn get(&self, id: &str) -> StorageResult<Option<PoolRecord>>;

    /// Get all pools
    async fn get_all(&self) -> StorageResult<Vec<PoolRecord>>;

    /// Get all pools with a specific status
    async fn get_by_status(&self, status: PoolStatus) -> StorageResult<Vec<PoolRecord>>;

    /// Locate the pool that submitted a transaction, and which step it was
    async fn find_by_tx_id(&self, tx_id: &str)
        -> StorageResult<Option<(PoolRecord, DeployStep)>>;

    /// Compare-and-set update: apply `mutate` only while the pool's
    /// current status is one of `expected`. Returns the updated record,
    /// or `StatusConflict` when another writer got there first.
    async fn update_if_status(
        &self,
        id: &str,
        expected: &[PoolStatus],
        mutate: Box<dyn for<'a> FnOnce(&'a mut PoolRecord) + Send>,
    ) -> StorageResult<PoolRecord>;

    /// Count pools grouped by status string
    async fn count_by_status(&self) -> StorageResult<HashMap<String, u64>>;
}
