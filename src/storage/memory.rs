//! In-Memory Storage Implementation
//!
//! Thread-safe in-memory pool store. Data is lost when the service
//! restarts; a durable implementation can replace it behind `PoolStore`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::traits::{PoolStore, StorageError, StorageResult};
use crate::types::pool::{DeployStep, PoolRecord, PoolStatus};

/// In-memory pool store
///
/// Keeps a secondary index from submitted transaction id to
/// (pool id, step) so webhook reconciliation is a map lookup rather
/// than a scan over every pool's three transaction-id fields.
#[derive(Clone)]
pub struct MemoryPoolStore {
    /// Records indexed by pool ID
    records: Arc<RwLock<HashMap<String, PoolRecord>>>,
    /// Index: transaction ID -> (pool ID, step)
    tx_index: Arc<RwLock<HashMap<String, (String, DeployStep)>>>,
}

impl MemoryPoolStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            tx_index: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Add any transaction ids on the record to the index.
    /// Entries for superseded submissions are left in place; the state
    /// machine's own status guard makes them harmless.
    fn index_entries(record: &PoolRecord) -> Vec<(String, (String, DeployStep))> {
        let mut entries = Vec::new();
        for step in [
            DeployStep::CreatePool,
            DeployStep::ConfigurePool,
            DeployStep::DeployLoans,
        ] {
            if let Some(tx_id) = record.step_tx_id(step) {
                entries.push((tx_id.to_string(), (record.id.clone(), step)));
            }
        }
        entries
    }
}

impl Default for MemoryPoolStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PoolStore for MemoryPoolStore {
    async fn insert(&self, record: &PoolRecord) -> StorageResult<()> {
        let mut records = self.records.write().await;

        if records.contains_key(&record.id) {
            return Err(StorageError::Duplicate(record.id.clone()));
        }

        let mut tx_index = self.tx_index.write().await;
        for (tx_id, entry) in Self::index_entries(record) {
            tx_index.insert(tx_id, entry);
        }
        records.insert(record.id.clone(), record.clone());

        Ok(())
    }

    async fn get(&self, id: &str) -> StorageResult<Option<PoolRecord>> {
        let records = self.records.read().await;
        Ok(records.get(id).cloned())
    }

    async fn get_all(&self) -> StorageResult<Vec<PoolRecord>> {
        let records = self.records.read().await;
        Ok(records.values().cloned().collect())
    }

    async fn get_by_status(&self, status: PoolStatus) -> StorageResult<Vec<PoolRecord>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect())
    }

    async fn find_by_tx_id(
        &self,
        tx_id: &str,
    ) -> StorageResult<Option<(PoolRecord, DeployStep)>> {
        let tx_index = self.tx_index.read().await;
        let (pool_id, step) = match tx_index.get(tx_id) {
            Some(entry) => entry.clone(),
            None => return Ok(None),
        };
        drop(tx_index);

        let records = self.records.read().await;
        Ok(records.get(&pool_id).map(|r| (r.clone(), step)))
    }

    async fn update_if_status(
        &self,
        id: &str,
        expected: &[PoolStatus],
        mutate: Box<dyn for<'a> FnOnce(&'a mut PoolRecord) + Send>,
    ) -> StorageResult<PoolRecord> {
        let mut records = self.records.write().await;

        let record = records
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;

        if !expected.contains(&record.status) {
            return Err(StorageError::StatusConflict {
                id: id.to_string(),
                actual: record.status,
            });
        }

        mutate(record);
        let updated = record.clone();
        drop(records);

        let mut tx_index = self.tx_index.write().await;
        for (tx_id, entry) in Self::index_entries(&updated) {
            tx_index.insert(tx_id, entry);
        }

        Ok(updated)
    }

    async fn count_by_status(&self) -> StorageResult<HashMap<String, u64>> {
        let records = self.records.read().await;
        let mut counts: HashMap<String, u64> = HashMap::new();
        for record in records.values() {
            *counts.entry(record.status.to_string()).or_default() += 1;
        }
        Ok(counts)
    }
}
