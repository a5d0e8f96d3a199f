//! In-memory storage implementation
//!
//! Batches live in one map behind a single reader/writer lock. Writes hold the
//! lock exclusively for the whole batch, so concurrent readers observe either
//! the previous state or the complete new batch.

use crate::storage::traits::{shared_batch_id, Repository, StorageError, StorageResult};
use crate::storage::ResultRecord;
use std::collections::HashMap;
use std::sync::RwLock;

/// Process-local result storage
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    results: RwLock<HashMap<String, Vec<ResultRecord>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Repository for InMemoryRepository {
    fn create_results(&self, results: &[ResultRecord]) -> StorageResult<()> {
        let batch_id = shared_batch_id(results)?.to_string();

        let mut store = self
            .results
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        store.insert(batch_id, results.to_vec());

        Ok(())
    }

    fn get_batch_results(&self, batch_id: &str) -> StorageResult<Vec<ResultRecord>> {
        let store = self
            .results
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;

        store
            .get(batch_id)
            .cloned()
            .ok_or_else(|| StorageError::BatchNotFound(batch_id.to_string()))
    }

    fn list_results(&self) -> StorageResult<HashMap<String, Vec<ResultRecord>>> {
        let store = self
            .results
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(store.clone())
    }
}
