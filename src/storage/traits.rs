//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::ResultRecord;
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no results were passed")]
    NoResults,

    #[error("results belong to more than one batch: {0} and {1}")]
    MixedBatches(String, String),

    #[error("batch of results not found")]
    BatchNotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("storage lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for result storage backends
///
/// Implementations must be safe to share between request handlers. A batch
/// is written as a unit: readers see either none of it or all of it.
pub trait Repository: Send + Sync {
    /// Stores a batch of results
    ///
    /// All records must share one batch ID. Storing a batch ID that already
    /// exists replaces the previous batch.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The whole batch was stored
    /// * `Err(StorageError::NoResults)` - `results` was empty
    fn create_results(&self, results: &[ResultRecord]) -> StorageResult<()>;

    /// Gets every result of one batch, in the order they were stored
    ///
    /// Fails with `StorageError::BatchNotFound` for unknown batch IDs.
    fn get_batch_results(&self, batch_id: &str) -> StorageResult<Vec<ResultRecord>>;

    /// Dumps every stored batch keyed by batch ID
    fn list_results(&self) -> StorageResult<HashMap<String, Vec<ResultRecord>>>;
}

/// Returns the batch ID shared by every record
pub(crate) fn shared_batch_id(results: &[ResultRecord]) -> StorageResult<&str> {
    let first = results.first().ok_or(StorageError::NoResults)?;

    if let Some(other) = results.iter().find(|r| r.batch_id != first.batch_id) {
        return Err(StorageError::MixedBatches(
            first.batch_id.clone(),
            other.batch_id.clone(),
        ));
    }

    Ok(&first.batch_id)
}
