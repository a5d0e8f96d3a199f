//! Batch module: identified, persisted scrape runs
//!
//! A batch is one call to [`BatchOrchestrator::process_batch`]: every address
//! submitted in that call ends up as one `ResultRecord` sharing the batch ID.

mod orchestrator;

pub use orchestrator::BatchOrchestrator;

use crate::storage::StorageError;
use thiserror::Error;

/// Errors surfaced by batch operations
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("no urls for processing")]
    NoAddresses,

    #[error("failed to create results: {0}")]
    Persistence(#[source] StorageError),

    #[error("batch of results not found")]
    NotFound(String),

    #[error("failed to get batch: {0}")]
    Storage(#[source] StorageError),

    #[error("batch task aborted: {0}")]
    Aborted(String),
}

impl BatchError {
    /// Maps a repository read failure, keeping "not found" distinct
    pub(crate) fn from_read(err: StorageError) -> Self {
        match err {
            StorageError::BatchNotFound(batch_id) => Self::NotFound(batch_id),
            other => Self::Storage(other),
        }
    }
}
