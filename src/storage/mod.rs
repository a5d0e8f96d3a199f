//! Storage module for persisting batch results
//!
//! This module handles everything the service keeps between requests:
//! - The `ResultRecord` persisted for every scraped address
//! - The `Repository` trait the batch orchestrator writes through
//! - An in-memory backend and a SQLite backend

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::InMemoryRepository;
pub use sqlite::SqliteRepository;
pub use traits::{Repository, StorageError, StorageResult};

use crate::config::{StorageBackend, StorageConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// One scraped page, persisted as part of a batch
///
/// `error` is set exactly when `success` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub id: String,
    pub batch_id: String,
    pub page_url: String,
    pub external_links_num: u32,
    pub internal_links_num: u32,
    pub success: bool,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Opens the repository selected by the configuration
///
/// # Arguments
///
/// * `config` - The storage configuration
///
/// # Returns
///
/// * `Ok(Arc<dyn Repository>)` - The ready-to-use repository
/// * `Err(StorageError)` - The SQLite database could not be opened
pub fn open_repository(config: &StorageConfig) -> StorageResult<Arc<dyn Repository>> {
    match config.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory result storage");
            Ok(Arc::new(InMemoryRepository::new()))
        }
        StorageBackend::Sqlite => {
            let path = config.database_path.as_deref().ok_or_else(|| {
                StorageError::Database("database_path is not configured".to_string())
            })?;
            tracing::info!("Using SQLite result storage at {}", path);
            Ok(Arc::new(SqliteRepository::new(Path::new(path))?))
        }
    }
}
