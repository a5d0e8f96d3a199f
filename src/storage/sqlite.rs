//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Repository trait.
//! Each batch is written inside one transaction.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{shared_batch_id, Repository, StorageError, StorageResult};
use crate::storage::ResultRecord;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SELECT_COLUMNS: &str = "id, batch_id, page_url, external_links_num, internal_links_num,
     success, error, created_at, updated_at";

/// SQLite storage backend
///
/// One connection behind a `Mutex`, so reads are serialized with each other as
/// well as with batch writes.
pub struct SqliteRepository {
    conn: Mutex<Connection>,
}

impl SqliteRepository {
    /// Opens or creates the database at `path`
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteRepository)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_timestamp(index: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                index,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<ResultRecord> {
    Ok(ResultRecord {
        id: row.get(0)?,
        batch_id: row.get(1)?,
        page_url: row.get(2)?,
        external_links_num: row.get(3)?,
        internal_links_num: row.get(4)?,
        success: row.get(5)?,
        error: row.get(6)?,
        created_at: parse_timestamp(7, row.get(7)?)?,
        updated_at: parse_timestamp(8, row.get(8)?)?,
    })
}

impl Repository for SqliteRepository {
    fn create_results(&self, results: &[ResultRecord]) -> StorageResult<()> {
        let batch_id = shared_batch_id(results)?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM results WHERE batch_id = ?1", params![batch_id])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO results (id, batch_id, page_url, external_links_num,
                 internal_links_num, success, error, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;

            for record in results {
                stmt.execute(params![
                    record.id,
                    record.batch_id,
                    record.page_url,
                    record.external_links_num,
                    record.internal_links_num,
                    record.success,
                    record.error,
                    format_timestamp(&record.created_at),
                    format_timestamp(&record.updated_at),
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!("Stored {} results for batch {}", results.len(), batch_id);
        Ok(())
    }

    fn get_batch_results(&self, batch_id: &str) -> StorageResult<Vec<ResultRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM results WHERE batch_id = ?1 ORDER BY seq",
            SELECT_COLUMNS
        ))?;

        let results = stmt
            .query_map(params![batch_id], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        if results.is_empty() {
            return Err(StorageError::BatchNotFound(batch_id.to_string()));
        }

        Ok(results)
    }

    fn list_results(&self) -> StorageResult<HashMap<String, Vec<ResultRecord>>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM results ORDER BY seq",
            SELECT_COLUMNS
        ))?;

        let mut batches: HashMap<String, Vec<ResultRecord>> = HashMap::new();
        for record in stmt.query_map([], record_from_row)? {
            let record = record?;
            batches
                .entry(record.batch_id.clone())
                .or_default()
                .push(record);
        }

        Ok(batches)
    }
}
