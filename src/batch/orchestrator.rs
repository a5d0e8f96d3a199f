use crate::address::{gather_addresses, Address};
use crate::batch::BatchError;
use crate::crawler::{FetchOutcome, Scraper};
use crate::storage::{Repository, ResultRecord};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Runs scrape batches and stores their results
pub struct BatchOrchestrator {
    scraper: Arc<dyn Scraper>,
    repository: Arc<dyn Repository>,
    batch_timeout: Option<Duration>,
}

impl BatchOrchestrator {
    pub fn new(scraper: Arc<dyn Scraper>, repository: Arc<dyn Repository>) -> Self {
        Self {
            scraper,
            repository,
            batch_timeout: None,
        }
    }

    /// Cancels unfinished fetches once a batch has run for `timeout`
    pub fn with_batch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.batch_timeout = timeout;
        self
    }

    /// Scrapes every address and stores the results as one new batch
    ///
    /// The scrape runs on its own task with its own cancellation token, so a
    /// caller that stops waiting (for example a disconnected HTTP client) does
    /// not cancel the batch; it is still fetched and stored.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<ResultRecord>)` - One record per address, in completion order
    /// * `Err(BatchError::NoAddresses)` - `addresses` was empty
    /// * `Err(BatchError::Persistence)` - The batch could not be stored; no
    ///   records are returned and nothing is retried
    pub async fn process_batch(
        &self,
        addresses: Vec<Address>,
    ) -> Result<Vec<ResultRecord>, BatchError> {
        if addresses.is_empty() {
            return Err(BatchError::NoAddresses);
        }

        let task = tokio::spawn(run_batch(
            Arc::clone(&self.scraper),
            Arc::clone(&self.repository),
            addresses,
            self.batch_timeout,
        ));

        task.await.map_err(|e| BatchError::Aborted(e.to_string()))?
    }

    /// Parses newline-delimited addresses and processes them as one batch
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<ResultRecord>)` - The stored batch
    /// * `Err(LinkscopeError::Address)` - A line is not a valid address; no
    ///   page is fetched
    /// * `Err(LinkscopeError::Batch)` - See [`Self::process_batch`]
    pub async fn process_text(&self, text: &str) -> crate::Result<Vec<ResultRecord>> {
        let addresses = gather_addresses(text)?;
        Ok(self.process_batch(addresses).await?)
    }

    /// Gets the stored results of one batch
    pub fn get_batch(&self, batch_id: &str) -> Result<Vec<ResultRecord>, BatchError> {
        self.repository
            .get_batch_results(batch_id)
            .map_err(BatchError::from_read)
    }

    /// Dumps every stored batch
    pub fn list_batches(&self) -> Result<HashMap<String, Vec<ResultRecord>>, BatchError> {
        self.repository.list_results().map_err(BatchError::Storage)
    }
}

async fn run_batch(
    scraper: Arc<dyn Scraper>,
    repository: Arc<dyn Repository>,
    addresses: Vec<Address>,
    timeout: Option<Duration>,
) -> Result<Vec<ResultRecord>, BatchError> {
    let batch_id = Uuid::new_v4().to_string();
    tracing::info!("Starting batch {} with {} addresses", batch_id, addresses.len());

    let cancel = CancellationToken::new();
    let deadline = timeout.map(|timeout| {
        let cancel = cancel.clone();
        let batch_id = batch_id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            tracing::warn!("Batch {} hit its {:?} deadline, cancelling", batch_id, timeout);
            cancel.cancel();
        })
    });

    let outcomes = scraper.scrape(addresses, cancel).await;

    if let Some(deadline) = deadline {
        deadline.abort();
    }

    let results: Vec<ResultRecord> = outcomes
        .into_iter()
        .map(|outcome| result_record(&batch_id, outcome))
        .collect();

    if let Err(e) = repository.create_results(&results) {
        tracing::error!("Failed to store batch {}: {}", batch_id, e);
        return Err(BatchError::Persistence(e));
    }

    tracing::info!("Stored batch {} with {} results", batch_id, results.len());
    Ok(results)
}

fn result_record(batch_id: &str, outcome: FetchOutcome) -> ResultRecord {
    let now = Utc::now();
    ResultRecord {
        id: Uuid::new_v4().to_string(),
        batch_id: batch_id.to_string(),
        page_url: outcome.address.to_string(),
        external_links_num: outcome.external,
        internal_links_num: outcome.internal,
        success: outcome.success,
        error: outcome.failure_reason,
        created_at: now,
        updated_at: now,
    }
}
