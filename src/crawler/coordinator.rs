//! Scrape coordinator - concurrent fan-out over a batch of addresses
//!
//! This module runs one fetch task per address and gathers their outcomes:
//! - A global semaphore bounds the number of fetches in flight
//! - Outcomes flow back through a single completion queue
//! - A supervising task closes the queue once every fetch task has finished

use crate::address::Address;
use crate::crawler::fetcher::{FetchOutcome, PageFetcher};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;

/// Reason recorded for addresses whose fetch never started
pub const CANCELLED_BEFORE_START: &str = "cancelled before fetch started";

/// The scraping capability the batch orchestrator depends on
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Fetches every address and returns one outcome per address
    ///
    /// Outcomes arrive in completion order, not input order.
    async fn scrape(&self, addresses: Vec<Address>, cancel: CancellationToken)
        -> Vec<FetchOutcome>;
}

/// Fans a batch of addresses out to concurrent fetch tasks
pub struct Coordinator {
    fetcher: Arc<PageFetcher>,

    /// Global semaphore for limiting concurrent fetches
    gate: Arc<Semaphore>,
}

impl Coordinator {
    /// Creates a new coordinator
    ///
    /// # Arguments
    ///
    /// * `fetcher` - The page fetcher shared by every task
    /// * `max_concurrent_fetches` - Upper bound on simultaneous fetches,
    ///   shared across all batches run through this coordinator
    pub fn new(fetcher: PageFetcher, max_concurrent_fetches: usize) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            gate: Arc::new(Semaphore::new(max_concurrent_fetches.max(1))),
        }
    }

    /// Number of fetch slots currently free
    pub fn available_slots(&self) -> usize {
        self.gate.available_permits()
    }
}

#[async_trait]
impl Scraper for Coordinator {
    /// Runs the fan-out
    ///
    /// # Cancellation
    ///
    /// Fetches already in flight abort at their next network await and record
    /// a failed outcome. Tasks still waiting for a fetch slot record
    /// [`CANCELLED_BEFORE_START`]. Outcomes that already completed are kept, so
    /// the returned list always has one entry per input address.
    async fn scrape(
        &self,
        addresses: Vec<Address>,
        cancel: CancellationToken,
    ) -> Vec<FetchOutcome> {
        let total = addresses.len();
        tracing::info!("Scraping {} addresses", total);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut dispatched = Vec::with_capacity(total);

        for address in addresses {
            let fetcher = Arc::clone(&self.fetcher);
            let gate = Arc::clone(&self.gate);
            let cancel = cancel.clone();
            let tx = tx.clone();
            let pending = address.clone();

            let handle = tokio::spawn(async move {
                let permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    permit = gate.acquire_owned() => permit.ok(),
                };

                let outcome = match permit {
                    Some(_permit) => fetcher.fetch(address, &cancel).await,
                    None => FetchOutcome::failed(address, CANCELLED_BEFORE_START),
                };

                // The receiver only goes away if the caller stopped listening
                let _ = tx.send(outcome);
            });

            dispatched.push((pending, handle));
        }

        // The supervisor owns the last sender, so the queue closes only after
        // every fetch task has been joined
        let supervisor = tokio::spawn(async move {
            for (address, handle) in dispatched {
                if let Err(e) = handle.await {
                    tracing::error!("Fetch task for {} failed: {}", address, e);
                    let _ = tx.send(FetchOutcome::failed(
                        address,
                        format!("fetch task failed: {}", e),
                    ));
                }
            }
        });

        let mut outcomes = Vec::with_capacity(total);
        while let Some(outcome) = rx.recv().await {
            outcomes.push(outcome);
        }

        if let Err(e) = supervisor.await {
            tracing::error!("Scrape supervisor failed: {}", e);
        }

        let succeeded = outcomes.iter().filter(|o| o.success).count();
        tracing::info!(
            "Scraped {} addresses: {} succeeded, {} failed",
            outcomes.len(),
            succeeded,
            outcomes.len() - succeeded
        );

        outcomes
    }
}
