//! Crawler module for page fetching and link counting
//!
//! This module contains the core scraping logic, including:
//! - HTTP fetching with every failure captured as data
//! - HTML link classification into internal and external
//! - Bounded concurrent fan-out over a batch of addresses

mod classifier;
mod coordinator;
mod fetcher;

pub use classifier::{count_links, count_links_in_html, ClassifyError, LinkCounts};
pub use coordinator::{Coordinator, Scraper, CANCELLED_BEFORE_START};
pub use fetcher::{
    build_http_client, FetchError, FetchOutcome, HttpClient, PageFetcher, PageResponse,
    ReqwestClient,
};

use crate::config::Config;
use std::sync::Arc;

/// Builds a coordinator backed by a real HTTP client
///
/// # Arguments
///
/// * `config` - The service configuration
///
/// # Returns
///
/// * `Ok(Coordinator)` - Coordinator sized by `scraper.max-concurrent-fetches`
/// * `Err(reqwest::Error)` - The HTTP client could not be built
pub fn build_coordinator(config: &Config) -> Result<Coordinator, reqwest::Error> {
    let client = build_http_client(&config.scraper, &config.user_agent)?;
    let fetcher = PageFetcher::new(Arc::new(client));
    Ok(Coordinator::new(
        fetcher,
        config.scraper.max_concurrent_fetches as usize,
    ))
}
