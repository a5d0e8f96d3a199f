//! HTTP fetcher implementation
//!
//! This module handles the single-page side of a scrape:
//! - Building HTTP clients with proper user agent strings
//! - GET requests to fetch page content
//! - Mapping every failure mode onto a failed `FetchOutcome`

use crate::address::Address;
use crate::config::{ScraperConfig, UserAgentConfig};
use crate::crawler::classifier::{count_links, ClassifyError, LinkCounts};
use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Why a single page could not be counted
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("failed to build request: {0}")]
    Request(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("bad status code")]
    BadStatus(u16),

    #[error("failed to parse page: {0}")]
    Parse(String),

    #[error("page body exceeds {0} bytes")]
    BodyTooLarge(usize),

    #[error("failed to classify links: {0}")]
    Classify(#[from] ClassifyError),
}

/// Status and body of a fetched page
#[derive(Debug, Clone)]
pub struct PageResponse {
    pub status: u16,
    pub body: String,
}

/// The HTTP capability a `PageFetcher` needs
///
/// Implementations must be safe to share between concurrent fetch tasks.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Issues a GET request for `url`
    ///
    /// Bodies of responses with status >= 400 need not be read.
    async fn get(&self, url: &Url) -> Result<PageResponse, FetchError>;
}

/// reqwest-backed `HttpClient` that refuses oversized bodies
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    inner: Client,
    max_body_bytes: usize,
}

impl ReqwestClient {
    pub fn new(inner: Client, max_body_bytes: usize) -> Self {
        Self {
            inner,
            max_body_bytes,
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &Url) -> Result<PageResponse, FetchError> {
        let request = self
            .inner
            .get(url.clone())
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let response = self
            .inner
            .execute(request)
            .await
            .map_err(|e| FetchError::Transport(describe_transport_error(&e)))?;

        let status = response.status().as_u16();
        if status >= 400 {
            return Ok(PageResponse {
                status,
                body: String::new(),
            });
        }

        let body = read_body(response, self.max_body_bytes).await?;
        Ok(PageResponse { status, body })
    }
}

/// Reads the body chunk by chunk, failing once it passes `limit` bytes
async fn read_body(mut response: reqwest::Response, limit: usize) -> Result<String, FetchError> {
    if response.content_length().is_some_and(|len| len > limit as u64) {
        return Err(FetchError::BodyTooLarge(limit));
    }

    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| FetchError::Parse(format!("failed to read body: {}", e)))?
    {
        if body.len() + chunk.len() > limit {
            return Err(FetchError::BodyTooLarge(limit));
        }
        body.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}

fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timeout: {}", e)
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        e.to_string()
    }
}

/// Outcome of fetching and classifying one address
///
/// Exactly one outcome is produced for every address handed to the scraper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub address: Address,
    pub success: bool,
    pub external: u32,
    pub internal: u32,
    pub failure_reason: Option<String>,
}

impl FetchOutcome {
    pub fn succeeded(address: Address, counts: LinkCounts) -> Self {
        Self {
            address,
            success: true,
            external: counts.external,
            internal: counts.internal,
            failure_reason: None,
        }
    }

    /// A failed outcome; failed outcomes never carry link counts
    pub fn failed(address: Address, reason: impl ToString) -> Self {
        Self {
            address,
            success: false,
            external: 0,
            internal: 0,
            failure_reason: Some(reason.to_string()),
        }
    }

    pub fn counts(&self) -> LinkCounts {
        LinkCounts {
            external: self.external,
            internal: self.internal,
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `scraper` - Timeouts and body size limit for every request
/// * `user_agent` - The user agent identification
///
/// # Returns
///
/// * `Ok(ReqwestClient)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    scraper: &ScraperConfig,
    user_agent: &UserAgentConfig,
) -> Result<ReqwestClient, reqwest::Error> {
    let client = Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(scraper.request_timeout_secs))
        .connect_timeout(Duration::from_secs(scraper.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(ReqwestClient::new(client, scraper.max_body_bytes))
}

/// Fetches one page and counts its links
pub struct PageFetcher {
    client: Arc<dyn HttpClient>,
}

impl PageFetcher {
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self { client }
    }

    /// Fetches `address` and classifies the links on it
    ///
    /// # Request Flow
    ///
    /// | Step | Failure | Reason |
    /// |------|---------|--------|
    /// | Build request | construction error | `failed to build request: ...` |
    /// | Send request | transport error or `cancel` fired | `request failed: ...` / `request cancelled` |
    /// | Check status | status >= 400 | `bad status code` |
    /// | Read and parse body | read error | `failed to parse page: ...` |
    /// | | body over `max-body-bytes` | `page body exceeds N bytes` |
    /// | Count links | structural error | `failed to classify links: ...` |
    ///
    /// This never fails: every error above becomes a failed outcome with zero
    /// counts.
    pub async fn fetch(&self, address: Address, cancel: &CancellationToken) -> FetchOutcome {
        tracing::debug!("Fetching {}", address);
        let result = self.try_fetch(&address, cancel).await;
        into_outcome(address, result)
    }

    async fn try_fetch(
        &self,
        address: &Address,
        cancel: &CancellationToken,
    ) -> Result<LinkCounts, FetchError> {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            result = self.client.get(address.as_url()) => result,
        };
        let response = result?;

        if response.status >= 400 {
            return Err(FetchError::BadStatus(response.status));
        }

        classify_body(address.as_url(), &response.body)
    }
}

// Kept synchronous: `Html` must not be held across an await point
fn classify_body(page: &Url, body: &str) -> Result<LinkCounts, FetchError> {
    let document = Html::parse_document(body);
    Ok(count_links(page, &document)?)
}

fn into_outcome(address: Address, result: Result<LinkCounts, FetchError>) -> FetchOutcome {
    match result {
        Ok(counts) => {
            tracing::debug!(
                "Counted {} external and {} internal links on {}",
                counts.external,
                counts.internal,
                address
            );
            FetchOutcome::succeeded(address, counts)
        }
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}", address, e);
            FetchOutcome::failed(address, e)
        }
    }
}
