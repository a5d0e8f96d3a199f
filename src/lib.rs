//! Linkscope: batch link census for web pages
//!
//! This crate fetches a batch of pages concurrently, counts the internal and
//! external hyperlinks on each one, and stores the per-page results under a
//! batch identifier for later retrieval.

pub mod address;
pub mod batch;
pub mod config;
pub mod crawler;
pub mod server;
pub mod storage;

use thiserror::Error;

/// Error of an end-to-end batch submission: raw text in, stored batch out
#[derive(Debug, Error)]
pub enum LinkscopeError {
    #[error("Address error: {0}")]
    Address(#[from] AddressError),

    #[error("Batch error: {0}")]
    Batch(#[from] batch::BatchError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Address validation errors
#[derive(Debug, Error)]
pub enum AddressError {
    #[error("bad url at line {line}: {source}")]
    Parse {
        line: usize,
        source: ::url::ParseError,
    },

    #[error("bad url at line {line} {value}: invalid url")]
    NotAbsolute { line: usize, value: String },
}

impl AddressError {
    /// The 1-based input line the error refers to
    pub fn line(&self) -> usize {
        match self {
            Self::Parse { line, .. } | Self::NotAbsolute { line, .. } => *line,
        }
    }
}

/// Result type alias for Linkscope operations
pub type Result<T> = std::result::Result<T, LinkscopeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for address operations
pub type AddressResult<T> = std::result::Result<T, AddressError>;

// Re-export commonly used types
pub use address::{gather_addresses, Address};
pub use batch::{BatchError, BatchOrchestrator};
pub use config::Config;
pub use crawler::{Coordinator, FetchOutcome, LinkCounts, PageFetcher, Scraper};
pub use storage::{Repository, ResultRecord};

