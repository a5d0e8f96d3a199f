//! Configuration module for Linkscope
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use linkscope::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("linkscope.toml")).unwrap();
//! println!("Fetching at most {} pages at once", config.scraper.max_concurrent_fetches);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, ScraperConfig, ServerConfig, StorageBackend, StorageConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
