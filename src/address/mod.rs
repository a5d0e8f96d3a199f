//! Address handling module for Linkscope
//!
//! This module provides the validated `Address` type accepted by the scraper
//! and parsing of newline-delimited address lists.

mod ingest;

pub use ingest::gather_addresses;

use crate::{AddressError, AddressResult};
use std::fmt;
use url::Url;

/// A validated absolute URL with a non-empty scheme and host
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(Url);

impl Address {
    /// Parses a single address
    ///
    /// Errors are reported against line 1, so callers validating multi-line
    /// input should use [`gather_addresses`] instead.
    ///
    /// # Example
    ///
    /// ```
    /// use linkscope::Address;
    ///
    /// let address = Address::parse("https://example.com/docs").unwrap();
    /// assert_eq!(address.host(), "example.com");
    /// assert!(Address::parse("example.com").is_err());
    /// ```
    pub fn parse(value: &str) -> AddressResult<Self> {
        parse_line(value, 1)
    }

    /// Wraps an already parsed URL, returning `None` when it has no host
    pub fn from_url(url: Url) -> Option<Self> {
        match url.host_str() {
            Some(host) if !host.is_empty() && !url.scheme().is_empty() => Some(Self(url)),
            _ => None,
        }
    }

    /// The underlying URL
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// The hostname, without any port
    pub fn host(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

pub(crate) fn parse_line(value: &str, line: usize) -> AddressResult<Address> {
    let url = Url::parse(value).map_err(|source| AddressError::Parse { line, source })?;

    // Url::parse accepts hostless absolute URLs such as `mailto:` ones
    Address::from_url(url).ok_or_else(|| AddressError::NotAbsolute {
        line,
        value: value.to_string(),
    })
}
