//! Data sources selected from a location string.
//!
//! `http://` and `https://` locations are fetched over the network (with
//! the `http` feature); anything else is treated as a filesystem path, with
//! an optional `file://` prefix.

use std::path::PathBuf;

use bytes::Bytes;

use crate::error::{Result, TzError};
use crate::file::{FileGeometrySource, FileIndexSource};
use crate::index::IndexDocument;
use crate::source::{GeometrySource, IndexSource};

#[cfg(feature = "http")]
use crate::http::{HttpGeometrySource, HttpIndexSource};

/// Default timeout for HTTP requests in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of retry attempts for transient failures.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Configuration shared by the HTTP sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Number of retry attempts on transient failure.
    pub max_retries: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl HttpConfig {
    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the maximum number of retry attempts.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Parsed form of a location string.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    Url(String),
    Path(PathBuf),
}

impl Location {
    fn parse(location: &str) -> Result<Self> {
        let trimmed = location.trim();
        if trimmed.is_empty() {
            return Err(TzError::Config {
                reason: "empty data location".to_string(),
            });
        }

        let lower = trimmed.to_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Ok(Location::Url(trimmed.to_string()))
        } else {
            let path = trimmed.strip_prefix("file://").unwrap_or(trimmed);
            Ok(Location::Path(PathBuf::from(path)))
        }
    }
}

#[cfg(not(feature = "http"))]
fn http_unavailable(url: &str) -> TzError {
    TzError::Config {
        reason: format!("{} requires the `http` feature", url),
    }
}

/// Index document source chosen by location.
pub enum IndexLocation {
    File(FileIndexSource),
    #[cfg(feature = "http")]
    Http(HttpIndexSource),
}

impl IndexLocation {
    /// Select a source for `location`.
    #[cfg(feature = "http")]
    pub fn open(location: &str, config: &HttpConfig) -> Result<Self> {
        match Location::parse(location)? {
            Location::Url(url) => Ok(IndexLocation::Http(HttpIndexSource::new(url, config)?)),
            Location::Path(path) => Ok(IndexLocation::File(FileIndexSource::new(path))),
        }
    }

    /// Select a source for `location`.
    #[cfg(not(feature = "http"))]
    pub fn open(location: &str, _config: &HttpConfig) -> Result<Self> {
        match Location::parse(location)? {
            Location::Url(url) => Err(http_unavailable(&url)),
            Location::Path(path) => Ok(IndexLocation::File(FileIndexSource::new(path))),
        }
    }

    /// Human-readable description of where the index comes from.
    pub fn describe(&self) -> String {
        match self {
            IndexLocation::File(source) => source.path().display().to_string(),
            #[cfg(feature = "http")]
            IndexLocation::Http(source) => source.url().to_string(),
        }
    }
}

impl IndexSource for IndexLocation {
    async fn fetch_index(&self) -> Result<IndexDocument> {
        match self {
            IndexLocation::File(source) => source.fetch_index().await,
            #[cfg(feature = "http")]
            IndexLocation::Http(source) => source.fetch_index().await,
        }
    }
}

/// Geometry store source chosen by location.
pub enum GeometryLocation {
    File(FileGeometrySource),
    #[cfg(feature = "http")]
    Http(HttpGeometrySource),
}

impl GeometryLocation {
    /// Select a source for `location`. File stores are mapped immediately.
    #[cfg(feature = "http")]
    pub fn open(location: &str, config: &HttpConfig) -> Result<Self> {
        match Location::parse(location)? {
            Location::Url(url) => Ok(GeometryLocation::Http(HttpGeometrySource::new(
                url, config,
            )?)),
            Location::Path(path) => Ok(GeometryLocation::File(FileGeometrySource::open(path)?)),
        }
    }

    /// Select a source for `location`. File stores are mapped immediately.
    #[cfg(not(feature = "http"))]
    pub fn open(location: &str, _config: &HttpConfig) -> Result<Self> {
        match Location::parse(location)? {
            Location::Url(url) => Err(http_unavailable(&url)),
            Location::Path(path) => Ok(GeometryLocation::File(FileGeometrySource::open(path)?)),
        }
    }

    /// Human-readable description of where geometry comes from.
    pub fn describe(&self) -> String {
        match self {
            GeometryLocation::File(source) => source.path().display().to_string(),
            #[cfg(feature = "http")]
            GeometryLocation::Http(source) => source.url().to_string(),
        }
    }
}

impl GeometrySource for GeometryLocation {
    async fn fetch_range(&self, start: u64, end: u64) -> Result<Bytes> {
        match self {
            GeometryLocation::File(source) => source.fetch_range(start, end).await,
            #[cfg(feature = "http")]
            GeometryLocation::Http(source) => source.fetch_range(start, end).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_config_builder() {
        let config = HttpConfig::default().with_timeout(5).with_max_retries(7);
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.max_retries, 7);

        let config = HttpConfig::default();
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_parse_location() {
        assert_eq!(
            Location::parse("https://cdn.example.com/geo.dat").unwrap(),
            Location::Url("https://cdn.example.com/geo.dat".to_string())
        );
        assert_eq!(
            Location::parse("HTTP://example.com/tz.json").unwrap(),
            Location::Url("HTTP://example.com/tz.json".to_string())
        );
        assert_eq!(
            Location::parse("file:///data/geo.dat").unwrap(),
            Location::Path(PathBuf::from("/data/geo.dat"))
        );
        assert_eq!(
            Location::parse(" ./geo.dat ").unwrap(),
            Location::Path(PathBuf::from("./geo.dat"))
        );
        assert!(matches!(
            Location::parse("   "),
            Err(TzError::Config { .. })
        ));
    }
}
