//! HTTP-backed data sources.
//!
//! This module is only available when the `http` feature is enabled.
//!
//! The index document is fetched whole with a plain `GET`; geometry slices
//! are fetched with `Range: bytes=start-end` requests so only the leaf being
//! resolved crosses the network.

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::RANGE;
use reqwest::{Client, StatusCode};
use tracing::{debug, trace, warn};

use crate::error::{Result, TzError};
use crate::index::{Compression, IndexDocument};
use crate::location::HttpConfig;
use crate::source::{slice_range, GeometrySource, IndexSource};

/// A reqwest client that retries transient failures.
#[derive(Clone)]
struct RetryingClient {
    client: Client,
    max_retries: u32,
}

impl RetryingClient {
    fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("tzq/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(TzError::transport)?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
        })
    }

    /// GET `url`, optionally with a byte range, returning status and body.
    async fn get(&self, url: &str, range: Option<(u64, u64)>) -> Result<(StatusCode, Bytes)> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Brief delay before retry
                tokio::time::sleep(Duration::from_millis(500 * attempt as u64)).await;
            }

            match self.get_once(url, range).await {
                Ok(Attempt::Done(status, body)) => return Ok((status, body)),
                Ok(Attempt::Fatal(err)) => return Err(err),
                Ok(Attempt::Retry(err)) | Err(err) => {
                    warn!(url, attempt, error = %err, "HTTP request failed");
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| TzError::transport(format!("GET {} failed", url))))
    }

    async fn get_once(&self, url: &str, range: Option<(u64, u64)>) -> Result<Attempt> {
        let mut request = self.client.get(url);
        if let Some((start, end)) = range {
            request = request.header(RANGE, format!("bytes={}-{}", start, end));
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) if e.is_connect() || e.is_timeout() => {
                return Ok(Attempt::Retry(TzError::transport(e)))
            }
            Err(e) => return Ok(Attempt::Fatal(TzError::transport(e))),
        };

        let status = response.status();
        debug!(url, status = status.as_u16(), "HTTP response received");

        if status.is_server_error() {
            return Ok(Attempt::Retry(TzError::transport(format!(
                "HTTP {} from {}",
                status, url
            ))));
        }
        if !status.is_success() {
            return Ok(Attempt::Fatal(TzError::transport(format!(
                "HTTP {} from {}",
                status, url
            ))));
        }

        let body = response.bytes().await.map_err(TzError::transport)?;
        trace!(url, bytes = body.len(), "HTTP response body read");
        Ok(Attempt::Done(status, body))
    }
}

enum Attempt {
    Done(StatusCode, Bytes),
    Retry(TzError),
    Fatal(TzError),
}

/// Fetches the index document over HTTP.
#[derive(Clone)]
pub struct HttpIndexSource {
    url: String,
    compression: Compression,
    client: RetryingClient,
}

impl HttpIndexSource {
    /// Compression is detected from the URL extension (`.gz`).
    pub fn new(url: impl Into<String>, config: &HttpConfig) -> Result<Self> {
        let url = url.into();
        let compression = Compression::from_location(&url);
        Ok(Self {
            url,
            compression,
            client: RetryingClient::new(config)?,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl IndexSource for HttpIndexSource {
    async fn fetch_index(&self) -> Result<IndexDocument> {
        let (_, body) = self.client.get(&self.url, None).await?;
        IndexDocument::from_compressed(&body, self.compression)
    }
}

/// Fetches geometry slices over HTTP with range requests.
#[derive(Clone)]
pub struct HttpGeometrySource {
    url: String,
    client: RetryingClient,
}

impl HttpGeometrySource {
    pub fn new(url: impl Into<String>, config: &HttpConfig) -> Result<Self> {
        Ok(Self {
            url: url.into(),
            client: RetryingClient::new(config)?,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl GeometrySource for HttpGeometrySource {
    async fn fetch_range(&self, start: u64, end: u64) -> Result<Bytes> {
        let (status, body) = self.client.get(&self.url, Some((start, end))).await?;

        if status == StatusCode::PARTIAL_CONTENT {
            return Ok(body);
        }

        // The server ignored the Range header and sent the whole store
        debug!(url = %self.url, "Range not honoured, slicing full response");
        slice_range(&body, start, end)
    }
}
