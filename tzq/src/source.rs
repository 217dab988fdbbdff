//! Data source seams.
//!
//! A [`TzFinder`](crate::TzFinder) needs two providers:
//!
//! - an [`IndexSource`] returning the quadtree index document, called at
//!   most once per finder;
//! - a [`GeometrySource`] returning inclusive byte ranges of the geometry
//!   store, called once per geometry leaf reached.
//!
//! Providers own transport concerns (timeouts, retries). Their failures are
//! surfaced to callers unchanged.

use std::future::Future;
use std::ops::RangeInclusive;
use std::sync::Arc;

use bytes::Bytes;

use crate::error::{Result, TzError};
use crate::index::IndexDocument;

/// Provides the quadtree index document.
pub trait IndexSource: Send + Sync {
    /// Fetch the whole index document.
    fn fetch_index(&self) -> impl Future<Output = Result<IndexDocument>> + Send;
}

/// Provides byte ranges of the geometry store.
pub trait GeometrySource: Send + Sync {
    /// Fetch bytes `start..=end` of the geometry store.
    fn fetch_range(&self, start: u64, end: u64) -> impl Future<Output = Result<Bytes>> + Send;
}

/// An [`IndexSource`] backed by a closure.
#[derive(Clone)]
pub struct IndexFn<F>(F);

/// Wrap a closure returning a future of the index document.
///
/// ```ignore
/// let index = tzq::index_fn(|| async { load_my_index().await });
/// ```
pub fn index_fn<F, Fut>(f: F) -> IndexFn<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<IndexDocument>> + Send,
{
    IndexFn(f)
}

impl<F, Fut> IndexSource for IndexFn<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<IndexDocument>> + Send,
{
    fn fetch_index(&self) -> impl Future<Output = Result<IndexDocument>> + Send {
        (self.0)()
    }
}

/// A [`GeometrySource`] backed by a closure taking `(start, end)`.
#[derive(Clone)]
pub struct GeometryFn<F>(F);

/// Wrap a closure returning a future of the requested bytes.
pub fn geometry_fn<F, Fut>(f: F) -> GeometryFn<F>
where
    F: Fn(u64, u64) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Bytes>> + Send,
{
    GeometryFn(f)
}

impl<F, Fut> GeometrySource for GeometryFn<F>
where
    F: Fn(u64, u64) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Bytes>> + Send,
{
    fn fetch_range(&self, start: u64, end: u64) -> impl Future<Output = Result<Bytes>> + Send {
        (self.0)(start, end)
    }
}

/// An index document already held in memory.
#[derive(Debug, Clone)]
pub struct StaticIndex(Arc<IndexDocument>);

impl StaticIndex {
    pub fn new(document: IndexDocument) -> Self {
        Self(Arc::new(document))
    }
}

impl IndexSource for StaticIndex {
    async fn fetch_index(&self) -> Result<IndexDocument> {
        Ok(self.0.as_ref().clone())
    }
}

/// A geometry store held in memory.
#[derive(Debug, Clone)]
pub struct MemoryGeometry(Bytes);

impl MemoryGeometry {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }
}

impl GeometrySource for MemoryGeometry {
    async fn fetch_range(&self, start: u64, end: u64) -> Result<Bytes> {
        slice_range(&self.0, start, end)
    }
}

/// Validate `start..=end` against a store of `available` bytes.
pub(crate) fn range_bounds(start: u64, end: u64, available: u64) -> Result<RangeInclusive<usize>> {
    if start > end || end >= available {
        return Err(TzError::transport(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!(
                "range {}-{} outside geometry store of {} bytes",
                start, end, available
            ),
        )));
    }
    Ok(start as usize..=end as usize)
}

/// Cut `start..=end` out of a buffer, failing if it is out of bounds.
pub(crate) fn slice_range(bytes: &Bytes, start: u64, end: u64) -> Result<Bytes> {
    let range = range_bounds(start, end, bytes.len() as u64)?;
    Ok(bytes.slice(range))
}
