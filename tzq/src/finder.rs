//! Timezone lookup over a quadtree index and a geometry store.
//!
//! ```ignore
//! use tzq::TzFinderBuilder;
//!
//! let finder = TzFinderBuilder::new(
//!     "https://cdn.example.com/timezones.json",
//!     "https://cdn.example.com/timezones.geo.dat",
//! )
//! .timeout_secs(10)
//! .build()?;
//!
//! let zones = finder.find(34.05, -118.24).await?;
//! assert_eq!(zones, vec!["America/Los_Angeles"]);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info, warn};

use crate::containment::timezones_containing;
use crate::coord::{self, Coordinate, Normalized};
use crate::error::{Result, TzError};
use crate::geobuf;
use crate::index::{GeometryRange, IndexDocument};
use crate::location::{GeometryLocation, HttpConfig, IndexLocation};
use crate::ocean;
use crate::quadtree::{self, Terminal};
use crate::source::{GeometrySource, IndexSource};

/// Counters describing how lookups were answered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupStats {
    /// Successful and failed lookups with valid coordinates.
    pub lookups: u64,
    /// Lookups answered by the north pole rule.
    pub north_pole: u64,
    /// Lookups answered directly by an id list leaf.
    pub id_list_hits: u64,
    /// Lookups answered by a containing polygon.
    pub geometry_hits: u64,
    /// Lookups answered by the ocean bands.
    pub ocean_fallbacks: u64,
    /// Geometry slices fetched from the store.
    pub geometry_fetches: u64,
}

#[derive(Default)]
struct Counters {
    lookups: AtomicU64,
    north_pole: AtomicU64,
    id_list_hits: AtomicU64,
    geometry_hits: AtomicU64,
    ocean_fallbacks: AtomicU64,
    geometry_fetches: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// The index load, shared by every lookup waiting on it.
type IndexLoad = Shared<BoxFuture<'static, Result<Arc<IndexDocument>>>>;

/// Resolves coordinates to IANA timezone ids.
///
/// The index document is fetched on first use and shared by every later
/// lookup. Concurrent first lookups wait on a single fetch, and a failed
/// fetch is remembered: every lookup on this finder reports the same error.
/// Dropping a lookup mid-fetch does not restart the fetch; the remaining
/// (or next) waiter carries on with it.
pub struct TzFinder<I, G> {
    index_source: Arc<I>,
    geometry_source: G,
    index: Mutex<Option<IndexLoad>>,
    counters: Counters,
}

/// A finder built from location strings.
pub type LocationFinder = TzFinder<IndexLocation, GeometryLocation>;

impl<I: IndexSource + 'static, G: GeometrySource> TzFinder<I, G> {
    /// Create a finder. Nothing is fetched until the first lookup.
    pub fn new(geometry_source: G, index_source: I) -> Self {
        Self {
            index_source: Arc::new(index_source),
            geometry_source,
            index: Mutex::new(None),
            counters: Counters::default(),
        }
    }

    /// Timezone ids at `lat`/`lon`.
    ///
    /// The result is never empty. Several ids are returned where zones
    /// overlap or a point lies on an ocean band edge.
    ///
    /// # Errors
    ///
    /// - [`TzError::InvalidCoordinate`] for NaN or out-of-range input
    /// - [`TzError::Transport`] if a provider fails
    /// - [`TzError::MalformedIndex`] if the index is corrupt
    /// - [`TzError::Decode`] if a geometry slice cannot be decoded
    pub async fn find(&self, lat: f64, lon: f64) -> Result<Vec<String>> {
        let point = match coord::normalize(lat, lon)? {
            Normalized::NorthPole => {
                bump(&self.counters.lookups);
                bump(&self.counters.north_pole);
                return Ok(ocean::all_zones());
            }
            Normalized::Point(point) => point,
        };
        bump(&self.counters.lookups);

        let index = self.index().await?;
        let (terminal, depth) = quadtree::descend(&index.lookup, &point)?;

        let zones = match terminal {
            Terminal::Ids(ids) => {
                bump(&self.counters.id_list_hits);
                ids.iter()
                    .map(|&id| {
                        index.timezone(id).map(str::to_string).ok_or_else(|| {
                            TzError::malformed(format!("timezone id {} out of range", id))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?
            }
            Terminal::Geometry(range) => {
                let found = self.resolve_geometry(range, &point).await?;
                if found.is_empty() {
                    self.ocean_fallback(&point)?
                } else {
                    bump(&self.counters.geometry_hits);
                    found
                }
            }
            Terminal::Empty => self.ocean_fallback(&point)?,
        };

        debug!(lat, lon, depth, zones = ?zones, "Timezone lookup");
        Ok(zones)
    }

    /// The index document, fetching it if this is the first use.
    pub async fn index(&self) -> Result<Arc<IndexDocument>> {
        let load = {
            let mut slot = self.index.lock().unwrap_or_else(PoisonError::into_inner);
            slot.get_or_insert_with(|| {
                load_index(Arc::clone(&self.index_source))
                    .boxed()
                    .shared()
            })
            .clone()
        };
        load.await
    }

    /// Snapshot of the lookup counters.
    pub fn stats(&self) -> LookupStats {
        let c = &self.counters;
        LookupStats {
            lookups: c.lookups.load(Ordering::Relaxed),
            north_pole: c.north_pole.load(Ordering::Relaxed),
            id_list_hits: c.id_list_hits.load(Ordering::Relaxed),
            geometry_hits: c.geometry_hits.load(Ordering::Relaxed),
            ocean_fallbacks: c.ocean_fallbacks.load(Ordering::Relaxed),
            geometry_fetches: c.geometry_fetches.load(Ordering::Relaxed),
        }
    }

    async fn resolve_geometry(
        &self,
        range: GeometryRange,
        point: &Coordinate,
    ) -> Result<Vec<String>> {
        bump(&self.counters.geometry_fetches);
        let bytes = self
            .geometry_source
            .fetch_range(range.pos, range.end())
            .await?;

        let decode_error = |reason: String| TzError::Decode {
            pos: range.pos,
            len: range.len,
            reason,
        };

        if bytes.len() as u64 != range.len {
            return Err(decode_error(format!(
                "expected {} bytes, got {}",
                range.len,
                bytes.len()
            )));
        }

        let features = geobuf::decode(&bytes).map_err(decode_error)?;
        debug!(
            pos = range.pos,
            len = range.len,
            features = features.len(),
            "Decoded geometry slice"
        );
        Ok(timezones_containing(&features, point))
    }

    fn ocean_fallback(&self, point: &Coordinate) -> Result<Vec<String>> {
        bump(&self.counters.ocean_fallbacks);
        let zones = ocean::zones_at(point.original_lon);
        if zones.is_empty() {
            return Err(TzError::UncoveredLongitude {
                lon: point.original_lon,
            });
        }
        Ok(zones)
    }
}

async fn load_index<I: IndexSource>(source: Arc<I>) -> Result<Arc<IndexDocument>> {
    let start = Instant::now();

    let document = match source.fetch_index().await {
        Ok(document) => document,
        Err(e) => {
            warn!(error = %e, "Failed to load timezone index");
            return Err(e);
        }
    };
    document.validate()?;

    info!(
        timezones = document.timezones.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Timezone index loaded"
    );
    Ok(Arc::new(document))
}

/// Builds a [`LocationFinder`] from location strings.
///
/// Locations starting with `http://` or `https://` are fetched over the
/// network (requires the `http` feature); anything else is a file path.
#[derive(Debug, Clone)]
pub struct TzFinderBuilder {
    index_location: String,
    geometry_location: String,
    http: HttpConfig,
}

impl TzFinderBuilder {
    pub fn new(index_location: impl Into<String>, geometry_location: impl Into<String>) -> Self {
        Self {
            index_location: index_location.into(),
            geometry_location: geometry_location.into(),
            http: HttpConfig::default(),
        }
    }

    /// Create a builder from environment variables.
    ///
    /// | Variable | Required | Default |
    /// |----------|----------|---------|
    /// | `TZQ_TZ_DATA` | yes | |
    /// | `TZQ_GEO_DATA` | yes | |
    /// | `TZQ_TIMEOUT_SECS` | no | 30 |
    /// | `TZQ_MAX_RETRIES` | no | 2 |
    ///
    /// # Errors
    ///
    /// Returns [`TzError::Config`] if a required variable is missing.
    pub fn from_env() -> Result<Self> {
        let required = |name: &str| {
            std::env::var(name).map_err(|_| TzError::Config {
                reason: format!("{} environment variable not set", name),
            })
        };

        let index_location = required("TZQ_TZ_DATA")?;
        let geometry_location = required("TZQ_GEO_DATA")?;

        let mut http = HttpConfig::default();
        if let Some(timeout) = std::env::var("TZQ_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            http.timeout_secs = timeout;
        }
        if let Some(retries) = std::env::var("TZQ_MAX_RETRIES")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            http.max_retries = retries;
        }

        Ok(Self {
            index_location,
            geometry_location,
            http,
        })
    }

    /// Set the HTTP request timeout.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.http.timeout_secs = secs;
        self
    }

    /// Set the number of retries for transient HTTP failures.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.http.max_retries = retries;
        self
    }

    pub fn index_location(&self) -> &str {
        &self.index_location
    }

    pub fn geometry_location(&self) -> &str {
        &self.geometry_location
    }

    /// Open both sources and create the finder.
    ///
    /// File geometry stores are mapped here; the index is still fetched
    /// lazily on first lookup.
    pub fn build(self) -> Result<LocationFinder> {
        let geometry = GeometryLocation::open(&self.geometry_location, &self.http)?;
        let index = IndexLocation::open(&self.index_location, &self.http)?;

        info!(
            index = %index.describe(),
            geometry = %geometry.describe(),
            "Timezone finder configured"
        );
        Ok(TzFinder::new(geometry, index))
    }
}
