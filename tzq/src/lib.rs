//! # tzq - Timezone lookup by coordinate
//!
//! Resolves a latitude/longitude to the IANA timezone ids in force there,
//! using two pre-built data files:
//!
//! - an **index document**: JSON quadtree over the globe whose leaves are
//!   either timezone id lists or byte ranges of the geometry store;
//! - a **geometry store**: concatenated geobuf feature collections holding
//!   the timezone polygons for the leaves that need them.
//!
//! Only the index is fetched up front (once, on first lookup). Geometry is
//! fetched a slice at a time, so both files can live behind plain HTTP with
//! range requests.
//!
//! ## Quick Start
//!
//! ```ignore
//! use tzq::TzFinderBuilder;
//!
//! let finder = TzFinderBuilder::new("/data/timezones.json", "/data/timezones.geo.dat")
//!     .build()?;
//!
//! let zones = finder.find(35.68, 139.69).await?;
//! assert_eq!(zones, vec!["Asia/Tokyo"]);
//! ```
//!
//! Points at sea resolve to `Etc/GMT±N` bands 15° wide. A point on a band
//! edge belongs to both bands, and the north pole belongs to all of them.
//!
//! ## Custom sources
//!
//! Anything implementing [`IndexSource`] and [`GeometrySource`] can feed a
//! [`TzFinder`]; [`index_fn`] and [`geometry_fn`] adapt async closures.
//!
//! ## Features
//!
//! - `http`: fetch data files over HTTP with reqwest
//! - `geojson`: look up the positions of GeoJSON geometries

pub mod containment;
pub mod coord;
pub mod error;
pub mod file;
pub mod finder;
pub mod geobuf;
pub mod index;
pub mod location;
pub mod ocean;
pub mod offset;
pub mod quadtree;
pub mod source;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "geojson")]
pub mod geojson;

#[cfg(test)]
mod fixtures;

// Re-export main types at crate root for convenience
pub use error::{Result, TzError};
pub use file::{FileGeometrySource, FileIndexSource};
pub use finder::{LocationFinder, LookupStats, TzFinder, TzFinderBuilder};
pub use index::{GeometryRange, IndexDocument, IndexStats, QuadNode};
pub use location::{GeometryLocation, HttpConfig, IndexLocation};
pub use offset::{offset_at, to_offset};
pub use source::{
    geometry_fn, index_fn, GeometryFn, GeometrySource, IndexFn, IndexSource, MemoryGeometry,
    StaticIndex,
};

#[cfg(feature = "http")]
pub use http::{HttpGeometrySource, HttpIndexSource};
