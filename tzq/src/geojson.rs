//! GeoJSON timezone annotation.
//!
//! Enable the `geojson` feature to use this module.
//!
//! ```ignore
//! use tzq::geojson::timezones_for_geometry;
//!
//! let line: geojson::Geometry = r#"{
//!     "type": "LineString",
//!     "coordinates": [[-0.12, 51.5], [2.35, 48.85]]
//! }"#.parse()?;
//!
//! for point in timezones_for_geometry(&finder, &line).await? {
//!     println!("{},{} -> {:?}", point.lat, point.lon, point.timezones);
//! }
//! ```

use geojson::{FeatureCollection, Geometry, Value as GeoJsonValue};
use serde::Serialize;

use crate::error::{Result, TzError};
use crate::finder::TzFinder;
use crate::source::{GeometrySource, IndexSource};

/// Property set by [`annotate_features`].
pub const TIMEZONES_PROPERTY: &str = "timezones";

/// Timezones found at one position of a geometry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointTimezones {
    pub lat: f64,
    pub lon: f64,
    pub timezones: Vec<String>,
}

/// Look up every position of `geometry`, in document order.
///
/// Positions are in GeoJSON order `[lon, lat, ...]`. Ring closing positions
/// are looked up like any other.
///
/// # Errors
///
/// Returns [`TzError::InvalidGeometry`] if a position has fewer than two
/// values, or the first error of any lookup.
pub async fn timezones_for_geometry<I, G>(
    finder: &TzFinder<I, G>,
    geometry: &Geometry,
) -> Result<Vec<PointTimezones>>
where
    I: IndexSource + 'static,
    G: GeometrySource,
{
    let mut positions = Vec::new();
    collect_positions(&geometry.value, &mut positions)?;

    let mut results = Vec::with_capacity(positions.len());
    for (lon, lat) in positions {
        let timezones = finder.find(lat, lon).await?;
        results.push(PointTimezones {
            lat,
            lon,
            timezones,
        });
    }
    Ok(results)
}

/// Set a `timezones` property on every `Point` feature.
///
/// Features with any other geometry, or none, are left unchanged.
pub async fn annotate_features<I, G>(
    finder: &TzFinder<I, G>,
    mut collection: FeatureCollection,
) -> Result<FeatureCollection>
where
    I: IndexSource + 'static,
    G: GeometrySource,
{
    for feature in &mut collection.features {
        let Some(GeoJsonValue::Point(position)) = feature.geometry.as_ref().map(|g| &g.value)
        else {
            continue;
        };
        let (lon, lat) = lon_lat(position)?;

        let timezones = finder.find(lat, lon).await?;
        feature.set_property(TIMEZONES_PROPERTY, timezones);
    }
    Ok(collection)
}

fn lon_lat(position: &[f64]) -> Result<(f64, f64)> {
    match position {
        [lon, lat, ..] => Ok((*lon, *lat)),
        _ => Err(TzError::InvalidGeometry {
            reason: format!(
                "position must have at least 2 elements (lon, lat), got {}",
                position.len()
            ),
        }),
    }
}

fn push_all(positions: &[Vec<f64>], out: &mut Vec<(f64, f64)>) -> Result<()> {
    for position in positions {
        out.push(lon_lat(position)?);
    }
    Ok(())
}

fn collect_positions(value: &GeoJsonValue, out: &mut Vec<(f64, f64)>) -> Result<()> {
    match value {
        GeoJsonValue::Point(position) => out.push(lon_lat(position)?),
        GeoJsonValue::MultiPoint(positions) | GeoJsonValue::LineString(positions) => {
            push_all(positions, out)?
        }
        GeoJsonValue::MultiLineString(lines) | GeoJsonValue::Polygon(lines) => {
            for line in lines {
                push_all(line, out)?;
            }
        }
        GeoJsonValue::MultiPolygon(polygons) => {
            for ring in polygons.iter().flatten() {
                push_all(ring, out)?;
            }
        }
        GeoJsonValue::GeometryCollection(geometries) => {
            for geometry in geometries {
                collect_positions(&geometry.value, out)?;
            }
        }
    }
    Ok(())
}
