//! Coordinate validation and clamping.
//!
//! The quadtree index covers a box slightly inside the poles and the
//! antimeridian. Points on those edges are pulled inside the box before
//! descent, while the original longitude is kept for the ocean fallback.

use crate::error::{Result, TzError};

/// Northern edge of the indexed extent.
pub const MAX_LAT_INDEX: f64 = 89.9999;
/// Southern edge of the indexed extent.
pub const MIN_LAT_INDEX: f64 = -89.9999;
/// Eastern edge of the indexed extent.
pub const MAX_LON_INDEX: f64 = 179.9999;
/// Western edge of the indexed extent.
pub const MIN_LON_INDEX: f64 = -179.9999;

/// Nudge applied to the southern and western edges so that clamped points
/// stay strictly inside the lower bounds.
const EDGE_EPSILON: f64 = 1e-9;

/// A validated point ready for quadtree descent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude clamped to `(-89.9999, 89.9999]`.
    pub lat: f64,
    /// Longitude clamped to `[-179.9999, 179.9999]`.
    pub lon: f64,
    /// Longitude as given by the caller, used for ocean banding.
    pub original_lon: f64,
}

/// Outcome of normalizing a caller-supplied point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Normalized {
    /// Exactly the north pole; every ocean zone applies.
    NorthPole,
    /// Any other point, clamped to the indexed extent.
    Point(Coordinate),
}

/// Validate `lat`/`lon` and clamp them to the indexed extent.
///
/// # Errors
///
/// Returns [`TzError::InvalidCoordinate`] if either value is NaN or lies
/// outside `[-90, 90]` / `[-180, 180]`.
pub fn normalize(lat: f64, lon: f64) -> Result<Normalized> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(TzError::InvalidCoordinate { lat, lon });
    }

    if lat == 90.0 {
        return Ok(Normalized::NorthPole);
    }

    let clamped_lat = if lat >= MAX_LAT_INDEX {
        MAX_LAT_INDEX
    } else if lat <= MIN_LAT_INDEX {
        MIN_LAT_INDEX + EDGE_EPSILON
    } else {
        lat
    };

    let clamped_lon = if lon >= MAX_LON_INDEX {
        MAX_LON_INDEX
    } else if lon <= MIN_LON_INDEX {
        MIN_LON_INDEX + EDGE_EPSILON
    } else {
        lon
    };

    Ok(Normalized::Point(Coordinate {
        lat: clamped_lat,
        lon: clamped_lon,
        original_lon: lon,
    }))
}
