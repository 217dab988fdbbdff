//! Point-in-polygon resolution over decoded features.

use geo::coordinate_position::{CoordPos, CoordinatePosition};
use geo::Coord;

use crate::coord::Coordinate;
use crate::geobuf::{Shape, TzFeature};

impl Shape {
    /// Whether the shape covers `coord`.
    ///
    /// Points on a ring count as covered; points inside a hole do not.
    pub fn covers(&self, coord: &Coord<f64>) -> bool {
        match self {
            // Per member: a multipolygon counts a shared edge as outside
            Shape::Area(area) => area
                .0
                .iter()
                .any(|polygon| polygon.coordinate_position(coord) != CoordPos::Outside),
            Shape::Collection(members) => members.iter().any(|m| m.covers(coord)),
            Shape::NonAreal => false,
        }
    }
}

/// `tzid` of every feature covering `point`, in feature order.
///
/// Features without a `tzid` are skipped. Overlapping features all match.
pub fn timezones_containing(features: &[TzFeature], point: &Coordinate) -> Vec<String> {
    let coord = Coord {
        x: point.lon,
        y: point.lat,
    };

    features
        .iter()
        .filter_map(|feature| {
            let tzid = feature.tzid.as_ref()?;
            feature.shape.covers(&coord).then(|| tzid.clone())
        })
        .collect()
}
