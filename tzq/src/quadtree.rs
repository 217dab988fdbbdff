//! Quadtree descent.
//!
//! Each inner node splits the current box at its midpoint into four
//! quadrants:
//!
//! ```text
//!            midLon
//!      +-------+-------+
//!      |   b   |   a   |
//! midLat-------+-------+
//!      |   c   |   d   |
//!      +-------+-------+
//! ```
//!
//! Points on the midlines belong to the northern / eastern side.

use tracing::trace;

use crate::coord::{Coordinate, MAX_LAT_INDEX, MAX_LON_INDEX, MIN_LAT_INDEX, MIN_LON_INDEX};
use crate::error::{Result, TzError};
use crate::index::{GeometryRange, QuadNode};

/// Deepest level the navigator will descend to before declaring the index corrupt.
pub const MAX_INDEX_DEPTH: usize = 64;

/// One of the four children of an inner node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    /// North-east.
    A,
    /// North-west.
    B,
    /// South-west.
    C,
    /// South-east.
    D,
}

impl Quadrant {
    /// All quadrants in storage order.
    pub const ALL: [Quadrant; 4] = [Quadrant::A, Quadrant::B, Quadrant::C, Quadrant::D];

    /// Position of this quadrant in an inner node's child array.
    pub fn index(self) -> usize {
        match self {
            Quadrant::A => 0,
            Quadrant::B => 1,
            Quadrant::C => 2,
            Quadrant::D => 3,
        }
    }

    /// The index document key for this quadrant.
    pub fn label(self) -> &'static str {
        match self {
            Quadrant::A => "a",
            Quadrant::B => "b",
            Quadrant::C => "c",
            Quadrant::D => "d",
        }
    }

    /// Parse an index document key.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "a" => Some(Quadrant::A),
            "b" => Some(Quadrant::B),
            "c" => Some(Quadrant::C),
            "d" => Some(Quadrant::D),
            _ => None,
        }
    }
}

/// The box covered by the node currently being visited.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
    pub mid_lat: f64,
    pub mid_lon: f64,
}

impl BoundingBox {
    /// The outer extent of the index.
    pub fn world() -> Self {
        Self {
            top: MAX_LAT_INDEX,
            bottom: MIN_LAT_INDEX,
            left: MIN_LON_INDEX,
            right: MAX_LON_INDEX,
            mid_lat: 0.0,
            mid_lon: 0.0,
        }
    }

    /// Pick the quadrant containing (`lat`, `lon`) and shrink the box to it.
    pub fn descend(&mut self, lat: f64, lon: f64) -> Quadrant {
        let quadrant = if lat >= self.mid_lat {
            if lon >= self.mid_lon {
                self.bottom = self.mid_lat;
                self.left = self.mid_lon;
                Quadrant::A
            } else {
                self.bottom = self.mid_lat;
                self.right = self.mid_lon;
                Quadrant::B
            }
        } else if lon < self.mid_lon {
            self.top = self.mid_lat;
            self.right = self.mid_lon;
            Quadrant::C
        } else {
            self.top = self.mid_lat;
            self.left = self.mid_lon;
            Quadrant::D
        };

        self.mid_lat = (self.top + self.bottom) / 2.0;
        self.mid_lon = (self.left + self.right) / 2.0;
        quadrant
    }
}

/// Where descent stopped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Terminal<'a> {
    /// No timezone assigned here; use the ocean fallback.
    Empty,
    /// Candidate polygons live in this slice of the geometry store.
    Geometry(GeometryRange),
    /// Exact answer as indices into the timezone table.
    Ids(&'a [usize]),
}

/// Walk from `root` towards `point` until a non-inner node is reached.
///
/// Returns the terminal node together with the depth it was found at.
///
/// # Errors
///
/// Returns [`TzError::MalformedIndex`] if no terminal node is found within
/// [`MAX_INDEX_DEPTH`] levels.
pub fn descend<'a>(root: &'a QuadNode, point: &Coordinate) -> Result<(Terminal<'a>, usize)> {
    let mut bbox = BoundingBox::world();
    let mut node = root;

    for depth in 0..=MAX_INDEX_DEPTH {
        match node {
            QuadNode::Inner(children) => {
                let quadrant = bbox.descend(point.lat, point.lon);
                trace!(depth, quadrant = quadrant.label(), "Descending quadtree");
                node = &children[quadrant.index()];
            }
            QuadNode::Geometry(range) => return Ok((Terminal::Geometry(*range), depth)),
            QuadNode::Ids(ids) => return Ok((Terminal::Ids(ids), depth)),
            QuadNode::Empty => return Ok((Terminal::Empty, depth)),
        }
    }

    Err(TzError::malformed(format!(
        "quadtree deeper than {} levels",
        MAX_INDEX_DEPTH
    )))
}
