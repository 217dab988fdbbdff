//! Geobuf decoding.
//!
//! Geometry slices are [geobuf](https://github.com/mapbox/geobuf) messages:
//! a compact protobuf encoding of GeoJSON. Coordinates are stored as
//! zig-zag varint deltas scaled by `10^precision`, deltas restart at every
//! ring, and rings are stored without their closing point.

use geo::{Coord, LineString, MultiPolygon, Polygon};
use prost::Message;

/// Default number of coordinate dimensions.
const DEFAULT_DIMENSIONS: u32 = 2;
/// Default number of decimal digits kept per coordinate.
const DEFAULT_PRECISION: u32 = 6;
/// Highest precision that still fits an `f64` scale factor sensibly.
const MAX_PRECISION: u32 = 15;

#[derive(Clone, PartialEq, Message)]
pub struct Data {
    #[prost(string, repeated, tag = "1")]
    pub keys: Vec<String>,
    #[prost(uint32, optional, tag = "2")]
    pub dimensions: Option<u32>,
    #[prost(uint32, optional, tag = "3")]
    pub precision: Option<u32>,
    #[prost(oneof = "DataType", tags = "4, 5, 6")]
    pub data_type: Option<DataType>,
}

#[derive(Clone, PartialEq, prost::Oneof)]
pub enum DataType {
    #[prost(message, tag = "4")]
    FeatureCollection(FeatureCollection),
    #[prost(message, tag = "5")]
    Feature(Feature),
    #[prost(message, tag = "6")]
    Geometry(Geometry),
}

#[derive(Clone, PartialEq, Message)]
pub struct FeatureCollection {
    #[prost(message, repeated, tag = "1")]
    pub features: Vec<Feature>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Feature {
    #[prost(message, optional, tag = "1")]
    pub geometry: Option<Geometry>,
    #[prost(message, repeated, tag = "13")]
    pub values: Vec<Value>,
    /// Pairs of (key index, value index).
    #[prost(uint32, repeated, tag = "14")]
    pub properties: Vec<u32>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Geometry {
    #[prost(enumeration = "GeometryType", optional, tag = "1")]
    pub r#type: Option<i32>,
    #[prost(uint32, repeated, tag = "2")]
    pub lengths: Vec<u32>,
    #[prost(sint64, repeated, tag = "3")]
    pub coords: Vec<i64>,
    #[prost(message, repeated, tag = "4")]
    pub geometries: Vec<Geometry>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, prost::Enumeration)]
#[repr(i32)]
pub enum GeometryType {
    Point = 0,
    MultiPoint = 1,
    LineString = 2,
    MultiLineString = 3,
    Polygon = 4,
    MultiPolygon = 5,
    GeometryCollection = 6,
}

#[derive(Clone, PartialEq, Message)]
pub struct Value {
    #[prost(oneof = "ValueType", tags = "1, 2, 3, 4, 5, 6")]
    pub value_type: Option<ValueType>,
}

#[derive(Clone, PartialEq, prost::Oneof)]
pub enum ValueType {
    #[prost(string, tag = "1")]
    StringValue(String),
    #[prost(double, tag = "2")]
    DoubleValue(f64),
    #[prost(uint64, tag = "3")]
    PosIntValue(u64),
    #[prost(uint64, tag = "4")]
    NegIntValue(u64),
    #[prost(bool, tag = "5")]
    BoolValue(bool),
    #[prost(string, tag = "6")]
    JsonValue(String),
}

/// Areal shape of a decoded feature.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Polygons (a `Polygon` is a one-element multipolygon).
    Area(MultiPolygon<f64>),
    /// Members of a `GeometryCollection`.
    Collection(Vec<Shape>),
    /// Points and lines; they never contain anything.
    NonAreal,
}

/// A decoded feature: its `tzid` property and its shape.
#[derive(Debug, Clone, PartialEq)]
pub struct TzFeature {
    pub tzid: Option<String>,
    pub shape: Shape,
}

/// Decode a geometry slice into features, in encoded order.
///
/// Accepts a `Feature` or a `FeatureCollection`. A bare geometry carries no
/// properties and is rejected.
pub fn decode(bytes: &[u8]) -> std::result::Result<Vec<TzFeature>, String> {
    let data = Data::decode(bytes).map_err(|e| format!("invalid geobuf message: {}", e))?;
    let decoder = CoordDecoder::new(&data)?;

    let features = match data.data_type {
        Some(DataType::FeatureCollection(collection)) => collection.features,
        Some(DataType::Feature(feature)) => vec![feature],
        Some(DataType::Geometry(_)) => {
            return Err("expected a feature or feature collection, found a bare geometry".into())
        }
        None => return Err("geobuf message has no content".into()),
    };

    features
        .iter()
        .map(|feature| {
            let shape = match &feature.geometry {
                Some(geometry) => decoder.shape(geometry)?,
                None => Shape::NonAreal,
            };
            Ok(TzFeature {
                tzid: tzid_property(&data.keys, feature),
                shape,
            })
        })
        .collect()
}

/// Find the string-valued `tzid` property of a feature.
fn tzid_property(keys: &[String], feature: &Feature) -> Option<String> {
    feature.properties.chunks_exact(2).find_map(|pair| {
        let key = keys.get(pair[0] as usize)?;
        if key != "tzid" {
            return None;
        }
        match feature.values.get(pair[1] as usize)?.value_type.as_ref()? {
            ValueType::StringValue(s) => Some(s.clone()),
            _ => None,
        }
    })
}

struct CoordDecoder {
    dimensions: usize,
    scale: f64,
}

impl CoordDecoder {
    fn new(data: &Data) -> std::result::Result<Self, String> {
        let dimensions = data.dimensions.unwrap_or(DEFAULT_DIMENSIONS);
        let precision = data.precision.unwrap_or(DEFAULT_PRECISION);
        if dimensions < 2 {
            return Err(format!("unsupported dimension count {}", dimensions));
        }
        if precision > MAX_PRECISION {
            return Err(format!("unsupported precision {}", precision));
        }
        Ok(Self {
            dimensions: dimensions as usize,
            scale: 10f64.powi(precision as i32),
        })
    }

    fn shape(&self, geometry: &Geometry) -> std::result::Result<Shape, String> {
        let kind = geometry
            .r#type
            .and_then(|t| GeometryType::try_from(t).ok())
            .ok_or_else(|| format!("unknown geometry type {:?}", geometry.r#type))?;

        match kind {
            GeometryType::Polygon => Ok(Shape::Area(MultiPolygon::new(vec![
                self.polygon(geometry)?
            ]))),
            GeometryType::MultiPolygon => Ok(Shape::Area(self.multi_polygon(geometry)?)),
            GeometryType::GeometryCollection => geometry
                .geometries
                .iter()
                .map(|g| self.shape(g))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Shape::Collection),
            _ => Ok(Shape::NonAreal),
        }
    }

    fn polygon(&self, geometry: &Geometry) -> std::result::Result<Polygon<f64>, String> {
        let coords = &geometry.coords;
        let mut rings = if geometry.lengths.is_empty() {
            vec![self.ring(coords, 0, coords.len())?]
        } else {
            let mut rings = Vec::with_capacity(geometry.lengths.len());
            let mut end = 0;
            for &len in &geometry.lengths {
                let start = end;
                end = self.ring_end(start, len)?;
                rings.push(self.ring(coords, start, end)?);
            }
            rings
        };

        if rings.is_empty() {
            return Err("polygon without rings".into());
        }
        let exterior = rings.remove(0);
        Ok(Polygon::new(exterior, rings))
    }

    fn multi_polygon(&self, geometry: &Geometry) -> std::result::Result<MultiPolygon<f64>, String> {
        let coords = &geometry.coords;
        let lengths = &geometry.lengths;
        if lengths.is_empty() {
            let ring = self.ring(coords, 0, coords.len())?;
            return Ok(MultiPolygon::new(vec![Polygon::new(ring, vec![])]));
        }

        let truncated = || "multipolygon lengths are truncated".to_string();
        let polygon_count = lengths[0] as usize;
        // Every polygon needs at least a ring count and one ring length
        if polygon_count > (lengths.len() - 1) / 2 {
            return Err(truncated());
        }
        let mut polygons = Vec::with_capacity(polygon_count);
        let mut end = 0;
        let mut j = 1;

        for _ in 0..polygon_count {
            let ring_count = *lengths.get(j).ok_or_else(truncated)? as usize;
            if ring_count == 0 {
                return Err("multipolygon member without rings".into());
            }
            let ring_lengths = lengths
                .get(j + 1..j + 1 + ring_count)
                .ok_or_else(truncated)?;
            let mut rings = Vec::with_capacity(ring_count);
            for &len in ring_lengths {
                let start = end;
                end = self.ring_end(start, len)?;
                rings.push(self.ring(coords, start, end)?);
            }
            j += ring_count + 1;

            let exterior = rings.remove(0);
            polygons.push(Polygon::new(exterior, rings));
        }

        Ok(MultiPolygon::new(polygons))
    }

    /// Index just past a ring of `len` points starting at `start`.
    fn ring_end(&self, start: usize, len: u32) -> std::result::Result<usize, String> {
        (len as usize)
            .checked_mul(self.dimensions)
            .and_then(|n| n.checked_add(start))
            .ok_or_else(|| format!("ring of {} points overflows the coordinate array", len))
    }

    /// Decode `coords[start..end]` as one delta-encoded ring.
    fn ring(
        &self,
        coords: &[i64],
        start: usize,
        end: usize,
    ) -> std::result::Result<LineString<f64>, String> {
        let part = coords.get(start..end).ok_or_else(|| {
            format!(
                "ring spans coordinates {}..{} but only {} are present",
                start,
                end,
                coords.len()
            )
        })?;
        if part.len() % self.dimensions != 0 {
            return Err("coordinate count is not a multiple of the dimension count".into());
        }

        let mut x = 0i64;
        let mut y = 0i64;
        let points: Vec<Coord<f64>> = part
            .chunks_exact(self.dimensions)
            .map(|point| {
                x += point[0];
                y += point[1];
                Coord {
                    x: x as f64 / self.scale,
                    y: y as f64 / self.scale,
                }
            })
            .collect();

        // LineString is closed by Polygon::new
        Ok(LineString::new(points))
    }
}
