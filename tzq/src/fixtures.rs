//! Synthetic index documents and geometry stores for tests.

use prost::Message;

use crate::geobuf::{
    Data, DataType, Feature, FeatureCollection, Geometry, GeometryType, Value, ValueType,
};
use crate::index::{GeometryRange, IndexDocument, QuadNode};
use crate::quadtree::Quadrant;

const SCALE: f64 = 1e6;

/// A feature to encode: optional `tzid` plus its geometry.
pub struct FixtureFeature {
    tzid: Option<&'static str>,
    geometry: Geometry,
}

impl FixtureFeature {
    pub fn new(tzid: Option<&'static str>, geometry: Geometry) -> Self {
        Self { tzid, geometry }
    }
}

/// Encode a polygon from open rings of `(lon, lat)` pairs.
pub fn polygon(rings: &[&[(f64, f64)]]) -> Geometry {
    let mut lengths = Vec::with_capacity(rings.len());
    let mut coords = Vec::new();

    for ring in rings {
        lengths.push(ring.len() as u32);
        let (mut px, mut py) = (0i64, 0i64);
        for &(lon, lat) in ring.iter() {
            let x = (lon * SCALE).round() as i64;
            let y = (lat * SCALE).round() as i64;
            coords.push(x - px);
            coords.push(y - py);
            px = x;
            py = y;
        }
    }

    Geometry {
        r#type: Some(GeometryType::Polygon as i32),
        lengths,
        coords,
        geometries: vec![],
    }
}

/// Encode features as a geobuf feature collection.
pub fn encode_feature_collection(features: &[FixtureFeature]) -> Vec<u8> {
    let features = features
        .iter()
        .map(|f| match f.tzid {
            Some(tzid) => Feature {
                geometry: Some(f.geometry.clone()),
                values: vec![Value {
                    value_type: Some(ValueType::StringValue(tzid.to_string())),
                }],
                properties: vec![0, 0],
            },
            None => Feature {
                geometry: Some(f.geometry.clone()),
                values: vec![],
                properties: vec![],
            },
        })
        .collect();

    Data {
        keys: vec!["tzid".to_string()],
        dimensions: None,
        precision: None,
        data_type: Some(DataType::FeatureCollection(FeatureCollection { features })),
    }
    .encode_to_vec()
}

/// Appends slices to a byte buffer and hands back their ranges.
#[derive(Default)]
pub struct StoreBuilder {
    bytes: Vec<u8>,
}

impl StoreBuilder {
    pub fn append(&mut self, slice: &[u8]) -> GeometryRange {
        let pos = self.bytes.len() as u64;
        self.bytes.extend_from_slice(slice);
        GeometryRange {
            pos,
            len: slice.len() as u64,
        }
    }

    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

pub fn inner(children: &[(Quadrant, QuadNode)]) -> QuadNode {
    let mut nodes: [QuadNode; 4] = Default::default();
    for (quadrant, node) in children {
        nodes[quadrant.index()] = node.clone();
    }
    QuadNode::Inner(Box::new(nodes))
}

/// A small world:
///
/// - north-east / north-east: `Test/Exact`
/// - north-east / south-east: `Test/Third`, `Test/Second`
/// - north-east / north-west: geometry with `Test/Donut` (lon 40..50,
///   lat 55..65, hole lon 44..46, lat 59..61) and `Test/Overlap`
///   (lon 48..52, lat 55..65)
/// - north-west: geometry with `Test/West` (lon -20..-10, lat 10..20)
/// - everything else: empty
pub fn sample_world() -> (IndexDocument, Vec<u8>) {
    let mut store = StoreBuilder::default();
    store.append(b"header-bytes-that-are-never-decoded");

    let west = store.append(&encode_feature_collection(&[FixtureFeature::new(
        Some("Test/West"),
        polygon(&[&[(-20.0, 10.0), (-10.0, 10.0), (-10.0, 20.0), (-20.0, 20.0)]]),
    )]));

    let donut = store.append(&encode_feature_collection(&[
        FixtureFeature::new(
            Some("Test/Donut"),
            polygon(&[
                &[(40.0, 55.0), (50.0, 55.0), (50.0, 65.0), (40.0, 65.0)],
                &[(44.0, 59.0), (46.0, 59.0), (46.0, 61.0), (44.0, 61.0)],
            ]),
        ),
        FixtureFeature::new(
            Some("Test/Overlap"),
            polygon(&[&[(48.0, 55.0), (52.0, 55.0), (52.0, 65.0), (48.0, 65.0)]]),
        ),
    ]));

    let north_east = inner(&[
        (Quadrant::A, QuadNode::Ids(vec![0])),
        (Quadrant::B, QuadNode::Geometry(donut)),
        (Quadrant::D, QuadNode::Ids(vec![2, 1])),
    ]);

    let lookup = inner(&[
        (Quadrant::A, north_east),
        (Quadrant::B, QuadNode::Geometry(west)),
    ]);

    let index = IndexDocument::new(
        lookup,
        vec![
            "Test/Exact".to_string(),
            "Test/Second".to_string(),
            "Test/Third".to_string(),
        ],
    );

    (index, store.finish())
}
