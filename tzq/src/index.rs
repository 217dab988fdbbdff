//! The quadtree index document.
//!
//! The document is JSON of the form:
//!
//! ```json
//! {
//!   "lookup": { "a": { "pos": 0, "len": 812 }, "b": [4, 7], "c": { ... } },
//!   "timezones": ["America/Los_Angeles", "..."]
//! }
//! ```
//!
//! Nodes are parsed once into [`QuadNode`] and the whole tree is validated
//! before the first lookup, so descent never has to guess what a node is.

use std::fmt;
use std::io::Read;

use flate2::read::GzDecoder;
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TzError};
use crate::quadtree::{Quadrant, MAX_INDEX_DEPTH};

/// A slice of the geometry store, `len` bytes starting at `pos`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryRange {
    pub pos: u64,
    pub len: u64,
}

impl GeometryRange {
    /// Last byte of the range (inclusive).
    pub fn end(&self) -> u64 {
        self.pos + self.len - 1
    }
}

/// A node of the quadtree index.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum QuadNode {
    /// Four children indexed by [`Quadrant::index`].
    Inner(Box<[QuadNode; 4]>),
    /// Polygons for this quadrant live in the geometry store.
    Geometry(GeometryRange),
    /// The quadrant maps exactly to these timezone table entries.
    Ids(Vec<usize>),
    /// No timezone is assigned in this quadrant.
    #[default]
    Empty,
}

/// Compression applied to a stored index document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Plain JSON
    #[default]
    None,
    /// Gzip compressed JSON (.gz)
    Gzip,
}

impl Compression {
    /// Detect compression from a URL or file name.
    pub fn from_location(location: &str) -> Self {
        if location.to_lowercase().ends_with(".gz") {
            Compression::Gzip
        } else {
            Compression::None
        }
    }
}

/// The quadtree root together with its timezone table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDocument {
    /// Root of the quadtree.
    pub lookup: QuadNode,
    /// Timezone ids referenced by [`QuadNode::Ids`] leaves.
    pub timezones: Vec<String>,
}

/// Shape of an index document, as reported by `tzq info`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub timezones: usize,
    pub inner_nodes: u64,
    pub geometry_leaves: u64,
    pub id_list_leaves: u64,
    pub empty_nodes: u64,
    pub max_depth: usize,
    /// Sum of the lengths of all geometry leaves.
    pub geometry_bytes: u64,
}

impl IndexDocument {
    /// Create a document from an already built tree.
    pub fn new(lookup: QuadNode, timezones: Vec<String>) -> Self {
        Self { lookup, timezones }
    }

    /// Parse and validate a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`TzError::MalformedIndex`] if the JSON does not follow the
    /// index schema or the tree fails [`validate`](Self::validate).
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let document: IndexDocument = serde_json::from_slice(bytes)
            .map_err(|e| TzError::malformed(format!("invalid index document: {}", e)))?;
        document.validate()?;
        Ok(document)
    }

    /// Parse a possibly compressed JSON document.
    pub fn from_compressed(bytes: &[u8], compression: Compression) -> Result<Self> {
        match compression {
            Compression::None => Self::from_slice(bytes),
            Compression::Gzip => {
                let mut decoder = GzDecoder::new(bytes);
                let mut data = Vec::new();
                decoder.read_to_end(&mut data).map_err(|e| {
                    TzError::malformed(format!("failed to decompress index document: {}", e))
                })?;
                Self::from_slice(&data)
            }
        }
    }

    /// Check that every id-list entry points into the timezone table and
    /// that the tree is no deeper than [`MAX_INDEX_DEPTH`].
    pub fn validate(&self) -> Result<()> {
        let mut stack = vec![(&self.lookup, 0usize)];

        while let Some((node, depth)) = stack.pop() {
            match node {
                QuadNode::Inner(children) => {
                    if depth >= MAX_INDEX_DEPTH {
                        return Err(TzError::malformed(format!(
                            "quadtree deeper than {} levels",
                            MAX_INDEX_DEPTH
                        )));
                    }
                    stack.extend(children.iter().map(|child| (child, depth + 1)));
                }
                QuadNode::Ids(ids) => {
                    if let Some(&bad) = ids.iter().find(|&&id| id >= self.timezones.len()) {
                        return Err(TzError::malformed(format!(
                            "timezone index {} out of range (table has {} entries)",
                            bad,
                            self.timezones.len()
                        )));
                    }
                }
                QuadNode::Geometry(range) => {
                    if range.len == 0 || range.pos.checked_add(range.len).is_none() {
                        return Err(TzError::malformed(format!(
                            "invalid geometry range pos={} len={}",
                            range.pos, range.len
                        )));
                    }
                }
                QuadNode::Empty => {}
            }
        }

        Ok(())
    }

    /// Look up a timezone table entry.
    pub fn timezone(&self, index: usize) -> Option<&str> {
        self.timezones.get(index).map(String::as_str)
    }

    /// Count nodes by kind and measure the tree.
    pub fn stats(&self) -> IndexStats {
        let mut stats = IndexStats {
            timezones: self.timezones.len(),
            ..Default::default()
        };
        let mut stack = vec![(&self.lookup, 0usize)];

        while let Some((node, depth)) = stack.pop() {
            stats.max_depth = stats.max_depth.max(depth);
            match node {
                QuadNode::Inner(children) => {
                    stats.inner_nodes += 1;
                    stack.extend(children.iter().map(|child| (child, depth + 1)));
                }
                QuadNode::Geometry(range) => {
                    stats.geometry_leaves += 1;
                    stats.geometry_bytes += range.len;
                }
                QuadNode::Ids(_) => stats.id_list_leaves += 1,
                QuadNode::Empty => stats.empty_nodes += 1,
            }
        }

        stats
    }
}

impl<'de> Deserialize<'de> for QuadNode {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(NodeVisitor)
    }
}

struct NodeVisitor;

const NODE_KEYS: &[&str] = &["a", "b", "c", "d", "pos", "len"];

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = QuadNode;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a quadtree node (quadrant map, {pos, len} leaf, id list or null)")
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<QuadNode, E> {
        Ok(QuadNode::Empty)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<QuadNode, E> {
        Ok(QuadNode::Empty)
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<QuadNode, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut ids = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(id) = seq.next_element::<usize>()? {
            ids.push(id);
        }

        if ids.is_empty() {
            Ok(QuadNode::Empty)
        } else {
            Ok(QuadNode::Ids(ids))
        }
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<QuadNode, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut children: [QuadNode; 4] = Default::default();
        let mut seen = [false; 4];
        let mut pos: Option<u64> = None;
        let mut len: Option<u64> = None;

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "pos" => pos = Some(map.next_value()?),
                "len" => len = Some(map.next_value()?),
                other => {
                    let quadrant = Quadrant::from_label(other)
                        .ok_or_else(|| de::Error::unknown_field(other, NODE_KEYS))?;
                    if seen[quadrant.index()] {
                        return Err(de::Error::duplicate_field(quadrant.label()));
                    }
                    seen[quadrant.index()] = true;
                    children[quadrant.index()] = map.next_value()?;
                }
            }
        }

        let has_children = seen.iter().any(|&s| s);
        match (pos, len) {
            (None, None) => Ok(QuadNode::Inner(Box::new(children))),
            (Some(pos), Some(len)) if !has_children => {
                if len == 0 {
                    return Err(de::Error::custom("geometry leaf with zero length"));
                }
                Ok(QuadNode::Geometry(GeometryRange { pos, len }))
            }
            (Some(_), Some(_)) => Err(de::Error::custom(
                "node mixes a geometry range with quadrant children",
            )),
            (None, Some(_)) => Err(de::Error::missing_field("pos")),
            (Some(_), None) => Err(de::Error::missing_field("len")),
        }
    }
}

impl Serialize for QuadNode {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            QuadNode::Inner(children) => {
                let present = children
                    .iter()
                    .filter(|c| !matches!(c, QuadNode::Empty))
                    .count();
                let mut map = serializer.serialize_map(Some(present))?;
                for quadrant in Quadrant::ALL {
                    let child = &children[quadrant.index()];
                    if !matches!(child, QuadNode::Empty) {
                        map.serialize_entry(quadrant.label(), child)?;
                    }
                }
                map.end()
            }
            QuadNode::Geometry(range) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("pos", &range.pos)?;
                map.serialize_entry("len", &range.len)?;
                map.end()
            }
            QuadNode::Ids(ids) => {
                let mut seq = serializer.serialize_seq(Some(ids.len()))?;
                for id in ids {
                    seq.serialize_element(id)?;
                }
                seq.end()
            }
            QuadNode::Empty => serializer.serialize_unit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use flate2::write::GzEncoder;

    fn parse(json: &str) -> Result<IndexDocument> {
        IndexDocument::from_slice(json.as_bytes())
    }

    #[test]
    fn test_parse_all_node_kinds() {
        let doc = parse(
            r#"{
                "lookup": {
                    "a": { "pos": 100, "len": 20 },
                    "b": [1, 0],
                    "c": { "d": null, "a": [] },
                    "d": null
                },
                "timezones": ["Etc/UTC", "Europe/London"]
            }"#,
        )
        .unwrap();

        let QuadNode::Inner(children) = &doc.lookup else {
            panic!("Expected inner root");
        };
        assert_eq!(
            children[0],
            QuadNode::Geometry(GeometryRange { pos: 100, len: 20 })
        );
        assert_eq!(children[1], QuadNode::Ids(vec![1, 0]));
        assert_eq!(
            children[2],
            QuadNode::Inner(Box::new(Default::default()))
        );
        assert_eq!(children[3], QuadNode::Empty);
        assert_eq!(doc.timezone(1), Some("Europe/London"));
        assert_eq!(doc.timezone(2), None);
    }

    #[test]
    fn test_absent_children_are_empty() {
        let doc = parse(r#"{"lookup": {"b": [0]}, "timezones": ["Etc/UTC"]}"#).unwrap();
        let QuadNode::Inner(children) = &doc.lookup else {
            panic!("Expected inner root");
        };
        assert_eq!(children[0], QuadNode::Empty);
        assert_eq!(children[2], QuadNode::Empty);
        assert_eq!(children[3], QuadNode::Empty);
    }

    #[test]
    fn test_rejects_unexpected_nodes() {
        for lookup in [
            r#""a""#,
            r#"{"a": 5}"#,
            r#"{"a": true}"#,
            r#"{"e": [0]}"#,
            r#"{"pos": 3}"#,
            r#"{"pos": 3, "len": 0}"#,
            r#"{"pos": 3, "len": 4, "a": [0]}"#,
            r#"{"a": [-1]}"#,
            r#"{"a": ["Etc/UTC"]}"#,
        ] {
            let json = format!(r#"{{"lookup": {}, "timezones": ["Etc/UTC"]}}"#, lookup);
            assert!(
                matches!(parse(&json), Err(TzError::MalformedIndex { .. })),
                "{} should be rejected",
                lookup
            );
        }
    }

    #[test]
    fn test_rejects_out_of_range_ids() {
        let result = parse(r#"{"lookup": {"a": [0, 2]}, "timezones": ["A", "B"]}"#);
        match result {
            Err(TzError::MalformedIndex { reason }) => assert!(reason.contains('2')),
            other => panic!("Expected MalformedIndex, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_missing_table() {
        assert!(matches!(
            parse(r#"{"lookup": {}}"#),
            Err(TzError::MalformedIndex { .. })
        ));
        assert!(matches!(
            parse("not json"),
            Err(TzError::MalformedIndex { .. })
        ));
    }

    #[test]
    fn test_serialize_round_trip() {
        let json = r#"{"lookup":{"a":{"pos":5,"len":9},"c":{"d":[0,1]}},"timezones":["A","B"]}"#;
        let doc = parse(json).unwrap();
        assert_eq!(serde_json::to_string(&doc).unwrap(), json);
    }

    #[test]
    fn test_gzip_document() {
        let json = br#"{"lookup": {"a": [0]}, "timezones": ["Asia/Tokyo"]}"#;
        let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(json).unwrap();
        let compressed = encoder.finish().unwrap();

        let doc = IndexDocument::from_compressed(&compressed, Compression::Gzip).unwrap();
        assert_eq!(doc.timezones, vec!["Asia/Tokyo"]);

        // Plain bytes are not valid gzip
        assert!(IndexDocument::from_compressed(json, Compression::Gzip).is_err());
    }

    #[test]
    fn test_compression_from_location() {
        assert_eq!(
            Compression::from_location("timezones.json"),
            Compression::None
        );
        assert_eq!(
            Compression::from_location("https://example.com/index.JSON.GZ"),
            Compression::Gzip
        );
    }

    #[test]
    fn test_stats() {
        let doc = parse(
            r#"{
                "lookup": {
                    "a": { "pos": 0, "len": 20 },
                    "b": { "a": { "pos": 20, "len": 30 }, "b": [0] }
                },
                "timezones": ["Etc/UTC"]
            }"#,
        )
        .unwrap();

        let stats = doc.stats();
        assert_eq!(stats.timezones, 1);
        assert_eq!(stats.inner_nodes, 2);
        assert_eq!(stats.geometry_leaves, 2);
        assert_eq!(stats.id_list_leaves, 1);
        assert_eq!(stats.empty_nodes, 4);
        assert_eq!(stats.max_depth, 2);
        assert_eq!(stats.geometry_bytes, 50);
    }

    #[test]
    fn test_geometry_range_end() {
        let range = GeometryRange { pos: 10, len: 5 };
        assert_eq!(range.end(), 14);
    }
}
