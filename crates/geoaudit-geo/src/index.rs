//! R-tree indexes over feature envelopes and line segments
//!
//! Candidate pairs for the overlay and the ring validity checks come from these
//! trees; exact predicates run only on the hits.

use geo::{BoundingRect, Geometry, Line};
use rstar::{RTree, RTreeObject, AABB};

/// Feature envelope keyed by the feature's position in its layer
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedGeometry {
    /// Position of the feature in the layer
    pub index: usize,

    /// Bounding box for spatial indexing
    envelope: AABB<[f64; 2]>,
}

impl IndexedGeometry {
    /// Index entry for a geometry, `None` when it has no extent
    pub fn new(index: usize, geometry: &Geometry<f64>) -> Option<Self> {
        let rect = geometry.bounding_rect()?;
        let (min, max) = (rect.min(), rect.max());
        Some(Self { index, envelope: AABB::from_corners([min.x, min.y], [max.x, max.y]) })
    }
}

impl RTreeObject for IndexedGeometry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Spatial index over the geometries of one layer
pub struct SpatialIndex {
    tree: RTree<IndexedGeometry>,
}

impl SpatialIndex {
    /// Build an index from `(position, geometry)` pairs. Geometries without
    /// an extent are left out.
    pub fn from_geometries<'a>(geometries: impl Iterator<Item = (usize, &'a Geometry<f64>)>) -> Self {
        let indexed: Vec<IndexedGeometry> =
            geometries.filter_map(|(index, geometry)| IndexedGeometry::new(index, geometry)).collect();

        Self { tree: RTree::bulk_load(indexed) }
    }

    /// Positions of geometries whose envelope intersects `envelope`
    pub fn query_envelope(&self, envelope: &AABB<[f64; 2]>) -> Vec<usize> {
        let mut hits: Vec<usize> =
            self.tree.locate_in_envelope_intersecting(envelope).map(|g| g.index).collect();
        hits.sort_unstable();
        hits
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

/// A segment of a ring or line, keyed by its part and position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedSegment {
    pub part: usize,
    pub position: usize,
    pub line: Line<f64>,
}

impl RTreeObject for IndexedSegment {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        segment_envelope(&self.line)
    }
}

/// Query box covering a segment
pub fn segment_envelope(line: &Line<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners([line.start.x, line.start.y], [line.end.x, line.end.y])
}

/// Build a segment tree from parts given as coordinate sequences
pub fn segment_tree(parts: &[Vec<geo::Coord<f64>>]) -> RTree<IndexedSegment> {
    let segments: Vec<IndexedSegment> = parts
        .iter()
        .enumerate()
        .flat_map(|(part, coords)| {
            coords.windows(2).enumerate().map(move |(position, pair)| IndexedSegment {
                part,
                position,
                line: Line::new(pair[0], pair[1]),
            })
        })
        .collect();
    RTree::bulk_load(segments)
}
