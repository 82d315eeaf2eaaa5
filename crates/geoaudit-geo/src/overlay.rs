//! Self-intersection overlay
//!
//! Every ordered pair of features whose geometries share something of the
//! layer's own dimension yields one output feature: polygons must share
//! area, lines must share a stretch of line, points must coincide. A
//! feature always pairs with itself.

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{
    BooleanOps, Coord, Geometry, Line, LineString, MultiLineString, MultiPoint, MultiPolygon, Point,
};
use geoaudit_core::models::{Feature, FieldDef, GeometryFamily, Layer};
use rstar::RTreeObject;

use crate::index::{segment_envelope, segment_tree, IndexedGeometry, SpatialIndex};

/// Suffix given to the second operand's fields
pub const SECOND_OPERAND_SUFFIX: &str = "_2";

/// Intersect `layer` with itself
pub fn self_intersection(layer: &Layer) -> Layer {
    let mut out = layer.empty_like();
    out.fields.extend(
        layer
            .fields
            .iter()
            .map(|f| FieldDef::new(format!("{}{}", f.name, SECOND_OPERAND_SUFFIX), f.kind)),
    );

    let geometries: Vec<(usize, &Geometry<f64>)> = layer
        .features
        .iter()
        .enumerate()
        .filter_map(|(i, f)| f.geometry.as_ref().map(|g| (i, g)))
        .collect();
    let index = SpatialIndex::from_geometries(geometries.iter().copied());

    let mut pairs: Vec<(usize, usize, Geometry<f64>)> = Vec::new();
    for &(i, a) in &geometries {
        let Some(entry) = IndexedGeometry::new(i, a) else {
            continue;
        };
        for j in index.query_envelope(&entry.envelope()) {
            if j < i {
                continue;
            }
            let Some(b) = layer.features[j].geometry.as_ref() else {
                continue;
            };
            let shared = if i == j { Some(a.clone()) } else { intersect(a, b) };
            if let Some(shared) = shared {
                if i != j {
                    pairs.push((j, i, shared.clone()));
                }
                pairs.push((i, j, shared));
            }
        }
    }
    pairs.sort_by_key(|(i, j, _)| (*i, *j));

    for (i, j, geometry) in pairs {
        let mut attributes = layer.features[i].attributes.clone();
        attributes.extend(layer.features[j].attributes.iter().cloned());
        let id = out.features.len() as u64;
        out.features.push(Feature::new(id, Some(geometry), attributes));
    }

    tracing::debug!(
        "Self-intersection of {} produced {} features",
        layer.name,
        out.feature_count()
    );
    out
}

/// Shared part of two geometries of the same family, `None` when they
/// share nothing of that dimension
pub fn intersect(a: &Geometry<f64>, b: &Geometry<f64>) -> Option<Geometry<f64>> {
    let family = GeometryFamily::of(a)?;
    if GeometryFamily::of(b)? != family {
        return None;
    }

    match family {
        GeometryFamily::Polygon => {
            let shared = polygons_of(a).intersection(&polygons_of(b));
            let mut parts = shared.0;
            match parts.len() {
                0 => None,
                1 => Some(Geometry::Polygon(parts.remove(0))),
                _ => Some(Geometry::MultiPolygon(MultiPolygon::new(parts))),
            }
        }
        GeometryFamily::Line => shared_lines(a, b),
        GeometryFamily::Point | GeometryFamily::MultiPoint => {
            let others = points_of(b);
            let mut shared: Vec<Point<f64>> =
                points_of(a).into_iter().filter(|p| others.contains(p)).collect();
            shared.dedup();
            match shared.len() {
                0 => None,
                1 => Some(Geometry::Point(shared[0])),
                _ => Some(Geometry::MultiPoint(MultiPoint::new(shared))),
            }
        }
    }
}

fn polygons_of(geometry: &Geometry<f64>) -> MultiPolygon<f64> {
    match geometry {
        Geometry::Polygon(p) => MultiPolygon::new(vec![p.clone()]),
        Geometry::MultiPolygon(mp) => mp.clone(),
        Geometry::Rect(r) => MultiPolygon::new(vec![r.to_polygon()]),
        Geometry::Triangle(t) => MultiPolygon::new(vec![t.to_polygon()]),
        _ => MultiPolygon::new(vec![]),
    }
}

fn points_of(geometry: &Geometry<f64>) -> Vec<Point<f64>> {
    match geometry {
        Geometry::Point(p) => vec![*p],
        Geometry::MultiPoint(mp) => mp.0.clone(),
        _ => Vec::new(),
    }
}

fn line_parts(geometry: &Geometry<f64>) -> Vec<Vec<Coord<f64>>> {
    match geometry {
        Geometry::Line(l) => vec![vec![l.start, l.end]],
        Geometry::LineString(ls) => vec![ls.0.clone()],
        Geometry::MultiLineString(mls) => mls.iter().map(|ls| ls.0.clone()).collect(),
        _ => Vec::new(),
    }
}

/// Collinear overlaps between the segments of two linear geometries
fn shared_lines(a: &Geometry<f64>, b: &Geometry<f64>) -> Option<Geometry<f64>> {
    let tree = segment_tree(&line_parts(b));
    let mut pieces: Vec<Line<f64>> = Vec::new();

    for part in line_parts(a) {
        for pair in part.windows(2) {
            let segment = Line::new(pair[0], pair[1]);
            for other in tree.locate_in_envelope_intersecting(&segment_envelope(&segment)) {
                if let Some(LineIntersection::Collinear { intersection }) =
                    line_intersection(segment, other.line)
                {
                    if intersection.start != intersection.end && !pieces.contains(&intersection) {
                        pieces.push(intersection);
                    }
                }
            }
        }
    }

    match pieces.len() {
        0 => None,
        1 => Some(Geometry::LineString(LineString::new(vec![pieces[0].start, pieces[0].end]))),
        _ => Some(Geometry::MultiLineString(MultiLineString::new(
            pieces.into_iter().map(|l| LineString::new(vec![l.start, l.end])).collect(),
        ))),
    }
}
