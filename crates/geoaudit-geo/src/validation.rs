//! Geometry validity tests
//!
//! Rules: coordinates are finite; lines have two distinct vertices; polygon
//! rings are closed with at least four coordinates and do not self-intersect;
//! rings of one polygon may touch at a point but not cross or share an edge;
//! parts of a multipolygon do not overlap.

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Area, BooleanOps, BoundingRect, Coord, Geometry, LineString, MultiPolygon, Polygon};

use rstar::RTreeObject;

use crate::index::segment_tree;

/// Overlap area below which multipolygon parts count as touching
const AREA_EPSILON: f64 = 1e-12;

/// Validation result with details
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Validation error with location details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub location: String,
    pub reason: String,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        Self { is_valid: true, errors: Vec::new() }
    }

    /// Add an error to the result
    pub fn add_error(&mut self, location: impl Into<String>, reason: impl Into<String>) {
        self.is_valid = false;
        self.errors.push(ValidationError { location: location.into(), reason: reason.into() });
    }

    /// Fold the errors of `other` into this result under `prefix`
    fn absorb(&mut self, prefix: &str, other: ValidationResult) {
        for error in other.errors {
            self.add_error(format!("{}.{}", prefix, error.location), error.reason);
        }
    }

    /// First reason, for log lines
    pub fn first_reason(&self) -> Option<&str> {
        self.errors.first().map(|e| e.reason.as_str())
    }
}

/// Whether a geometry passes every validity rule
pub fn is_valid(geometry: &Geometry<f64>) -> bool {
    validate_geometry(geometry).is_valid
}

/// Validate a geometry
pub fn validate_geometry(geometry: &Geometry<f64>) -> ValidationResult {
    match geometry {
        Geometry::Point(p) => validate_coords("Point", std::iter::once(p.0)),
        Geometry::MultiPoint(mp) => validate_coords("MultiPoint", mp.iter().map(|p| p.0)),
        Geometry::Line(l) => validate_linestring(&LineString::new(vec![l.start, l.end])),
        Geometry::LineString(ls) => validate_linestring(ls),
        Geometry::MultiLineString(mls) => {
            let mut result = ValidationResult::valid();
            for (i, ls) in mls.iter().enumerate() {
                result.absorb(&format!("MultiLineString[{}]", i), validate_linestring(ls));
            }
            result
        }
        Geometry::Polygon(p) => validate_polygon(p),
        Geometry::MultiPolygon(mp) => validate_multipolygon(mp),
        Geometry::Rect(r) => validate_polygon(&r.to_polygon()),
        Geometry::Triangle(t) => validate_polygon(&t.to_polygon()),
        Geometry::GeometryCollection(gc) => {
            let mut result = ValidationResult::valid();
            for (i, g) in gc.iter().enumerate() {
                result.absorb(&format!("GeometryCollection[{}]", i), validate_geometry(g));
            }
            result
        }
    }
}

fn validate_coords(location: &str, coords: impl Iterator<Item = Coord<f64>>) -> ValidationResult {
    let mut result = ValidationResult::valid();
    for (i, c) in coords.enumerate() {
        if !c.x.is_finite() || !c.y.is_finite() {
            result.add_error(format!("{}[{}]", location, i), "Coordinates must be finite");
        }
    }
    result
}

fn validate_linestring(linestring: &LineString<f64>) -> ValidationResult {
    let mut result = validate_coords("LineString", linestring.coords().copied());
    if !result.is_valid {
        return result;
    }

    let distinct = dedup_consecutive(&linestring.0).len();
    if distinct < 2 {
        result.add_error(
            "LineString",
            format!("LineString must have at least 2 distinct points, found {}", distinct),
        );
    }
    result
}

/// Drop consecutive repeated coordinates
pub(crate) fn dedup_consecutive(coords: &[Coord<f64>]) -> Vec<Coord<f64>> {
    let mut out: Vec<Coord<f64>> = Vec::with_capacity(coords.len());
    for c in coords {
        if out.last() != Some(c) {
            out.push(*c);
        }
    }
    out
}

fn validate_ring(location: &str, ring: &LineString<f64>, result: &mut ValidationResult) -> bool {
    let before = result.errors.len();

    let coords = validate_coords(location, ring.coords().copied());
    if !coords.is_valid {
        result.errors.extend(coords.errors);
        result.is_valid = false;
        return false;
    }

    if let (Some(first), Some(last)) = (ring.0.first(), ring.0.last()) {
        if first != last {
            result.add_error(location, "Ring must be closed (first point == last point)");
        }
    }

    let distinct = dedup_consecutive(&ring.0).len();
    if distinct < 4 {
        result.add_error(
            location,
            format!("Ring must have at least 4 points, found {}", distinct),
        );
    }

    result.errors.len() == before
}

fn validate_polygon(polygon: &Polygon<f64>) -> ValidationResult {
    let mut result = ValidationResult::valid();

    let mut rings_ok = validate_ring("Polygon exterior", polygon.exterior(), &mut result);
    for (i, interior) in polygon.interiors().iter().enumerate() {
        rings_ok &= validate_ring(&format!("Polygon interior[{}]", i), interior, &mut result);
    }
    if !rings_ok {
        return result;
    }

    let rings: Vec<Vec<Coord<f64>>> = std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(|ring| dedup_consecutive(&ring.0))
        .collect();
    check_ring_intersections(&rings, &mut result);

    result
}

fn ring_name(ring: usize) -> String {
    if ring == 0 {
        "Polygon exterior".to_string()
    } else {
        format!("Polygon interior[{}]", ring - 1)
    }
}

/// Segment-pair tests across all rings of one polygon. Rings are closed and
/// free of consecutive duplicates.
fn check_ring_intersections(rings: &[Vec<Coord<f64>>], result: &mut ValidationResult) {
    let tree = segment_tree(rings);

    for a in tree.iter() {
        let segments_in_ring = rings[a.part].len() - 1;
        for b in tree.locate_in_envelope_intersecting(&a.envelope()) {
            if (b.part, b.position) <= (a.part, a.position) {
                continue;
            }
            let Some(hit) = line_intersection(a.line, b.line) else {
                continue;
            };

            if a.part == b.part {
                let adjacent = b.position == a.position + 1
                    || (a.position == 0 && b.position == segments_in_ring - 1);
                let bad = match hit {
                    LineIntersection::Collinear { intersection } => intersection.start != intersection.end,
                    LineIntersection::SinglePoint { .. } => !adjacent,
                };
                if bad {
                    result.add_error(
                        format!("{}[{}]", ring_name(a.part), b.position),
                        format!(
                            "Ring self-intersection between segments {} and {}",
                            a.position, b.position
                        ),
                    );
                    return;
                }
            } else {
                let bad = match hit {
                    LineIntersection::Collinear { intersection } => intersection.start != intersection.end,
                    LineIntersection::SinglePoint { is_proper, .. } => is_proper,
                };
                if bad {
                    result.add_error(
                        ring_name(b.part),
                        format!("Ring crosses {}", ring_name(a.part).to_lowercase()),
                    );
                    return;
                }
            }
        }
    }
}

fn validate_multipolygon(multipolygon: &MultiPolygon<f64>) -> ValidationResult {
    let mut result = ValidationResult::valid();

    for (i, polygon) in multipolygon.0.iter().enumerate() {
        result.absorb(&format!("MultiPolygon[{}]", i), validate_polygon(polygon));
    }
    if !result.is_valid {
        return result;
    }

    let polygons = &multipolygon.0;
    for i in 0..polygons.len() {
        for j in (i + 1)..polygons.len() {
            if !bounds_overlap(&polygons[i], &polygons[j]) {
                continue;
            }
            let shared = polygons[i].intersection(&polygons[j]).unsigned_area();
            if shared > AREA_EPSILON {
                result.add_error(
                    format!("MultiPolygon[{}]", j),
                    format!("Overlaps MultiPolygon[{}] (area {})", i, shared),
                );
            }
        }
    }

    result
}

fn bounds_overlap(a: &Polygon<f64>, b: &Polygon<f64>) -> bool {
    match (a.bounding_rect(), b.bounding_rect()) {
        (Some(ra), Some(rb)) => {
            ra.min().x <= rb.max().x
                && ra.max().x >= rb.min().x
                && ra.min().y <= rb.max().y
                && ra.max().y >= rb.min().y
        }
        _ => false,
    }
}
