//! Snapping a layer onto its own vertices
//!
//! Two passes. Vertices are first aligned: each vertex moves onto the
//! nearest earlier vertex within tolerance, otherwise it becomes an anchor
//! itself. Then every segment receives the anchors of other geometries
//! lying within tolerance of its interior, which closes T-shaped gaps.
//! A geometry that would collapse keeps its original shape.

use geo::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use geoaudit_core::models::Layer;
use rstar::{RTree, AABB};
use std::collections::HashSet;

use crate::validation::dedup_consecutive;

/// Snap every geometry of `layer` to the layer's own vertices
pub fn snap_layer(layer: &Layer, tolerance: f64) -> Layer {
    let mut out = layer.clone();
    if tolerance <= 0.0 {
        return out;
    }

    let mut anchors: RTree<[f64; 2]> = RTree::new();
    let mut kept = 0usize;

    let aligned: Vec<Option<Geometry<f64>>> = layer
        .features
        .iter()
        .map(|feature| {
            let geometry = feature.geometry.as_ref()?;
            let snapped = map_parts(geometry, &mut |coords: &[Coord<f64>]| {
                coords.iter().map(|c| align(&mut anchors, *c, tolerance)).collect()
            });
            if snapped.is_none() {
                kept += 1;
            }
            snapped
        })
        .collect();

    for (feature, aligned) in out.features.iter_mut().zip(aligned) {
        let Some(geometry) = aligned else {
            continue;
        };
        let own: HashSet<(u64, u64)> = coords_of(&geometry).iter().map(coord_key).collect();
        let densified = map_parts(&geometry, &mut |coords: &[Coord<f64>]| {
            insert_nearby_anchors(coords, &anchors, &own, tolerance)
        });
        feature.geometry = densified.or(Some(geometry));
    }

    if kept > 0 {
        tracing::debug!(
            "Kept {} geometries of {} unsnapped: snapping would collapse them",
            kept,
            layer.name
        );
    }
    out
}

fn dist2(a: [f64; 2], b: [f64; 2]) -> f64 {
    let (dx, dy) = (a[0] - b[0], a[1] - b[1]);
    dx * dx + dy * dy
}

/// Move `c` onto the nearest anchor within tolerance, or register it
fn align(anchors: &mut RTree<[f64; 2]>, c: Coord<f64>, tolerance: f64) -> Coord<f64> {
    if !c.x.is_finite() || !c.y.is_finite() {
        return c;
    }
    let p = [c.x, c.y];
    if let Some(anchor) = anchors.nearest_neighbor(&p) {
        if dist2(*anchor, p) <= tolerance * tolerance {
            return Coord { x: anchor[0], y: anchor[1] };
        }
    }
    anchors.insert(p);
    c
}

fn coord_key(c: &Coord<f64>) -> (u64, u64) {
    (c.x.to_bits(), c.y.to_bits())
}

/// Add anchors that lie within tolerance of a segment's interior as new
/// vertices of that segment, in order along it
fn insert_nearby_anchors(
    coords: &[Coord<f64>],
    anchors: &RTree<[f64; 2]>,
    own: &HashSet<(u64, u64)>,
    tolerance: f64,
) -> Vec<Coord<f64>> {
    if coords.len() < 2 {
        return coords.to_vec();
    }

    let tol2 = tolerance * tolerance;
    let mut out = Vec::with_capacity(coords.len());
    for pair in coords.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        out.push(a);

        let envelope = AABB::from_corners(
            [a.x.min(b.x) - tolerance, a.y.min(b.y) - tolerance],
            [a.x.max(b.x) + tolerance, a.y.max(b.y) + tolerance],
        );
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        let len2 = dx * dx + dy * dy;
        if len2 == 0.0 {
            continue;
        }

        let mut inserts: Vec<(f64, Coord<f64>)> = anchors
            .locate_in_envelope(&envelope)
            .map(|p| Coord { x: p[0], y: p[1] })
            .filter(|p| !own.contains(&coord_key(p)))
            .filter_map(|p| {
                let t = ((p.x - a.x) * dx + (p.y - a.y) * dy) / len2;
                if t <= 0.0 || t >= 1.0 {
                    return None;
                }
                let foot = [a.x + t * dx, a.y + t * dy];
                let near_segment = dist2(foot, [p.x, p.y]) <= tol2;
                let near_end = dist2([a.x, a.y], [p.x, p.y]) <= tol2 || dist2([b.x, b.y], [p.x, p.y]) <= tol2;
                (near_segment && !near_end).then_some((t, p))
            })
            .collect();
        inserts.sort_by(|l, r| l.0.total_cmp(&r.0));
        out.extend(inserts.into_iter().map(|(_, p)| p));
    }
    if let Some(last) = coords.last() {
        out.push(*last);
    }
    out
}

fn coords_of(geometry: &Geometry<f64>) -> Vec<Coord<f64>> {
    let mut coords = Vec::new();
    let _ = map_parts(geometry, &mut |part: &[Coord<f64>]| {
        coords.extend_from_slice(part);
        part.to_vec()
    });
    coords
}

fn map_line<F>(line: &LineString<f64>, min_len: usize, f: &mut F) -> Option<LineString<f64>>
where
    F: FnMut(&[Coord<f64>]) -> Vec<Coord<f64>>,
{
    let coords = dedup_consecutive(&f(&line.0));
    (coords.len() >= min_len).then(|| LineString::new(coords))
}

fn map_polygon<F>(polygon: &Polygon<f64>, f: &mut F) -> Option<Polygon<f64>>
where
    F: FnMut(&[Coord<f64>]) -> Vec<Coord<f64>>,
{
    let exterior = map_line(polygon.exterior(), 4, f)?;
    let interiors = polygon
        .interiors()
        .iter()
        .map(|ring| map_line(ring, 4, f))
        .collect::<Option<Vec<_>>>()?;
    Some(Polygon::new(exterior, interiors))
}

fn map_point<F>(point: &Point<f64>, f: &mut F) -> Option<Point<f64>>
where
    F: FnMut(&[Coord<f64>]) -> Vec<Coord<f64>>,
{
    f(&[point.0]).first().map(|c| Point::from(*c))
}

/// Apply `f` to every coordinate sequence (point, line or ring) of a
/// geometry. `None` if a line or ring degenerates.
fn map_parts<F>(geometry: &Geometry<f64>, f: &mut F) -> Option<Geometry<f64>>
where
    F: FnMut(&[Coord<f64>]) -> Vec<Coord<f64>>,
{
    let mapped = match geometry {
        Geometry::Point(p) => Geometry::Point(map_point(p, f)?),
        Geometry::MultiPoint(mp) => Geometry::MultiPoint(MultiPoint::new(
            mp.iter().map(|p| map_point(p, f)).collect::<Option<Vec<_>>>()?,
        )),
        Geometry::Line(l) => {
            Geometry::LineString(map_line(&LineString::new(vec![l.start, l.end]), 2, f)?)
        }
        Geometry::LineString(ls) => Geometry::LineString(map_line(ls, 2, f)?),
        Geometry::MultiLineString(mls) => Geometry::MultiLineString(MultiLineString::new(
            mls.iter().map(|ls| map_line(ls, 2, f)).collect::<Option<Vec<_>>>()?,
        )),
        Geometry::Polygon(p) => Geometry::Polygon(map_polygon(p, f)?),
        Geometry::MultiPolygon(mp) => Geometry::MultiPolygon(MultiPolygon::new(
            mp.iter().map(|p| map_polygon(p, f)).collect::<Option<Vec<_>>>()?,
        )),
        Geometry::Rect(r) => Geometry::Polygon(map_polygon(&r.to_polygon(), f)?),
        Geometry::Triangle(t) => Geometry::Polygon(map_polygon(&t.to_polygon(), f)?),
        Geometry::GeometryCollection(gc) => Geometry::GeometryCollection(GeometryCollection::new_from(
            gc.iter().map(|g| map_parts(g, f)).collect::<Option<Vec<_>>>()?,
        )),
    };
    Some(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use geoaudit_core::models::Feature;

    fn layer_of(geometries: Vec<Geometry<f64>>) -> Layer {
        let mut layer = Layer::new("test");
        for (i, g) in geometries.into_iter().enumerate() {
            layer.features.push(Feature::new(i as u64, Some(g), vec![]));
        }
        layer
    }

    fn coords(layer: &Layer, idx: usize) -> Vec<Coord<f64>> {
        coords_of(layer.features[idx].geometry.as_ref().unwrap())
    }

    #[test]
    fn test_close_vertices_are_aligned() {
        let a = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        let b = polygon![(x: 1.0005, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 1.0), (x: 1.0005, y: 1.0)];
        let snapped = snap_layer(&layer_of(vec![Geometry::Polygon(a), Geometry::Polygon(b)]), 0.001);

        let b_coords = coords(&snapped, 1);
        assert!(b_coords.contains(&Coord { x: 1.0, y: 0.0 }));
        assert!(b_coords.contains(&Coord { x: 1.0, y: 1.0 }));
        assert!(!b_coords.iter().any(|c| c.x == 1.0005));
    }

    #[test]
    fn test_far_vertices_untouched() {
        let a = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        let b = polygon![(x: 1.5, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 1.0), (x: 1.5, y: 1.0)];
        let layer = layer_of(vec![Geometry::Polygon(a), Geometry::Polygon(b)]);
        assert_eq!(snap_layer(&layer, 0.001), layer);
    }

    #[test]
    fn test_anchor_inserted_into_nearby_segment() {
        let line = LineString::from(vec![(0.0, 0.0), (2.0, 0.0)]);
        let stub = LineString::from(vec![(1.0, 0.0005), (1.0, 1.0)]);
        let snapped = snap_layer(
            &layer_of(vec![Geometry::LineString(line), Geometry::LineString(stub)]),
            0.001,
        );

        let line_coords = coords(&snapped, 0);
        assert_eq!(line_coords.len(), 3);
        assert_eq!(line_coords[1], Coord { x: 1.0, y: 0.0005 });
    }

    #[test]
    fn test_collapsing_geometry_kept() {
        let sliver = polygon![(x: 0.0, y: 0.0), (x: 0.0005, y: 0.0), (x: 0.0, y: 0.0005)];
        let layer = layer_of(vec![Geometry::Polygon(sliver)]);
        assert_eq!(snap_layer(&layer, 0.001), layer);
    }

    #[test]
    fn test_zero_tolerance_is_identity() {
        let a = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)];
        let layer = layer_of(vec![Geometry::Polygon(a)]);
        assert_eq!(snap_layer(&layer, 0.0), layer);
    }
}
