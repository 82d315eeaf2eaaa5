//! Split, repair and vertex clean-up of layers

use geo::{
    Area, BooleanOps, Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint,
    MultiPolygon, Polygon,
};
use geoaudit_core::models::{Feature, Layer};

use crate::models::explode;
use crate::validation::{dedup_consecutive, validate_geometry};

/// One feature per part; attributes are copied to every part. Features
/// without geometry pass through.
pub fn split_layer(layer: &Layer) -> Layer {
    let mut out = layer.empty_like();
    for feature in &layer.features {
        match &feature.geometry {
            Some(geometry) => {
                for part in explode(geometry) {
                    let id = out.features.len() as u64;
                    out.features.push(Feature::new(id, Some(part), feature.attributes.clone()));
                }
            }
            None => {
                let id = out.features.len() as u64;
                out.features.push(Feature::new(id, None, feature.attributes.clone()));
            }
        }
    }
    out
}

/// Repair every geometry, dropping features that cannot be repaired
pub fn fix_layer(layer: &Layer) -> Layer {
    let mut out = layer.empty_like();
    let mut dropped = 0usize;

    for feature in &layer.features {
        let geometry = match &feature.geometry {
            Some(geometry) => match fix_geometry(geometry) {
                Some(fixed) => Some(fixed),
                None => {
                    tracing::debug!(
                        "Dropping feature {} of {}: geometry cannot be repaired",
                        feature.id,
                        layer.name
                    );
                    dropped += 1;
                    continue;
                }
            },
            None => None,
        };
        let id = out.features.len() as u64;
        out.features.push(Feature::new(id, geometry, feature.attributes.clone()));
    }

    if dropped > 0 {
        tracing::debug!("Dropped {} unrepairable features from {}", dropped, layer.name);
    }
    out
}

fn finite(c: &Coord<f64>) -> bool {
    c.x.is_finite() && c.y.is_finite()
}

fn clean_coords(coords: &[Coord<f64>]) -> Vec<Coord<f64>> {
    let kept: Vec<Coord<f64>> = coords.iter().copied().filter(finite).collect();
    dedup_consecutive(&kept)
}

fn fix_line(line: &LineString<f64>) -> Option<LineString<f64>> {
    let coords = clean_coords(&line.0);
    (coords.len() >= 2).then(|| LineString::new(coords))
}

fn clean_ring(ring: &LineString<f64>) -> Option<LineString<f64>> {
    let mut coords = clean_coords(&ring.0);
    if let (Some(first), Some(last)) = (coords.first().copied(), coords.last().copied()) {
        if first != last {
            coords.push(first);
        }
    }
    (coords.len() >= 4).then(|| LineString::new(coords))
}

fn clean_polygon(polygon: &Polygon<f64>) -> Option<Polygon<f64>> {
    let exterior = clean_ring(polygon.exterior())?;
    let interiors = polygon.interiors().iter().filter_map(clean_ring).collect();
    Some(Polygon::new(exterior, interiors))
}

/// Rebuild polygons through a union, which resolves self-intersections
/// and overlapping parts into a valid multipolygon
fn rebuild_polygons(polygons: Vec<Polygon<f64>>) -> Option<Geometry<f64>> {
    let merged = polygons
        .into_iter()
        .fold(MultiPolygon::new(vec![]), |acc, p| acc.union(&MultiPolygon::new(vec![p])));

    let mut parts: Vec<Polygon<f64>> =
        merged.0.into_iter().filter(|p| p.unsigned_area() > 0.0).collect();
    match parts.len() {
        0 => None,
        1 => Some(Geometry::Polygon(parts.remove(0))),
        _ => Some(Geometry::MultiPolygon(MultiPolygon::new(parts))),
    }
}

/// Repair one geometry. Valid geometries are returned unchanged; `None`
/// means nothing usable is left.
pub fn fix_geometry(geometry: &Geometry<f64>) -> Option<Geometry<f64>> {
    if validate_geometry(geometry).is_valid {
        return Some(geometry.clone());
    }

    match geometry {
        Geometry::Point(p) => finite(&p.0).then_some(Geometry::Point(*p)),
        Geometry::MultiPoint(mp) => {
            let points: Vec<_> = mp.iter().copied().filter(|p| finite(&p.0)).collect();
            (!points.is_empty()).then(|| Geometry::MultiPoint(MultiPoint::new(points)))
        }
        Geometry::Line(l) => fix_line(&LineString::new(vec![l.start, l.end])).map(Geometry::LineString),
        Geometry::LineString(ls) => fix_line(ls).map(Geometry::LineString),
        Geometry::MultiLineString(mls) => {
            let lines: Vec<_> = mls.iter().filter_map(fix_line).collect();
            match lines.len() {
                0 => None,
                _ => Some(Geometry::MultiLineString(MultiLineString::new(lines))),
            }
        }
        Geometry::Polygon(p) => rebuild_polygons(clean_polygon(p).into_iter().collect()),
        Geometry::MultiPolygon(mp) => rebuild_polygons(mp.iter().filter_map(clean_polygon).collect()),
        Geometry::Rect(r) => Some(Geometry::Polygon(r.to_polygon())),
        Geometry::Triangle(t) => rebuild_polygons(vec![t.to_polygon()]),
        Geometry::GeometryCollection(gc) => {
            let parts: Vec<Geometry<f64>> = gc.iter().filter_map(fix_geometry).collect();
            match parts.len() {
                0 => None,
                _ => Some(Geometry::GeometryCollection(GeometryCollection::new_from(parts))),
            }
        }
    }
}

/// Drop consecutive vertices within `tolerance` of the last kept one
pub fn remove_duplicate_vertices(geometry: &Geometry<f64>, tolerance: f64) -> Geometry<f64> {
    match geometry {
        Geometry::LineString(ls) => Geometry::LineString(dedup_line(ls, tolerance)),
        Geometry::MultiLineString(mls) => Geometry::MultiLineString(MultiLineString::new(
            mls.iter().map(|ls| dedup_line(ls, tolerance)).collect(),
        )),
        Geometry::Polygon(p) => Geometry::Polygon(dedup_polygon(p, tolerance)),
        Geometry::MultiPolygon(mp) => Geometry::MultiPolygon(MultiPolygon::new(
            mp.iter().map(|p| dedup_polygon(p, tolerance)).collect(),
        )),
        Geometry::GeometryCollection(gc) => Geometry::GeometryCollection(GeometryCollection::new_from(
            gc.iter().map(|g| remove_duplicate_vertices(g, tolerance)).collect(),
        )),
        other => other.clone(),
    }
}

fn within(a: &Coord<f64>, b: &Coord<f64>, tolerance: f64) -> bool {
    let (dx, dy) = (a.x - b.x, a.y - b.y);
    dx * dx + dy * dy <= tolerance * tolerance
}

fn thin_coords(coords: &[Coord<f64>], tolerance: f64) -> Vec<Coord<f64>> {
    let mut out: Vec<Coord<f64>> = Vec::with_capacity(coords.len());
    for c in coords {
        match out.last() {
            Some(last) if within(last, c, tolerance) => {}
            _ => out.push(*c),
        }
    }
    out
}

fn dedup_line(line: &LineString<f64>, tolerance: f64) -> LineString<f64> {
    let mut coords = thin_coords(&line.0, tolerance);
    // Keep the true end point of the line
    if let (Some(end), Some(kept)) = (line.0.last(), coords.last_mut()) {
        *kept = *end;
    }
    if coords.len() < 2 || (coords.first() == coords.last() && line.0.first() != line.0.last()) {
        return line.clone();
    }
    LineString::new(coords)
}

fn dedup_ring(ring: &LineString<f64>, tolerance: f64) -> LineString<f64> {
    let open = &ring.0[..ring.0.len().saturating_sub(1)];
    let mut coords = thin_coords(open, tolerance);
    while coords.len() > 1 && coords.last().is_some_and(|last| within(last, &coords[0], tolerance)) {
        coords.pop();
    }
    if coords.len() < 3 {
        return ring.clone();
    }
    coords.push(coords[0]);
    LineString::new(coords)
}

fn dedup_polygon(polygon: &Polygon<f64>, tolerance: f64) -> Polygon<f64> {
    Polygon::new(
        dedup_ring(polygon.exterior(), tolerance),
        polygon.interiors().iter().map(|r| dedup_ring(r, tolerance)).collect(),
    )
}

/// Apply [`remove_duplicate_vertices`] to every feature of a layer
pub fn dedup_layer(layer: &Layer, tolerance: f64) -> Layer {
    let mut out = layer.clone();
    for feature in &mut out.features {
        if let Some(geometry) = &feature.geometry {
            feature.geometry = Some(remove_duplicate_vertices(geometry, tolerance));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::is_valid;
    use geo::{polygon, Point};
    use geoaudit_core::models::{AttributeValue, FieldDef};

    fn layer_of(geometries: Vec<Option<Geometry<f64>>>) -> Layer {
        let mut layer = Layer::new("test");
        layer.fields.push(FieldDef::text("NAME"));
        for (i, geometry) in geometries.into_iter().enumerate() {
            layer.features.push(Feature::new(
                i as u64,
                geometry,
                vec![AttributeValue::Text(format!("f{}", i))],
            ));
        }
        layer
    }

    #[test]
    fn test_split_copies_attributes() {
        let mp = MultiPoint::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
        let layer = layer_of(vec![Some(Geometry::MultiPoint(mp)), None]);

        let split = split_layer(&layer);
        assert_eq!(split.feature_count(), 3);
        assert_eq!(split.features[0].attributes, split.features[1].attributes);
        assert!(split.features[2].geometry.is_none());
        assert_eq!(split.features.iter().map(|f| f.id).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_fix_bowtie() {
        let bowtie = polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 2.0), (x: 2.0, y: 0.0), (x: 0.0, y: 2.0)];
        let fixed = fix_geometry(&Geometry::Polygon(bowtie)).unwrap();

        assert!(is_valid(&fixed));
        assert!((fixed.unsigned_area() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_fix_drops_collapsed_polygon() {
        let collapsed = Polygon::new(LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (0.0, 0.0)]), vec![]);
        let layer = layer_of(vec![
            Some(Geometry::Polygon(collapsed)),
            Some(Geometry::Point(Point::new(1.0, 1.0))),
        ]);

        let fixed = fix_layer(&layer);
        assert_eq!(fixed.feature_count(), 1);
        assert_eq!(fixed.features[0].attributes[0], AttributeValue::Text("f1".to_string()));
    }

    #[test]
    fn test_valid_geometry_unchanged() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        let geometry = Geometry::Polygon(square);
        assert_eq!(fix_geometry(&geometry), Some(geometry));
    }

    #[test]
    fn test_remove_duplicate_vertices_line() {
        let line = LineString::from(vec![(0.0, 0.0), (0.0, 1e-9), (1.0, 0.0), (2.0, 0.0)]);
        let cleaned = remove_duplicate_vertices(&Geometry::LineString(line), 1e-6);
        match cleaned {
            Geometry::LineString(ls) => assert_eq!(ls.0.len(), 3),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_remove_duplicate_vertices_ring_stays_closed() {
        let ring = LineString::from(vec![
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 1e-9),
            (1.0, 1.0),
            (0.0, 1.0),
            (1e-9, 1e-9),
            (0.0, 0.0),
        ]);
        let cleaned = remove_duplicate_vertices(&Geometry::Polygon(Polygon::new(ring, vec![])), 1e-6);
        match cleaned {
            Geometry::Polygon(p) => {
                assert_eq!(p.exterior().0.len(), 5);
                assert!(p.exterior().is_closed());
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
