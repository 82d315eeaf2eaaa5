//! Measures and decomposition of `geo` geometries.

use geo::{Distance, Euclidean, Geometry, LineString, Point, Polygon};

/// Number of parts of a geometry. Single geometries count as one part,
/// collections count their members.
pub fn part_count(geometry: &Geometry<f64>) -> usize {
    match geometry {
        Geometry::MultiPoint(mp) => mp.0.len(),
        Geometry::MultiLineString(mls) => mls.0.len(),
        Geometry::MultiPolygon(mp) => mp.0.len(),
        Geometry::GeometryCollection(gc) => gc.0.iter().map(part_count).sum(),
        _ => 1,
    }
}

/// Planar length of a linestring
pub fn line_length(line: &LineString<f64>) -> f64 {
    line.lines()
        .map(|segment| Euclidean.distance(Point::from(segment.start), Point::from(segment.end)))
        .sum()
}

/// Perimeter of a polygon, holes included
pub fn perimeter(polygon: &Polygon<f64>) -> f64 {
    line_length(polygon.exterior()) + polygon.interiors().iter().map(line_length).sum::<f64>()
}

/// Linear length of a geometry: line length for linear geometries,
/// perimeter for polygons. Points have no length.
pub fn geometry_length(geometry: &Geometry<f64>) -> Option<f64> {
    match geometry {
        Geometry::Point(_) | Geometry::MultiPoint(_) => None,
        Geometry::Line(l) => Some(Euclidean.distance(Point::from(l.start), Point::from(l.end))),
        Geometry::LineString(ls) => Some(line_length(ls)),
        Geometry::MultiLineString(mls) => Some(mls.iter().map(line_length).sum()),
        Geometry::Polygon(p) => Some(perimeter(p)),
        Geometry::MultiPolygon(mp) => Some(mp.iter().map(perimeter).sum()),
        Geometry::Rect(r) => Some(perimeter(&r.to_polygon())),
        Geometry::Triangle(t) => Some(perimeter(&t.to_polygon())),
        Geometry::GeometryCollection(gc) => {
            let lengths: Vec<f64> = gc.iter().filter_map(geometry_length).collect();
            (!lengths.is_empty()).then(|| lengths.iter().sum())
        }
    }
}

/// Split a geometry into its single parts
pub fn explode(geometry: &Geometry<f64>) -> Vec<Geometry<f64>> {
    match geometry {
        Geometry::MultiPoint(mp) => mp.iter().map(|p| Geometry::Point(*p)).collect(),
        Geometry::MultiLineString(mls) => {
            mls.iter().map(|ls| Geometry::LineString(ls.clone())).collect()
        }
        Geometry::MultiPolygon(mp) => mp.iter().map(|p| Geometry::Polygon(p.clone())).collect(),
        Geometry::GeometryCollection(gc) => gc.iter().flat_map(explode).collect(),
        other => vec![other.clone()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, GeometryCollection, MultiPoint, MultiPolygon};

    fn unit_square() -> Polygon<f64> {
        polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)]
    }

    #[test]
    fn test_part_count() {
        let mp = MultiPolygon::new(vec![unit_square(), unit_square()]);
        assert_eq!(part_count(&Geometry::MultiPolygon(mp)), 2);
        assert_eq!(part_count(&Geometry::Polygon(unit_square())), 1);
        let gc = GeometryCollection::new_from(vec![
            Geometry::Point(Point::new(0.0, 0.0)),
            Geometry::MultiPoint(MultiPoint::new(vec![Point::new(1.0, 1.0), Point::new(2.0, 2.0)])),
        ]);
        assert_eq!(part_count(&Geometry::GeometryCollection(gc)), 3);
    }

    #[test]
    fn test_geometry_length() {
        let line = LineString::from(vec![(0.0, 0.0), (3.0, 4.0)]);
        assert_eq!(geometry_length(&Geometry::LineString(line)), Some(5.0));
        assert_eq!(geometry_length(&Geometry::Polygon(unit_square())), Some(4.0));
        assert_eq!(geometry_length(&Geometry::Point(Point::new(1.0, 1.0))), None);
    }

    #[test]
    fn test_explode() {
        let mp = MultiPolygon::new(vec![unit_square(), unit_square()]);
        let parts = explode(&Geometry::MultiPolygon(mp));
        assert_eq!(parts.len(), 2);
        assert!(parts.iter().all(|p| matches!(p, Geometry::Polygon(_))));

        let single = explode(&Geometry::Point(Point::new(1.0, 2.0)));
        assert_eq!(single, vec![Geometry::Point(Point::new(1.0, 2.0))]);
    }
}
