//! Shapefile reader and writer
//!
//! Shapefiles consist of multiple component files (.shp, .shx, .dbf, .prj).
//! The reader requires the first three and carries the optional `.prj`
//! through as raw WKT; the writer produces all of them plus a `.cpg` that
//! declares the attribute encoding.

use geo::{Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Polygon};
use shapefile::dbase::{FieldName, FieldType, FieldValue as DbaseFieldValue, Record, TableWriterBuilder};
use shapefile::{PolygonRing, Shape};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AuditError, Result};
use crate::models::{AttributeValue, Feature, FieldDef, FieldKind, GeometryFamily, Layer};

/// Component files a shapefile cannot be read without
pub const REQUIRED_COMPONENTS: [&str; 3] = ["shp", "shx", "dbf"];

/// Extensions written alongside every `.shp`
const SIDECAR_EXTENSIONS: [&str; 4] = ["shx", "dbf", "prj", "cpg"];

/// Check if a path has a specific extension
pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

/// Shapefile format reader
pub struct ShapefileReader;

impl ShapefileReader {
    /// Read a shapefile into a layer named `name`
    pub fn read(&self, path: &Path, name: &str) -> Result<Layer> {
        self.verify_components(path)?;

        let mut reader = shapefile::Reader::from_path(path)
            .map_err(|e| AuditError::shapefile(format!("Failed to open Shapefile: {}", e)))?;

        let mut layer = Layer::new(name);
        layer.crs_wkt = self.read_prj(path)?;
        layer.fields = self.read_schema(path)?;

        for (index, result) in reader.iter_shapes_and_records().enumerate() {
            let (shape, record) = result
                .map_err(|e| AuditError::shapefile(format!("Failed to read feature: {}", e)))?;

            let geometry = convert_shape(&shape)?;
            let mut values: HashMap<String, DbaseFieldValue> = record.into_iter().collect();
            let attributes = layer
                .fields
                .iter()
                .map(|f| {
                    values
                        .remove(&f.name)
                        .map(|v| convert_dbase_value(&v, f.kind))
                        .unwrap_or(AttributeValue::Null)
                })
                .collect();

            layer.features.push(Feature::new(index as u64, geometry, attributes));
        }

        tracing::debug!("Read {} features from {}", layer.feature_count(), path.display());
        Ok(layer)
    }

    /// Verify that all required Shapefile component files exist
    pub fn verify_components(&self, path: &Path) -> Result<()> {
        if !has_extension(path, "shp") {
            return Err(AuditError::shapefile(format!(
                "Not a Shapefile (.shp): {}",
                path.display()
            )));
        }

        let missing: Vec<String> = REQUIRED_COMPONENTS
            .iter()
            .filter(|ext| find_component(path, ext).is_none())
            .map(|ext| format!(".{}", ext))
            .collect();

        if !missing.is_empty() {
            return Err(AuditError::shapefile(format!(
                "Missing required component files: {}",
                missing.join(", ")
            )));
        }

        Ok(())
    }

    /// Columns in header order, typed by their declared dBase type
    fn read_schema(&self, path: &Path) -> Result<Vec<FieldDef>> {
        let dbf = find_component(path, "dbf")
            .ok_or_else(|| AuditError::shapefile("Missing required component files: .dbf"))?;
        let reader = shapefile::dbase::Reader::from_path(&dbf)
            .map_err(|e| AuditError::shapefile(format!("Failed to read attribute table: {}", e)))?;
        let decimals = numeric_decimals(&dbf)?;

        Ok(reader
            .fields()
            .iter()
            .enumerate()
            .map(|(idx, info)| {
                let kind = field_kind(info.field_type(), decimals.get(idx).copied().unwrap_or(0));
                FieldDef::new(info.name(), kind)
            })
            .collect())
    }

    fn read_prj(&self, path: &Path) -> Result<Option<String>> {
        match find_component(path, "prj") {
            Some(prj) => {
                let bytes = fs::read(&prj)?;
                let wkt = String::from_utf8_lossy(&bytes).trim().to_string();
                Ok((!wkt.is_empty()).then_some(wkt))
            }
            None => Ok(None),
        }
    }
}

/// Locate a component file next to `path`, accepting either extension case
fn find_component(path: &Path, ext: &str) -> Option<PathBuf> {
    [ext.to_string(), ext.to_uppercase()]
        .into_iter()
        .map(|e| path.with_extension(e))
        .find(|p| p.exists())
}

fn field_kind(field_type: FieldType, decimals: u8) -> FieldKind {
    match field_type {
        FieldType::Character | FieldType::Memo => FieldKind::Text,
        FieldType::Date | FieldType::DateTime => FieldKind::Date,
        FieldType::Logical => FieldKind::Logical,
        FieldType::Integer => FieldKind::Integer,
        FieldType::Numeric if decimals == 0 => FieldKind::Integer,
        FieldType::Numeric | FieldType::Float | FieldType::Double | FieldType::Currency => {
            FieldKind::Real
        }
    }
}

/// Decimal counts of the field descriptors, in header order. The dbase
/// reader keeps these private, so they come straight from the header bytes:
/// 32-byte descriptors follow the 32-byte table header up to a 0x0D
/// terminator, with the decimal count at offset 17.
fn numeric_decimals(dbf: &Path) -> Result<Vec<u8>> {
    let bytes = fs::read(dbf)?;
    let header_len = match bytes.get(8..10) {
        Some(b) => u16::from_le_bytes([b[0], b[1]]) as usize,
        None => return Err(AuditError::shapefile("Attribute table header is truncated")),
    };
    let header = &bytes[..header_len.min(bytes.len())];

    Ok(header
        .get(32..)
        .unwrap_or(&[])
        .chunks_exact(32)
        .take_while(|descriptor| descriptor[0] != 0x0D)
        .map(|descriptor| descriptor[17])
        .collect())
}

fn coord(x: f64, y: f64) -> Coord<f64> {
    Coord { x, y }
}

fn line_or_multi(parts: Vec<LineString<f64>>) -> Geometry<f64> {
    if parts.len() == 1 {
        Geometry::LineString(parts.into_iter().next().unwrap_or_else(|| LineString::new(vec![])))
    } else {
        Geometry::MultiLineString(MultiLineString::new(parts))
    }
}

/// Group rings into polygons: an outer ring opens a polygon, inner rings
/// attach to the most recent one.
fn polygon_or_multi<P>(rings: &[PolygonRing<P>], xy: impl Fn(&P) -> Coord<f64>) -> Geometry<f64> {
    let mut polygons: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();
    for ring in rings {
        let line: LineString<f64> = ring.points().iter().map(&xy).collect();
        match ring {
            PolygonRing::Inner(_) if !polygons.is_empty() => {
                if let Some((_, interiors)) = polygons.last_mut() {
                    interiors.push(line);
                }
            }
            _ => polygons.push((line, Vec::new())),
        }
    }

    let mut polygons: Vec<Polygon<f64>> =
        polygons.into_iter().map(|(exterior, interiors)| Polygon::new(exterior, interiors)).collect();
    if polygons.len() == 1 {
        Geometry::Polygon(polygons.remove(0))
    } else {
        Geometry::MultiPolygon(MultiPolygon::new(polygons))
    }
}

/// Convert shapefile Shape to a geo geometry; Z and M are dropped
fn convert_shape(shape: &Shape) -> Result<Option<Geometry<f64>>> {
    let geometry = match shape {
        Shape::NullShape => return Ok(None),
        Shape::Point(p) => Geometry::Point(geo::Point::new(p.x, p.y)),
        Shape::PointM(p) => Geometry::Point(geo::Point::new(p.x, p.y)),
        Shape::PointZ(p) => Geometry::Point(geo::Point::new(p.x, p.y)),
        Shape::Multipoint(mp) => Geometry::MultiPoint(MultiPoint::new(
            mp.points().iter().map(|p| geo::Point::new(p.x, p.y)).collect(),
        )),
        Shape::MultipointM(mp) => Geometry::MultiPoint(MultiPoint::new(
            mp.points().iter().map(|p| geo::Point::new(p.x, p.y)).collect(),
        )),
        Shape::MultipointZ(mp) => Geometry::MultiPoint(MultiPoint::new(
            mp.points().iter().map(|p| geo::Point::new(p.x, p.y)).collect(),
        )),
        Shape::Polyline(pl) => line_or_multi(
            pl.parts().iter().map(|part| part.iter().map(|p| coord(p.x, p.y)).collect()).collect(),
        ),
        Shape::PolylineM(pl) => line_or_multi(
            pl.parts().iter().map(|part| part.iter().map(|p| coord(p.x, p.y)).collect()).collect(),
        ),
        Shape::PolylineZ(pl) => line_or_multi(
            pl.parts().iter().map(|part| part.iter().map(|p| coord(p.x, p.y)).collect()).collect(),
        ),
        Shape::Polygon(pg) => polygon_or_multi(pg.rings(), |p| coord(p.x, p.y)),
        Shape::PolygonM(pg) => polygon_or_multi(pg.rings(), |p| coord(p.x, p.y)),
        Shape::PolygonZ(pg) => polygon_or_multi(pg.rings(), |p| coord(p.x, p.y)),
        Shape::Multipatch(_) => {
            return Err(AuditError::shapefile("Multipatch geometry type is not supported"));
        }
    };
    Ok(Some(geometry))
}

/// Convert a dBase value into the column's declared kind
fn convert_dbase_value(value: &DbaseFieldValue, kind: FieldKind) -> AttributeValue {
    match value {
        DbaseFieldValue::Numeric(Some(n)) if kind == FieldKind::Integer && n.fract() == 0.0 => {
            AttributeValue::Integer(*n as i64)
        }
        DbaseFieldValue::Character(Some(s)) => AttributeValue::Text(s.clone()),
        DbaseFieldValue::Character(None) => AttributeValue::Null,
        DbaseFieldValue::Numeric(Some(n)) => AttributeValue::Real(*n),
        DbaseFieldValue::Numeric(None) => AttributeValue::Null,
        DbaseFieldValue::Logical(Some(b)) => AttributeValue::Logical(*b),
        DbaseFieldValue::Logical(None) => AttributeValue::Null,
        DbaseFieldValue::Date(Some(date)) => AttributeValue::Date(format!(
            "{:04}-{:02}-{:02}",
            date.year(),
            date.month(),
            date.day()
        )),
        DbaseFieldValue::Date(None) => AttributeValue::Null,
        DbaseFieldValue::Float(Some(f)) => AttributeValue::Real(*f as f64),
        DbaseFieldValue::Float(None) => AttributeValue::Null,
        DbaseFieldValue::Integer(i) => AttributeValue::Integer(*i as i64),
        DbaseFieldValue::Currency(c) => AttributeValue::Real(*c),
        DbaseFieldValue::DateTime(dt) => AttributeValue::Date(format!(
            "{:04}-{:02}-{:02}",
            dt.date().year(),
            dt.date().month(),
            dt.date().day()
        )),
        DbaseFieldValue::Double(d) => AttributeValue::Real(*d),
        DbaseFieldValue::Memo(s) => AttributeValue::Text(s.clone()),
        #[allow(unreachable_patterns)]
        _ => AttributeValue::Null,
    }
}

/// Shapefile format writer
pub struct ShapefileWriter;

impl ShapefileWriter {
    /// Write `layer` to `path`, replacing existing component files. All
    /// features must share one geometry family; features without a writable
    /// geometry are skipped. Returns the files written.
    pub fn write(&self, layer: &Layer, path: &Path) -> Result<Vec<PathBuf>> {
        if !has_extension(path, "shp") {
            return Err(AuditError::shapefile(format!(
                "Output must be a .shp path: {}",
                path.display()
            )));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        self.remove_existing(path)?;

        let columns = DbfColumns::for_layer(layer);
        let family = layer.geometry_family().unwrap_or(GeometryFamily::Polygon);

        let mut skipped = 0usize;
        let mut records: Vec<(&Geometry<f64>, Record)> = Vec::new();
        for feature in &layer.features {
            match feature.geometry.as_ref() {
                Some(geometry) if GeometryFamily::of(geometry) == Some(family) => {
                    records.push((geometry, columns.record(feature)));
                }
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::debug!(
                "Skipped {} features without a {} geometry while writing {}",
                skipped,
                family.as_str(),
                path.display()
            );
        }

        match family {
            GeometryFamily::Point => write_shapes(
                path,
                columns.builder()?,
                records.into_iter().filter_map(|(g, r)| to_point(g).map(|s| (s, r))),
            )?,
            GeometryFamily::MultiPoint => write_shapes(
                path,
                columns.builder()?,
                records.into_iter().filter_map(|(g, r)| to_multipoint(g).map(|s| (s, r))),
            )?,
            GeometryFamily::Line => write_shapes(
                path,
                columns.builder()?,
                records.into_iter().filter_map(|(g, r)| to_polyline(g).map(|s| (s, r))),
            )?,
            GeometryFamily::Polygon => write_shapes(
                path,
                columns.builder()?,
                records.into_iter().filter_map(|(g, r)| to_polygon(g).map(|s| (s, r))),
            )?,
        }

        let mut written = vec![path.to_path_buf(), path.with_extension("shx"), path.with_extension("dbf")];
        if let Some(wkt) = &layer.crs_wkt {
            let prj = path.with_extension("prj");
            fs::write(&prj, wkt)?;
            written.push(prj);
        }
        let cpg = path.with_extension("cpg");
        fs::write(&cpg, "UTF-8")?;
        written.push(cpg);

        Ok(written)
    }

    fn remove_existing(&self, path: &Path) -> Result<()> {
        let targets = std::iter::once(path.to_path_buf())
            .chain(SIDECAR_EXTENSIONS.iter().map(|ext| path.with_extension(ext)));
        for target in targets {
            if target.exists() {
                fs::remove_file(&target)?;
            }
        }
        Ok(())
    }
}

fn write_shapes<S: shapefile::record::EsriShape>(
    path: &Path,
    builder: TableWriterBuilder,
    items: impl Iterator<Item = (S, Record)>,
) -> Result<()> {
    let mut writer = shapefile::Writer::from_path(path, builder)
        .map_err(|e| AuditError::shapefile(format!("Failed to create {}: {}", path.display(), e)))?;
    for (shape, record) in items {
        writer
            .write_shape_and_record(&shape, &record)
            .map_err(|e| AuditError::shapefile(format!("Failed to write feature: {}", e)))?;
    }
    Ok(())
}

fn shp_point(c: &Coord<f64>) -> shapefile::Point {
    shapefile::Point::new(c.x, c.y)
}

fn to_point(geometry: &Geometry<f64>) -> Option<shapefile::Point> {
    match geometry {
        Geometry::Point(p) => Some(shp_point(&p.0)),
        _ => None,
    }
}

fn to_multipoint(geometry: &Geometry<f64>) -> Option<shapefile::Multipoint> {
    match geometry {
        Geometry::MultiPoint(mp) if !mp.0.is_empty() => {
            Some(shapefile::Multipoint::new(mp.iter().map(|p| shp_point(&p.0)).collect()))
        }
        _ => None,
    }
}

fn to_polyline(geometry: &Geometry<f64>) -> Option<shapefile::Polyline> {
    let lines: Vec<&LineString<f64>> = match geometry {
        Geometry::LineString(ls) => vec![ls],
        Geometry::MultiLineString(mls) => mls.iter().collect(),
        Geometry::Line(l) => {
            return Some(shapefile::Polyline::new(vec![shp_point(&l.start), shp_point(&l.end)]));
        }
        _ => return None,
    };
    let parts: Vec<Vec<shapefile::Point>> = lines
        .into_iter()
        .filter(|ls| ls.0.len() >= 2)
        .map(|ls| ls.coords().map(shp_point).collect())
        .collect();
    (!parts.is_empty()).then(|| shapefile::Polyline::with_parts(parts))
}

fn to_polygon(geometry: &Geometry<f64>) -> Option<shapefile::Polygon> {
    let polygons: Vec<Polygon<f64>> = match geometry {
        Geometry::Polygon(p) => vec![p.clone()],
        Geometry::MultiPolygon(mp) => mp.0.clone(),
        Geometry::Rect(r) => vec![r.to_polygon()],
        Geometry::Triangle(t) => vec![t.to_polygon()],
        _ => return None,
    };

    let mut rings = Vec::new();
    for polygon in &polygons {
        if polygon.exterior().0.len() < 4 {
            continue;
        }
        rings.push(PolygonRing::Outer(polygon.exterior().coords().map(shp_point).collect()));
        for interior in polygon.interiors().iter().filter(|r| r.0.len() >= 4) {
            rings.push(PolygonRing::Inner(interior.coords().map(shp_point).collect()));
        }
    }
    (!rings.is_empty()).then(|| shapefile::Polygon::with_rings(rings))
}

/// dBase column layout of a layer: names shortened to the 10-byte limit and
/// made unique, widths sized from the data.
struct DbfColumns {
    columns: Vec<DbfColumn>,
}

struct DbfColumn {
    name: String,
    kind: FieldKind,
    width: u8,
}

impl DbfColumns {
    fn for_layer(layer: &Layer) -> Self {
        let mut used: HashSet<String> = HashSet::new();
        let mut columns = Vec::with_capacity(layer.fields.len());

        for (idx, field) in layer.fields.iter().enumerate() {
            let name = unique_dbf_name(&field.name, &mut used);
            let width = match field.kind {
                FieldKind::Text | FieldKind::Date => layer
                    .features
                    .iter()
                    .filter_map(|f| f.attributes.get(idx))
                    .map(|v| text_of(v).map(|s| s.len()).unwrap_or(0))
                    .max()
                    .unwrap_or(0)
                    .clamp(1, 254) as u8,
                FieldKind::Integer => 18,
                FieldKind::Real => 24,
                FieldKind::Logical => 1,
            };
            columns.push(DbfColumn { name, kind: field.kind, width });
        }

        Self { columns }
    }

    fn builder(&self) -> Result<TableWriterBuilder> {
        let mut builder = TableWriterBuilder::new();
        for column in &self.columns {
            let name = FieldName::try_from(column.name.as_str()).map_err(|e| {
                AuditError::shapefile(format!("Invalid field name '{}': {:?}", column.name, e))
            })?;
            builder = match column.kind {
                FieldKind::Text | FieldKind::Date => builder.add_character_field(name, column.width),
                FieldKind::Integer => builder.add_numeric_field(name, column.width, 0),
                FieldKind::Real => builder.add_numeric_field(name, column.width, 8),
                FieldKind::Logical => builder.add_logical_field(name),
            };
        }
        Ok(builder)
    }

    fn record(&self, feature: &Feature) -> Record {
        let mut record = Record::default();
        for (idx, column) in self.columns.iter().enumerate() {
            let value = feature.attributes.get(idx).unwrap_or(&AttributeValue::Null);
            let dbase_value = match column.kind {
                FieldKind::Text | FieldKind::Date => {
                    DbaseFieldValue::Character(text_of(value).map(|s| truncate_bytes(&s, 254)))
                }
                FieldKind::Integer | FieldKind::Real => DbaseFieldValue::Numeric(match value {
                    AttributeValue::Integer(i) => Some(*i as f64),
                    AttributeValue::Real(f) if f.is_finite() => Some(*f),
                    _ => None,
                }),
                FieldKind::Logical => DbaseFieldValue::Logical(match value {
                    AttributeValue::Logical(b) => Some(*b),
                    _ => None,
                }),
            };
            record.insert(column.name.clone(), dbase_value);
        }
        record
    }
}

fn text_of(value: &AttributeValue) -> Option<String> {
    match value {
        AttributeValue::Null => None,
        AttributeValue::Text(s) | AttributeValue::Date(s) => Some(s.clone()),
        AttributeValue::Integer(i) => Some(i.to_string()),
        AttributeValue::Real(f) => Some(f.to_string()),
        AttributeValue::Logical(b) => Some(b.to_string()),
    }
}

/// Cut `s` to at most `max` bytes on a char boundary
fn truncate_bytes(s: &str, max: usize) -> String {
    let mut end = s.len().min(max);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

fn unique_dbf_name(name: &str, used: &mut HashSet<String>) -> String {
    let base = truncate_bytes(name, 10);
    let base = if base.is_empty() { "FIELD".to_string() } else { base };
    let mut candidate = base.clone();
    let mut n = 1;
    while used.contains(&candidate.to_uppercase()) {
        let suffix = format!("_{}", n);
        candidate = format!("{}{}", truncate_bytes(&base, 10 - suffix.len()), suffix);
        n += 1;
    }
    used.insert(candidate.to_uppercase());
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn square(x: f64, y: f64, size: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (x, y),
                (x + size, y),
                (x + size, y + size),
                (x, y + size),
                (x, y),
            ]),
            vec![],
        )
    }

    fn parcel_layer() -> Layer {
        let mut layer = Layer::new("parcels");
        layer.fields = vec![
            FieldDef::text("OWNER"),
            FieldDef::new("AREA", FieldKind::Real),
            FieldDef::integer("CODE"),
        ];
        layer.features.push(Feature::new(
            0,
            Some(Geometry::Polygon(square(0.0, 0.0, 10.0))),
            vec![
                AttributeValue::Text("kim".to_string()),
                AttributeValue::Real(100.0),
                AttributeValue::Integer(7),
            ],
        ));
        layer.features.push(Feature::new(
            1,
            Some(Geometry::MultiPolygon(MultiPolygon::new(vec![
                square(20.0, 0.0, 5.0),
                square(40.0, 0.0, 5.0),
            ]))),
            vec![AttributeValue::Text("lee".to_string()), AttributeValue::Null, AttributeValue::Null],
        ));
        layer.crs_wkt = Some("GEOGCS[\"WGS 84\"]".to_string());
        layer
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension(Path::new("a/b.SHP"), "shp"));
        assert!(!has_extension(Path::new("a/b.shx"), "shp"));
        assert!(!has_extension(Path::new("a/b"), "shp"));
    }

    #[test]
    fn test_missing_components() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.shp");
        fs::write(&path, b"not a shapefile").unwrap();

        let err = ShapefileReader.read(&path, "broken").unwrap_err();
        assert!(err.to_string().contains(".shx"));
        assert!(err.to_string().contains(".dbf"));
    }

    #[test]
    fn test_write_then_read_polygons() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("parcels.shp");

        let written = ShapefileWriter.write(&parcel_layer(), &path).unwrap();
        assert!(written.iter().all(|p| p.exists()));

        let layer = ShapefileReader.read(&path, "parcels").unwrap();
        assert_eq!(layer.feature_count(), 2);
        assert_eq!(layer.crs_wkt.as_deref(), Some("GEOGCS[\"WGS 84\"]"));
        assert!(matches!(layer.features[0].geometry, Some(Geometry::Polygon(_))));
        assert!(matches!(layer.features[1].geometry, Some(Geometry::MultiPolygon(_))));

        let owner = layer.attribute(&layer.features[1], "OWNER");
        assert_eq!(owner, Some(&AttributeValue::Text("lee".to_string())));
        let code = layer.attribute(&layer.features[0], "CODE").and_then(|v| v.as_i64());
        assert_eq!(code, Some(7));
    }

    #[test]
    fn test_schema_follows_header_when_first_record_is_null() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("zones.shp");

        let mut layer = Layer::new("zones");
        layer.fields = vec![
            FieldDef::integer("CODE"),
            FieldDef::text("ZNAME"),
            FieldDef::new("RATIO", FieldKind::Real),
            FieldDef::text("ANAME"),
        ];
        layer.features.push(Feature::new(
            0,
            Some(Geometry::Polygon(square(0.0, 0.0, 1.0))),
            vec![
                AttributeValue::Null,
                AttributeValue::Text("north".to_string()),
                AttributeValue::Null,
                AttributeValue::Null,
            ],
        ));
        layer.features.push(Feature::new(
            1,
            Some(Geometry::Polygon(square(5.0, 0.0, 1.0))),
            vec![
                AttributeValue::Integer(12),
                AttributeValue::Text("south".to_string()),
                AttributeValue::Real(0.25),
                AttributeValue::Text("b".to_string()),
            ],
        ));
        ShapefileWriter.write(&layer, &path).unwrap();

        let read = ShapefileReader.read(&path, "zones").unwrap();
        let schema: Vec<(&str, FieldKind)> =
            read.fields.iter().map(|f| (f.name.as_str(), f.kind)).collect();
        assert_eq!(
            schema,
            vec![
                ("CODE", FieldKind::Integer),
                ("ZNAME", FieldKind::Text),
                ("RATIO", FieldKind::Real),
                ("ANAME", FieldKind::Text),
            ]
        );
        assert_eq!(read.features[0].attributes[0], AttributeValue::Null);
        assert_eq!(read.features[1].attributes[0], AttributeValue::Integer(12));
        assert_eq!(read.features[1].attributes[2], AttributeValue::Real(0.25));
    }

    #[test]
    fn test_write_then_read_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("roads.shp");

        let mut layer = Layer::new("roads");
        layer.fields = vec![FieldDef::text("NAME")];
        layer.features.push(Feature::new(
            0,
            Some(Geometry::LineString(LineString::from(vec![(0.0, 0.0), (5.0, 5.0)]))),
            vec![AttributeValue::Text("main".to_string())],
        ));
        layer.features.push(Feature::new(
            1,
            Some(Geometry::MultiLineString(MultiLineString::new(vec![
                LineString::from(vec![(0.0, 1.0), (1.0, 1.0)]),
                LineString::from(vec![(2.0, 1.0), (3.0, 1.0)]),
            ]))),
            vec![AttributeValue::Text("split".to_string())],
        ));
        ShapefileWriter.write(&layer, &path).unwrap();

        let read = ShapefileReader.read(&path, "roads").unwrap();
        assert_eq!(read.geometry_family(), Some(GeometryFamily::Line));
        assert!(matches!(read.features[0].geometry, Some(Geometry::LineString(_))));
        assert!(matches!(read.features[1].geometry, Some(Geometry::MultiLineString(_))));
    }

    #[test]
    fn test_write_replaces_existing_output() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("parcels.shp");

        ShapefileWriter.write(&parcel_layer(), &path).unwrap();
        let mut smaller = parcel_layer();
        smaller.features.truncate(1);
        smaller.crs_wkt = None;
        ShapefileWriter.write(&smaller, &path).unwrap();

        let layer = ShapefileReader.read(&path, "parcels").unwrap();
        assert_eq!(layer.feature_count(), 1);
        assert!(layer.crs_wkt.is_none());
    }

    #[test]
    fn test_unique_dbf_names() {
        let mut used = HashSet::new();
        assert_eq!(unique_dbf_name("INPUT_ID", &mut used), "INPUT_ID");
        assert_eq!(unique_dbf_name("INPUT_ID", &mut used), "INPUT_ID_1");
        assert_eq!(unique_dbf_name("VERY_LONG_FIELD_NAME", &mut used), "VERY_LONG_");
        assert_eq!(unique_dbf_name("VERY_LONG_FIELD_NAME", &mut used), "VERY_LON_1");
    }

    #[test]
    fn test_truncate_bytes_respects_char_boundary() {
        assert_eq!(truncate_bytes("오류종류", 10), "오류종");
        assert_eq!(truncate_bytes("abc", 10), "abc");
    }
}
