//! In-memory vector layer model.
//!
//! A [`Layer`] is the handle every pipeline step consumes and produces: an
//! ordered field schema plus features whose attribute vectors are aligned
//! with that schema. Geometry is stored as `geo::Geometry<f64>` and is only
//! interpreted by the geometry engine.

use geo::Geometry;
use serde::Serialize;

/// Geometry family of a shapefile; one file holds exactly one family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryFamily {
    Point,
    MultiPoint,
    Line,
    Polygon,
}

impl GeometryFamily {
    /// Family of a geometry, `None` for collections that no single
    /// shapefile type can hold
    pub fn of(geometry: &Geometry<f64>) -> Option<GeometryFamily> {
        match geometry {
            Geometry::Point(_) => Some(GeometryFamily::Point),
            Geometry::MultiPoint(_) => Some(GeometryFamily::MultiPoint),
            Geometry::Line(_) | Geometry::LineString(_) | Geometry::MultiLineString(_) => {
                Some(GeometryFamily::Line)
            }
            Geometry::Polygon(_)
            | Geometry::MultiPolygon(_)
            | Geometry::Rect(_)
            | Geometry::Triangle(_) => Some(GeometryFamily::Polygon),
            Geometry::GeometryCollection(_) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryFamily::Point => "point",
            GeometryFamily::MultiPoint => "multipoint",
            GeometryFamily::Line => "line",
            GeometryFamily::Polygon => "polygon",
        }
    }
}

/// Attribute column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Integer,
    Real,
    Logical,
    Date,
}

/// Attribute column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self { name: name.into(), kind }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }
}

/// A single attribute value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Text(String),
    Integer(i64),
    Real(f64),
    Logical(bool),
    /// ISO `YYYY-MM-DD`
    Date(String),
}

impl AttributeValue {
    /// Numeric view used by id comparisons
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            AttributeValue::Real(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }
}

/// A feature: optional geometry plus schema-aligned attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Feature id, unique within its layer
    pub id: u64,
    pub geometry: Option<Geometry<f64>>,
    pub attributes: Vec<AttributeValue>,
}

impl Feature {
    pub fn new(id: u64, geometry: Option<Geometry<f64>>, attributes: Vec<AttributeValue>) -> Self {
        Self { id, geometry, attributes }
    }
}

/// A named collection of features sharing one schema
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layer {
    pub name: String,
    pub fields: Vec<FieldDef>,
    pub features: Vec<Feature>,
    /// Projection WKT carried through from the source `.prj`, if any
    pub crs_wkt: Option<String>,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    /// Empty layer with the same name, schema and CRS
    pub fn empty_like(&self) -> Self {
        Self {
            name: self.name.clone(),
            fields: self.fields.clone(),
            features: Vec::new(),
            crs_wkt: self.crs_wkt.clone(),
        }
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Attribute of `feature` in column `name`
    pub fn attribute<'a>(&self, feature: &'a Feature, name: &str) -> Option<&'a AttributeValue> {
        self.field_index(name).and_then(|idx| feature.attributes.get(idx))
    }

    /// Return the index of `field`, appending the column (null-filled) if it
    /// does not exist yet.
    pub fn ensure_field(&mut self, field: FieldDef) -> usize {
        if let Some(idx) = self.field_index(&field.name) {
            return idx;
        }
        self.fields.push(field);
        for feature in &mut self.features {
            feature.attributes.push(AttributeValue::Null);
        }
        self.fields.len() - 1
    }

    /// Write `value` into column `idx` for every feature
    pub fn set_all(&mut self, idx: usize, value: &AttributeValue) {
        for feature in &mut self.features {
            if feature.attributes.len() <= idx {
                feature.attributes.resize(idx + 1, AttributeValue::Null);
            }
            feature.attributes[idx] = value.clone();
        }
    }

    /// Tag every feature with `label` in the text column `field`. A column
    /// whose name differs only by case is taken over, since dBase names are
    /// case-insensitive and the two could not coexist on disk.
    pub fn tag_all(&mut self, field: &str, label: &str) {
        let existing = self.fields.iter().position(|f| f.name.eq_ignore_ascii_case(field));
        let idx = match existing {
            Some(idx) => {
                self.fields[idx] = FieldDef::text(field);
                idx
            }
            None => self.ensure_field(FieldDef::text(field)),
        };
        self.set_all(idx, &AttributeValue::Text(label.to_string()));
    }

    /// Family of the first feature with a writable geometry
    pub fn geometry_family(&self) -> Option<GeometryFamily> {
        self.features.iter().filter_map(|f| f.geometry.as_ref()).find_map(GeometryFamily::of)
    }
}
