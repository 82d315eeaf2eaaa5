use crate::error::Result;
use crate::models::Layer;

/// Typed row filter evaluated by [`GeometryEngine::extract`]
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureFilter {
    /// `id_field < id_field_2 AND area > min_area` over a self-intersection
    /// result, where `id_field_2` is the id of the second operand.
    OverlapPair { id_field: String, min_area: f64 },
    /// Linear length (perimeter for polygons) below the threshold
    LengthBelow(f64),
    /// Geometry fails the validity test
    Invalid,
    /// Geometry made of more than `n` parts
    PartsAbove(usize),
}

/// Geometry processing operations the auditor relies on.
///
/// Every operation takes a layer handle and returns a new layer; inputs are
/// never modified.
pub trait GeometryEngine {
    /// Split multi-part geometries into one feature per part
    fn split_multipart(&self, layer: &Layer) -> Result<Layer>;

    /// Repair invalid geometries, dropping features that cannot be repaired
    fn fix_geometries(&self, layer: &Layer) -> Result<Layer>;

    /// Drop consecutive vertices closer than `tolerance`
    fn remove_duplicate_vertices(&self, layer: &Layer, tolerance: f64) -> Result<Layer>;

    /// Snap the layer's vertices onto its own vertices within `tolerance`
    fn snap_to_self(&self, layer: &Layer, tolerance: f64) -> Result<Layer>;

    /// Append an integer field numbered from `start` in feature order
    fn add_autoincrement_field(&self, layer: &Layer, field: &str, start: i64) -> Result<Layer>;

    /// Intersect the layer with itself. One output feature per ordered pair
    /// of intersecting features (self pairs included) carrying the fields of
    /// both operands, the second operand's fields suffixed with `_2`.
    fn self_intersection(&self, layer: &Layer) -> Result<Layer>;

    /// Keep only the features matching `filter`
    fn extract(&self, layer: &Layer, filter: &FeatureFilter) -> Result<Layer>;

    /// Concatenate layers into one, unioning their schemas
    fn merge(&self, layers: &[Layer], name: &str) -> Result<Layer>;
}
