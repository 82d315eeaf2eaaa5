use geoaudit_core::models::{AttributeValue, Feature, FieldDef, Layer};
use geoaudit_core::ports::{FeatureFilter, GeometryEngine};
use geoaudit_core::Result;

use crate::{filter, overlay, repair, snap};

/// Field recording the source layer of each merged feature
pub const MERGE_LAYER_FIELD: &str = "LAYER";

/// Geometry engine backed by the `geo` and `rstar` crates
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoEngine;

impl GeoEngine {
    pub fn new() -> Self {
        Self
    }
}

impl GeometryEngine for GeoEngine {
    fn split_multipart(&self, layer: &Layer) -> Result<Layer> {
        Ok(repair::split_layer(layer))
    }

    fn fix_geometries(&self, layer: &Layer) -> Result<Layer> {
        Ok(repair::fix_layer(layer))
    }

    fn remove_duplicate_vertices(&self, layer: &Layer, tolerance: f64) -> Result<Layer> {
        Ok(repair::dedup_layer(layer, tolerance))
    }

    fn snap_to_self(&self, layer: &Layer, tolerance: f64) -> Result<Layer> {
        Ok(snap::snap_layer(layer, tolerance))
    }

    fn add_autoincrement_field(&self, layer: &Layer, field: &str, start: i64) -> Result<Layer> {
        let mut out = layer.clone();
        let idx = out.ensure_field(FieldDef::integer(field));
        for (n, feature) in out.features.iter_mut().enumerate() {
            if feature.attributes.len() <= idx {
                feature.attributes.resize(idx + 1, AttributeValue::Null);
            }
            feature.attributes[idx] = AttributeValue::Integer(start + n as i64);
        }
        Ok(out)
    }

    fn self_intersection(&self, layer: &Layer) -> Result<Layer> {
        Ok(overlay::self_intersection(layer))
    }

    fn extract(&self, layer: &Layer, filter: &FeatureFilter) -> Result<Layer> {
        Ok(filter::extract(layer, filter))
    }

    fn merge(&self, layers: &[Layer], name: &str) -> Result<Layer> {
        let mut merged = Layer::new(name);
        merged.crs_wkt = layers.iter().find_map(|l| l.crs_wkt.clone());

        for layer in layers {
            for field in &layer.fields {
                merged.ensure_field(field.clone());
            }
        }
        let layer_idx = merged.ensure_field(FieldDef::text(MERGE_LAYER_FIELD));
        let width = merged.fields.len();

        for layer in layers {
            // Position of each source column in the merged schema
            let mapping: Vec<Option<usize>> =
                layer.fields.iter().map(|f| merged.field_index(&f.name)).collect();

            for feature in &layer.features {
                let mut attributes = vec![AttributeValue::Null; width];
                for (src, dst) in mapping.iter().enumerate() {
                    if let (Some(dst), Some(value)) = (dst, feature.attributes.get(src)) {
                        attributes[*dst] = value.clone();
                    }
                }
                attributes[layer_idx] = AttributeValue::Text(layer.name.clone());

                let id = merged.features.len() as u64;
                merged.features.push(Feature::new(id, feature.geometry.clone(), attributes));
            }
        }

        tracing::debug!(
            "Merged {} layers into {} ({} features)",
            layers.len(),
            name,
            merged.feature_count()
        );
        Ok(merged)
    }
}
