//! Evaluation of typed feature filters

use geo::{Area, Geometry};
use geoaudit_core::models::{Feature, Layer};
use geoaudit_core::ports::FeatureFilter;

use crate::models::{geometry_length, part_count};
use crate::overlay::SECOND_OPERAND_SUFFIX;
use crate::validation::is_valid;

/// Whether `feature` of `layer` matches `filter`. Features without geometry
/// never match.
pub fn matches(layer: &Layer, feature: &Feature, filter: &FeatureFilter) -> bool {
    let Some(geometry) = feature.geometry.as_ref() else {
        return false;
    };

    match filter {
        FeatureFilter::OverlapPair { id_field, min_area } => {
            let second = format!("{}{}", id_field, SECOND_OPERAND_SUFFIX);
            let id = layer.attribute(feature, id_field).and_then(|v| v.as_i64());
            let id_2 = layer.attribute(feature, &second).and_then(|v| v.as_i64());
            match (id, id_2) {
                (Some(id), Some(id_2)) => id < id_2 && area(geometry) > *min_area,
                _ => false,
            }
        }
        FeatureFilter::LengthBelow(min) => geometry_length(geometry).is_some_and(|l| l < *min),
        FeatureFilter::Invalid => !is_valid(geometry),
        FeatureFilter::PartsAbove(n) => part_count(geometry) > *n,
    }
}

fn area(geometry: &Geometry<f64>) -> f64 {
    geometry.unsigned_area()
}

/// Copy of `layer` holding only the features matching `filter`
pub fn extract(layer: &Layer, filter: &FeatureFilter) -> Layer {
    let mut out = layer.empty_like();
    out.features = layer
        .features
        .iter()
        .filter(|f| matches(layer, f, filter))
        .cloned()
        .collect();
    out
}
