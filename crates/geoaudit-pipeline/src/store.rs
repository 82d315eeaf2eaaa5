//! File-backed adapters for the storage ports

use geoaudit_core::formats::{write_qml, ShapefileReader, ShapefileWriter};
use geoaudit_core::models::{CategorizedRenderer, GeometryFamily, Layer, ShapefileSource};
use geoaudit_core::ports::{LayerRegistry, LayerStore};
use geoaudit_core::{AuditError, Result};
use std::path::{Path, PathBuf};

/// Reads and writes shapefiles on disk
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapefileStore;

impl LayerStore for ShapefileStore {
    fn load(&self, source: &ShapefileSource) -> Result<Layer> {
        ShapefileReader.read(&source.path, &source.name).map_err(|e| AuditError::LayerLoad {
            path: source.path.clone(),
            reason: e.to_string(),
        })
    }

    fn save(&self, layer: &Layer, path: &Path) -> Result<Vec<PathBuf>> {
        ShapefileWriter.write(layer, path)
    }
}

/// Registers a layer by writing a QGIS style sidecar (`<stem>.qml`) next
/// to it, so the layer opens with the renderer applied
#[derive(Debug, Clone, Copy, Default)]
pub struct QmlStyleRegistry;

impl QmlStyleRegistry {
    pub fn style_path(path: &Path) -> PathBuf {
        path.with_extension("qml")
    }
}

impl LayerRegistry for QmlStyleRegistry {
    fn register(&self, layer: &Layer, path: &Path, renderer: &CategorizedRenderer) -> Result<()> {
        let family = layer.geometry_family().unwrap_or(GeometryFamily::Polygon);
        let style = Self::style_path(path);
        write_qml(&style, renderer, family)?;
        tracing::info!("Styled {} with {} categories", layer.name, renderer.categories.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_failure_is_layer_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lonely.shp");
        fs::write(&path, b"").unwrap();

        let err = ShapefileStore.load(&ShapefileSource::from_path(&path)).unwrap_err();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("lonely.shp"));
    }

    #[test]
    fn test_registry_writes_sidecar() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("merged_errors.shp");
        let renderer = CategorizedRenderer::for_error_tags("ERR_TYPE");

        QmlStyleRegistry.register(&Layer::new("merged_errors"), &path, &renderer).unwrap();
        let qml = fs::read_to_string(dir.path().join("merged_errors.qml")).unwrap();
        assert!(qml.contains("ERR_TYPE"));
    }
}
