use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::{CategorizedRenderer, Layer, ShapefileSource};

/// Reads and persists layers
pub trait LayerStore {
    /// Load a source into memory
    fn load(&self, source: &ShapefileSource) -> Result<Layer>;

    /// Write a layer to `path`, replacing any existing output.
    /// Returns every file written.
    fn save(&self, layer: &Layer, path: &Path) -> Result<Vec<PathBuf>>;
}

/// Makes a saved layer available for display with a renderer
pub trait LayerRegistry {
    /// `layer` was saved to `path`
    fn register(&self, layer: &Layer, path: &Path, renderer: &CategorizedRenderer) -> Result<()>;
}

/// Registry that does nothing, for headless runs
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRegistry;

impl LayerRegistry for NoopRegistry {
    fn register(&self, _layer: &Layer, _path: &Path, _renderer: &CategorizedRenderer) -> Result<()> {
        Ok(())
    }
}
