use serde::Serialize;
use std::path::{Path, PathBuf};

/// A shapefile discovered on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShapefileSource {
    pub path: PathBuf,
    /// File stem, used as layer name and for derived output names
    pub name: String,
}

impl ShapefileSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unnamed".to_string());
        Self { path, name }
    }

    /// `<dir>/<name>_snapped.shp`
    pub fn snapped_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}_snapped.shp", self.name))
    }
}
