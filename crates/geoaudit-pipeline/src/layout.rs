//! Output folder layout

use geoaudit_core::models::{GeometryFamily, ShapefileSource};
use std::path::PathBuf;

pub const SNAPPED_DIR: &str = "snapped";
pub const ERRORS_DIR: &str = "errors";
pub const MERGED_LAYER_NAME: &str = "merged_errors";
pub const SUMMARY_FILE: &str = "errors_summary.csv";

/// Paths of everything an audit writes below the output folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn snapped_dir(&self) -> PathBuf {
        self.root.join(SNAPPED_DIR)
    }

    pub fn errors_dir(&self) -> PathBuf {
        self.root.join(ERRORS_DIR)
    }

    /// `<root>/snapped/<name>_snapped.shp`
    pub fn snapped_path(&self, source: &ShapefileSource) -> PathBuf {
        source.snapped_path(&self.snapped_dir())
    }

    /// Merged error layer. The first geometry family gets the plain name,
    /// any further family a suffixed one.
    pub fn merged_path(&self, family: Option<GeometryFamily>) -> PathBuf {
        match family {
            None => self.errors_dir().join(format!("{}.shp", MERGED_LAYER_NAME)),
            Some(family) => self
                .errors_dir()
                .join(format!("{}_{}.shp", MERGED_LAYER_NAME, family.as_str())),
        }
    }

    pub fn summary_path(&self) -> PathBuf {
        self.root.join(SUMMARY_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let layout = OutputLayout::new("/out");
        let source = ShapefileSource::from_path("/in/roads.shp");

        assert_eq!(layout.snapped_path(&source), PathBuf::from("/out/snapped/roads_snapped.shp"));
        assert_eq!(layout.merged_path(None), PathBuf::from("/out/errors/merged_errors.shp"));
        assert_eq!(
            layout.merged_path(Some(GeometryFamily::MultiPoint)),
            PathBuf::from("/out/errors/merged_errors_multipoint.shp")
        );
        assert_eq!(layout.summary_path(), PathBuf::from("/out/errors_summary.csv"));
    }
}
