use geoaudit_core::formats::has_extension;
use geoaudit_core::models::ShapefileSource;
use geoaudit_core::{AuditError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recursively find `.shp` files under `input`, sorted by path.
///
/// Anything below `exclude` is skipped, so an output folder placed inside
/// the input folder is never audited. Symlinked folders are not descended
/// into. Unreadable entries are logged and skipped. Fails with
/// `InputNotFound` when `input` is not a directory and with `NoInput` when
/// nothing is found.
pub fn discover_shapefiles(input: &Path, exclude: Option<&Path>) -> Result<Vec<ShapefileSource>> {
    if !input.is_dir() {
        return Err(AuditError::InputNotFound { path: input.to_path_buf() });
    }

    let exclude = exclude.map(normalize);
    let walker = WalkDir::new(input).follow_links(false).into_iter().filter_entry(|e| {
        let skip = e.file_type().is_dir()
            && exclude.as_deref().is_some_and(|ex| normalize(e.path()) == ex);
        if skip {
            tracing::debug!("Skipping output folder {}", e.path().display());
        }
        !skip
    });

    let mut found = Vec::new();
    let mut unreadable = 0usize;
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                unreadable += 1;
                tracing::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if is_file && has_extension(entry.path(), "shp") {
            found.push(entry.into_path());
        }
    }

    if found.is_empty() {
        return Err(AuditError::NoInput { path: input.to_path_buf() });
    }

    found.sort();
    tracing::debug!(
        "Discovered {} shapefiles under {} ({} entries unreadable)",
        found.len(),
        input.display(),
        unreadable
    );
    Ok(found.into_iter().map(ShapefileSource::from_path).collect())
}

fn normalize(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
