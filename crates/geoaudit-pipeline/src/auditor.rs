//! Batch audit orchestration

use chrono::Local;
use geoaudit_core::config::AuditSettings;
use geoaudit_core::formats::write_summary_csv;
use geoaudit_core::models::{
    CategorizedRenderer, ErrorCounts, ErrorTag, FileReport, FileStatus, GeometryFamily, Layer,
    RunSummary, ShapefileSource,
};
use geoaudit_core::ports::{FeatureFilter, Feedback, GeometryEngine, LayerRegistry, LayerStore};
use geoaudit_core::Result;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::discovery::discover_shapefiles;
use crate::layout::{OutputLayout, MERGED_LAYER_NAME};

/// Auto-increment identifier given to snapped features before overlap
/// detection
pub const ID_FIELD: &str = "INPUT_ID";

/// Result of one audit run
#[derive(Debug, Clone, Serialize)]
pub struct AuditOutcome {
    pub files: Vec<FileReport>,
    pub total_features: usize,
    /// `None` when nothing was flagged
    pub summary: Option<RunSummary>,
    pub merged_paths: Vec<PathBuf>,
    pub summary_path: Option<PathBuf>,
}

impl AuditOutcome {
    pub fn has_errors(&self) -> bool {
        self.summary.is_some()
    }

    pub fn skipped(&self) -> usize {
        self.files.iter().filter(|f| f.is_skipped()).count()
    }
}

/// Runs the fixed repair, snap and check sequence over a folder of
/// shapefiles
pub struct Auditor<E, S, R> {
    engine: E,
    store: S,
    registry: R,
    settings: AuditSettings,
}

/// What one shapefile contributed to the run
struct FileAudit {
    features: usize,
    counts: ErrorCounts,
    flagged: Vec<Layer>,
}

impl<E, S, R> Auditor<E, S, R>
where
    E: GeometryEngine,
    S: LayerStore,
    R: LayerRegistry,
{
    pub fn new(engine: E, store: S, registry: R, settings: AuditSettings) -> Self {
        Self { engine, store, registry, settings }
    }

    pub fn settings(&self) -> &AuditSettings {
        &self.settings
    }

    /// Audit every shapefile under `input`, writing results below `output`.
    ///
    /// Discovery failures abort before anything is written. A file that
    /// fails to load is reported and skipped; any other failure aborts the
    /// run without a summary.
    pub fn run(&self, input: &Path, output: &Path, feedback: &dyn Feedback) -> Result<AuditOutcome> {
        let started_at = Local::now();
        let sources = discover_shapefiles(input, Some(output))?;
        let layout = OutputLayout::new(output);
        fs::create_dir_all(layout.snapped_dir())?;

        feedback.info(&format!("Found {} shapefiles under {}", sources.len(), input.display()));

        let mut files = Vec::with_capacity(sources.len());
        let mut counts = ErrorCounts::new();
        let mut flagged_layers: Vec<Layer> = Vec::new();
        let mut total_features = 0usize;
        let mut written: HashSet<PathBuf> = HashSet::new();

        for (done, source) in sources.iter().enumerate() {
            let layer = match self.store.load(source) {
                Ok(layer) => layer,
                Err(e) if e.is_recoverable() => {
                    feedback.warning(&format!("Skipping {}: {}", source.path.display(), e));
                    files.push(FileReport {
                        name: source.name.clone(),
                        path: source.path.clone(),
                        status: FileStatus::Skipped { reason: e.to_string() },
                    });
                    feedback.progress(done + 1, sources.len());
                    continue;
                }
                Err(e) => return Err(e),
            };

            let snapped_path = layout.snapped_path(source);
            if !written.insert(snapped_path.clone()) {
                feedback.warning(&format!(
                    "{} overwrites an earlier output with the same name: {}",
                    source.path.display(),
                    snapped_path.display()
                ));
            }

            let audit = self.audit_layer(source, layer, &snapped_path, feedback)?;
            total_features += audit.features;
            for (tag, count) in audit.counts.iter() {
                counts.add(tag, count);
            }
            flagged_layers.extend(audit.flagged);

            files.push(FileReport {
                name: source.name.clone(),
                path: source.path.clone(),
                status: FileStatus::Processed {
                    features: audit.features,
                    flagged: audit.counts.total(),
                    snapped_path,
                },
            });
            feedback.progress(done + 1, sources.len());
        }

        if counts.is_empty() {
            feedback.info("No errors found");
            return Ok(AuditOutcome {
                files,
                total_features,
                summary: None,
                merged_paths: Vec::new(),
                summary_path: None,
            });
        }

        let merged = self.engine.merge(&flagged_layers, MERGED_LAYER_NAME)?;
        let merged_paths = self.save_merged(&merged, &layout, feedback)?;

        let summary = RunSummary { total_features, counts, started_at, finished_at: Local::now() };
        let summary_path = layout.summary_path();
        write_summary_csv(&summary_path, &summary.rows())?;
        feedback.info(&format!(
            "{} errors in {} features, summary written to {}",
            summary.total_errors(),
            total_features,
            summary_path.display()
        ));

        Ok(AuditOutcome {
            files,
            total_features,
            summary: Some(summary),
            merged_paths,
            summary_path: Some(summary_path),
        })
    }

    fn audit_layer(
        &self,
        source: &ShapefileSource,
        layer: Layer,
        snapped_path: &Path,
        feedback: &dyn Feedback,
    ) -> Result<FileAudit> {
        let settings = &self.settings;
        let features = layer.feature_count();
        tracing::info!("Processing {} ({} features)", source.name, features);

        let split = self.engine.split_multipart(&layer)?;
        let fixed = self.engine.fix_geometries(&split)?;
        let cleaned = self.engine.remove_duplicate_vertices(&fixed, settings.duplicate_tolerance)?;
        let snapped = self.engine.snap_to_self(&cleaned, settings.snap_tolerance)?;
        self.store.save(&snapped, snapped_path)?;

        let mut counts = ErrorCounts::new();
        let mut flagged = Vec::new();

        let numbered = self.engine.add_autoincrement_field(&snapped, ID_FIELD, 1)?;
        let pairs = self.engine.self_intersection(&numbered)?;
        let overlap_filter = FeatureFilter::OverlapPair {
            id_field: ID_FIELD.to_string(),
            min_area: settings.min_overlap_area,
        };
        let overlaps = self.engine.extract(&pairs, &overlap_filter)?;
        self.record(ErrorTag::Overlap, overlaps, source, &mut counts, &mut flagged, feedback);

        let checks = [
            (ErrorTag::ShortSegment, FeatureFilter::LengthBelow(settings.min_segment_length)),
            (ErrorTag::SelfIntersection, FeatureFilter::Invalid),
            (ErrorTag::MultiPart, FeatureFilter::PartsAbove(1)),
        ];
        for (tag, filter) in checks {
            let subset = self.engine.extract(&layer, &filter)?;
            self.record(tag, subset, source, &mut counts, &mut flagged, feedback);
        }

        Ok(FileAudit { features, counts, flagged })
    }

    /// Tag a non-empty flagged subset and add it to the running totals
    fn record(
        &self,
        tag: ErrorTag,
        mut subset: Layer,
        source: &ShapefileSource,
        counts: &mut ErrorCounts,
        flagged: &mut Vec<Layer>,
        feedback: &dyn Feedback,
    ) {
        if subset.is_empty() {
            return;
        }
        subset.name = source.name.clone();
        subset.tag_all(&self.settings.error_field, tag.label());
        counts.add(tag, subset.feature_count());
        feedback.info(&format!(
            "{}: {} x {} ({} in run)",
            source.name,
            subset.feature_count(),
            tag,
            counts.get(tag)
        ));
        flagged.push(subset);
    }

    /// Save the merged layer, one file per geometry family
    fn save_merged(
        &self,
        merged: &Layer,
        layout: &OutputLayout,
        feedback: &dyn Feedback,
    ) -> Result<Vec<PathBuf>> {
        let groups = split_by_family(merged);
        if groups.len() > 1 {
            let families: Vec<&str> = groups.iter().map(|(f, _)| f.as_str()).collect();
            feedback.warning(&format!(
                "Flagged features mix geometry types ({}), writing one layer per type",
                families.join(", ")
            ));
        }

        let renderer = CategorizedRenderer::for_error_tags(&self.settings.error_field);
        let mut paths = Vec::with_capacity(groups.len());
        for (n, (family, layer)) in groups.iter().enumerate() {
            let path = if n == 0 { layout.merged_path(None) } else { layout.merged_path(Some(*family)) };
            self.store.save(layer, &path)?;
            if self.settings.apply_style {
                self.registry.register(layer, &path, &renderer)?;
            }
            tracing::info!("Wrote {} {} features to {}", layer.feature_count(), family.as_str(), path.display());
            paths.push(path);
        }
        Ok(paths)
    }
}

/// Partition features by geometry family, in order of first appearance.
/// Features without a geometry stay with the first family.
fn split_by_family(layer: &Layer) -> Vec<(GeometryFamily, Layer)> {
    let mut groups: Vec<(GeometryFamily, Layer)> = Vec::new();
    let first = layer.geometry_family().unwrap_or(GeometryFamily::Polygon);

    for feature in &layer.features {
        let family = feature.geometry.as_ref().and_then(GeometryFamily::of).unwrap_or(first);
        let idx = match groups.iter().position(|(f, _)| *f == family) {
            Some(idx) => idx,
            None => {
                groups.push((family, layer.empty_like()));
                groups.len() - 1
            }
        };
        groups[idx].1.features.push(feature.clone());
    }

    if groups.is_empty() {
        groups.push((first, layer.empty_like()));
    }
    groups
}
