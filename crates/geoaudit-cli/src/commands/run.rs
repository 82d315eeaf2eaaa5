//! Run command implementation

use crate::cli::RunArgs;
use crate::config_loader::load_config_with_overrides;
use crate::dry_run::RunPlan;
use crate::feedback::ConsoleFeedback;
use crate::output::OutputWriter;
use crate::output_types::{CategoryRow, FileRow, RunOutput};
use anyhow::{Context, Result};
use geoaudit_core::config::CliConfigOverrides;
use geoaudit_geo::GeoEngine;
use geoaudit_pipeline::{discover_shapefiles, Auditor, OutputLayout, QmlStyleRegistry, ShapefileStore};
use std::path::Path;

pub fn execute(
    args: RunArgs,
    output: &OutputWriter,
    dry_run: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let overrides = CliConfigOverrides {
        snap_tolerance: args.snap_tolerance,
        min_overlap_area: args.min_overlap_area,
        min_segment_length: args.min_segment_length,
        duplicate_tolerance: args.duplicate_tolerance,
        error_field: args.error_field.clone(),
        apply_style: args.no_style.then_some(false),
    };
    let config = load_config_with_overrides(config_path, overrides)?;
    let settings = config.settings();

    if dry_run {
        let sources = discover_shapefiles(&args.input, Some(&args.output))?;
        return RunPlan::build(&sources, &OutputLayout::new(&args.output), &settings).display(output);
    }

    let feedback = ConsoleFeedback::new(output);
    let auditor = Auditor::new(GeoEngine::new(), ShapefileStore, QmlStyleRegistry, settings.clone());
    let outcome = match auditor.run(&args.input, &args.output, &feedback) {
        Ok(outcome) => {
            feedback.finish(&format!("Audited {} shapefiles", outcome.files.len()));
            outcome
        }
        Err(e) => {
            feedback.abandon("Audit stopped");
            return Err(e).with_context(|| format!("Audit of {} failed", args.input.display()));
        }
    };

    let rows = outcome.summary.as_ref().map(|s| s.rows()).unwrap_or_default();

    if output.is_json() {
        return output.result(RunOutput {
            input: args.input.display().to_string(),
            output: args.output.display().to_string(),
            settings,
            total_features: outcome.total_features,
            total_errors: outcome.summary.as_ref().map(|s| s.total_errors()).unwrap_or(0),
            categories: rows,
            merged_layers: outcome.merged_paths.iter().map(|p| p.display().to_string()).collect(),
            summary_csv: outcome.summary_path.as_ref().map(|p| p.display().to_string()),
            files: outcome.files,
        });
    }

    output.section("Layers");
    output.table(outcome.files.iter().map(FileRow::from).collect());

    if outcome.skipped() > 0 {
        output.warning(format!("{} shapefiles could not be loaded and were skipped", outcome.skipped()));
    }

    match (&outcome.summary, &outcome.summary_path) {
        (Some(summary), Some(summary_path)) => {
            output.section("Errors");
            output.table(rows.iter().map(CategoryRow::from).collect());
            output.kv("Features", summary.total_features);
            output.kv("Errors", summary.total_errors());
            for path in &outcome.merged_paths {
                output.kv("Error layer", path.display());
            }
            output.kv("Summary", summary_path.display());
            output.success("Audit complete");
        }
        _ => output.success(format!("No errors found in {} features", outcome.total_features)),
    }

    Ok(())
}
