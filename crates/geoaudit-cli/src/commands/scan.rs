//! Scan command implementation

use crate::cli::ScanArgs;
use crate::output::OutputWriter;
use crate::output_types::{ScanOutput, ScanRow};
use anyhow::Result;
use geoaudit_pipeline::discover_shapefiles;

pub fn execute(args: ScanArgs, output: &OutputWriter) -> Result<()> {
    let sources = discover_shapefiles(&args.input, args.exclude.as_deref())?;

    if output.is_json() {
        return output.result(ScanOutput {
            input: args.input.display().to_string(),
            shapefiles: sources,
        });
    }

    output.section("Shapefiles");
    output.table(
        sources
            .iter()
            .map(|s| ScanRow { name: s.name.clone(), path: s.path.display().to_string() })
            .collect(),
    );
    output.success(format!("{} shapefiles found under {}", sources.len(), args.input.display()));
    Ok(())
}
