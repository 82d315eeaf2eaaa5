use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// geoaudit - Batch geometry auditor for shapefile folders
#[derive(Parser, Debug)]
#[command(name = "geoaudit")]
#[command(about = "Batch geometry auditor for shapefile folders", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Show planned actions without executing them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Configuration file (defaults to ./geoaudit.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Audit every shapefile under a folder
    Run(RunArgs),

    /// List the shapefiles an audit would process
    Scan(ScanArgs),

    /// Show the effective configuration and where each value comes from
    Config,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Folder scanned recursively for .shp files
    pub input: PathBuf,

    /// Folder receiving snapped layers, the merged error layer and the summary
    pub output: PathBuf,

    /// Self-snapping tolerance in layer units
    #[arg(long)]
    pub snap_tolerance: Option<f64>,

    /// Minimum overlap area reported as an error
    #[arg(long)]
    pub min_overlap_area: Option<f64>,

    /// Features shorter than this are reported as short segments
    #[arg(long)]
    pub min_segment_length: Option<f64>,

    /// Consecutive vertices closer than this are merged
    #[arg(long)]
    pub duplicate_tolerance: Option<f64>,

    /// Name of the attribute column holding the error label
    #[arg(long)]
    pub error_field: Option<String>,

    /// Do not write a style sidecar for the merged error layer
    #[arg(long)]
    pub no_style: bool,
}

#[derive(Parser, Debug)]
pub struct ScanArgs {
    /// Folder scanned recursively for .shp files
    pub input: PathBuf,

    /// Output folder to leave out of the scan
    #[arg(long)]
    pub exclude: Option<PathBuf>,
}
