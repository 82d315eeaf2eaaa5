use geoaudit_core::config::{AuditSettings, ConfigSource};
use geoaudit_core::models::{ErrorTag, FileReport, FileStatus, ShapefileSource, SummaryRow};
use serde::Serialize;
use std::collections::BTreeMap;
use tabled::Tabled;

/// Output for run command
#[derive(Debug, Serialize)]
pub struct RunOutput {
    pub input: String,
    pub output: String,
    pub settings: AuditSettings,
    pub files: Vec<FileReport>,
    pub total_features: usize,
    pub total_errors: usize,
    pub categories: Vec<SummaryRow>,
    pub merged_layers: Vec<String>,
    pub summary_csv: Option<String>,
}

/// Output for scan command
#[derive(Debug, Serialize)]
pub struct ScanOutput {
    pub input: String,
    pub shapefiles: Vec<ShapefileSource>,
}

/// Output for config command
#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    pub config_file: Option<String>,
    pub values: BTreeMap<String, ConfigEntry>,
}

#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub value: String,
    pub source: ConfigSource,
}

/// Per-file line of the run table
#[derive(Tabled)]
pub struct FileRow {
    #[tabled(rename = "Layer")]
    pub name: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Features")]
    pub features: String,
    #[tabled(rename = "Flagged")]
    pub flagged: String,
}

impl From<&FileReport> for FileRow {
    fn from(report: &FileReport) -> Self {
        match &report.status {
            FileStatus::Processed { features, flagged, .. } => Self {
                name: report.name.clone(),
                status: "processed".to_string(),
                features: features.to_string(),
                flagged: flagged.to_string(),
            },
            FileStatus::Skipped { reason } => Self {
                name: report.name.clone(),
                status: format!("skipped: {}", reason),
                features: "-".to_string(),
                flagged: "-".to_string(),
            },
        }
    }
}

/// Per-category line of the run table
#[derive(Tabled)]
pub struct CategoryRow {
    #[tabled(rename = "Code")]
    pub code: String,
    #[tabled(rename = "Error")]
    pub label: String,
    #[tabled(rename = "Count")]
    pub count: usize,
    #[tabled(rename = "Ratio")]
    pub ratio: String,
    #[tabled(rename = "Color")]
    pub color: String,
}

impl From<&SummaryRow> for CategoryRow {
    fn from(row: &SummaryRow) -> Self {
        let tag = ErrorTag::from_code(&row.code);
        Self {
            code: row.code.clone(),
            label: tag.map(|t| t.label().to_string()).unwrap_or_default(),
            count: row.category_count,
            ratio: row.ratio.clone(),
            color: tag.map(|t| t.color().hex()).unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
pub struct ScanRow {
    #[tabled(rename = "Layer")]
    pub name: String,
    #[tabled(rename = "Path")]
    pub path: String,
}

#[derive(Tabled)]
pub struct ConfigRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}
