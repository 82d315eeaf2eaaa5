//! Run-wide accounting: error counts, the summary rows written to CSV and
//! per-file outcomes.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::PathBuf;

use super::error_tag::ErrorTag;

/// Timestamp layout used in the summary report
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Occurrence count per error category, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorCounts {
    entries: Vec<(ErrorTag, usize)>,
}

impl ErrorCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` occurrences of `tag`. Zero counts are ignored so that a
    /// category only appears once something was flagged.
    pub fn add(&mut self, tag: ErrorTag, count: usize) {
        if count == 0 {
            return;
        }
        match self.entries.iter_mut().find(|(t, _)| *t == tag) {
            Some((_, existing)) => *existing += count,
            None => self.entries.push((tag, count)),
        }
    }

    pub fn get(&self, tag: ErrorTag) -> usize {
        self.entries.iter().find(|(t, _)| *t == tag).map(|(_, c)| *c).unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ErrorTag, usize)> + '_ {
        self.entries.iter().copied()
    }
}

/// Share of `count` in `total` as written to the report
pub fn format_ratio(count: usize, total: usize) -> String {
    if total == 0 {
        return "0%".to_string();
    }
    format!("{:.1}%", count as f64 / total as f64 * 100.0)
}

/// One CSV row of the summary report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub code: String,
    pub total_features: usize,
    pub total_errors: usize,
    pub category_count: usize,
    pub ratio: String,
    pub start_time: String,
    pub end_time: String,
}

/// Totals of one audit run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total_features: usize,
    pub counts: ErrorCounts,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

impl RunSummary {
    pub fn total_errors(&self) -> usize {
        self.counts.total()
    }

    /// Report rows. `total_features` is the run-wide figure on every row.
    pub fn rows(&self) -> Vec<SummaryRow> {
        let total_errors = self.total_errors();
        let start_time = self.started_at.format(TIMESTAMP_FORMAT).to_string();
        let end_time = self.finished_at.format(TIMESTAMP_FORMAT).to_string();

        self.counts
            .iter()
            .map(|(tag, count)| SummaryRow {
                code: tag.code().to_string(),
                total_features: self.total_features,
                total_errors,
                category_count: count,
                ratio: format_ratio(count, total_errors),
                start_time: start_time.clone(),
                end_time: end_time.clone(),
            })
            .collect()
    }
}

/// Outcome of one input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Processed { features: usize, flagged: usize, snapped_path: PathBuf },
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub name: String,
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: FileStatus,
}

impl FileReport {
    pub fn is_skipped(&self) -> bool {
        matches!(self.status, FileStatus::Skipped { .. })
    }
}
