//! Summary report writer
//!
//! The report is consumed by spreadsheet tools that expect a legacy code
//! page, so it is written as ISO-8859-1. Characters outside Latin-1 become
//! `?`.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::models::SummaryRow;

/// Header line of the summary report
pub const SUMMARY_HEADER: [&str; 7] = [
    "code",
    "total_features",
    "total_errors",
    "category_count",
    "ratio",
    "start_time",
    "end_time",
];

/// Write `rows` to `path`, replacing any previous report
pub fn write_summary_csv(path: &Path, rows: &[SummaryRow]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, encode_latin1(&render_csv(rows)))?;
    tracing::debug!("Wrote {} summary rows to {}", rows.len(), path.display());
    Ok(())
}

fn render_csv(rows: &[SummaryRow]) -> String {
    let mut out = SUMMARY_HEADER.join(",");
    out.push_str("\r\n");

    for row in rows {
        let cells = [
            escape(&row.code),
            row.total_features.to_string(),
            row.total_errors.to_string(),
            row.category_count.to_string(),
            escape(&row.ratio),
            escape(&row.start_time),
            escape(&row.end_time),
        ];
        out.push_str(&cells.join(","));
        out.push_str("\r\n");
    }
    out
}

/// Quote a cell when it contains a delimiter, quote or line break
fn escape(cell: &str) -> String {
    if cell.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}
