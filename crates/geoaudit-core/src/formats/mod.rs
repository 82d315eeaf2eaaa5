//! File formats read and written by the auditor
//!
//! Shapefiles are the only vector format. The summary report is a small CSV
//! in a single-byte code page and the style sidecar is a QGIS `.qml`
//! document.

pub mod qml;
pub mod shapefile;
pub mod summary_csv;

pub use qml::write_qml;
pub use shapefile::{has_extension, ShapefileReader, ShapefileWriter};
pub use summary_csv::{write_summary_csv, SUMMARY_HEADER};
