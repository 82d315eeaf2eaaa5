//! Error types for geoaudit

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    // Input errors
    #[error("No shapefiles found under {path}")]
    NoInput { path: PathBuf },

    #[error("Input folder not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Failed to load layer {path}: {reason}")]
    LayerLoad { path: PathBuf, reason: String },

    // Format errors
    #[error("{format} error: {message}")]
    FormatError { format: String, message: String },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AuditError {
    /// Shorthand for a shapefile format error
    pub fn shapefile(message: impl Into<String>) -> Self {
        AuditError::FormatError { format: "Shapefile".to_string(), message: message.into() }
    }

    /// Whether the error only concerns a single input file
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AuditError::LayerLoad { .. })
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;
