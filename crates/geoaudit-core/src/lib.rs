//! geoaudit Core - Domain models, configuration, ports and file formats
//!
//! This crate contains the layer model, the error taxonomy and the port
//! definitions that the geometry engine and the audit pipeline plug into.

pub mod config;
pub mod error;
pub mod formats;
pub mod models;
pub mod ports;

pub use error::{AuditError, Result};
