//! geoaudit Geo - the default geometry engine
//!
//! Repair, snapping, validity tests and overlay operations on
//! `geo::Geometry<f64>`, with `rstar` indexes for the pairwise work.
//! [`GeoEngine`] exposes them through the core `GeometryEngine` port.

pub mod engine;
pub mod filter;
pub mod index;
pub mod models;
pub mod overlay;
pub mod repair;
pub mod snap;
pub mod validation;

pub use engine::GeoEngine;
