//! Port trait definitions
//!
//! These traits define the interfaces that adapters must implement.

pub mod engine;
pub mod feedback;
pub mod storage;

pub use engine::{FeatureFilter, GeometryEngine};
pub use feedback::{Feedback, TracingFeedback};
pub use storage::{LayerRegistry, LayerStore, NoopRegistry};
