//! geoaudit Pipeline - batch audit orchestration
//!
//! Discovers shapefiles, runs each through the fixed repair and snap
//! sequence, applies the checks, and writes the merged error layer and the
//! summary report. Geometry work goes through the `GeometryEngine` port and
//! IO through `LayerStore` / `LayerRegistry`.

pub mod auditor;
pub mod discovery;
pub mod layout;
pub mod store;

pub use auditor::{AuditOutcome, Auditor};
pub use discovery::discover_shapefiles;
pub use layout::OutputLayout;
pub use store::{QmlStyleRegistry, ShapefileStore};
