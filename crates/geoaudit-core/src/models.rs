pub mod error_tag;
pub mod layer;
pub mod source;
pub mod style;
pub mod summary;

pub use error_tag::{Color, ErrorTag};
pub use layer::{AttributeValue, Feature, FieldDef, FieldKind, GeometryFamily, Layer};
pub use source::ShapefileSource;
pub use style::{CategorizedRenderer, RendererCategory};
pub use summary::{ErrorCounts, FileReport, FileStatus, RunSummary, SummaryRow};
