use serde::Serialize;

use super::error_tag::{Color, ErrorTag};

/// One value-to-symbol rule of a categorized renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RendererCategory {
    pub value: String,
    pub label: String,
    pub color: Color,
}

/// Display rule assigning a color per attribute value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorizedRenderer {
    pub field: String,
    pub categories: Vec<RendererCategory>,
}

impl CategorizedRenderer {
    pub fn new(field: impl Into<String>) -> Self {
        Self { field: field.into(), categories: Vec::new() }
    }

    pub fn with_category(mut self, value: impl Into<String>, color: Color) -> Self {
        let value = value.into();
        self.categories.push(RendererCategory { label: value.clone(), value, color });
        self
    }

    /// Fixed palette for the audit error labels
    pub fn for_error_tags(field: impl Into<String>) -> Self {
        ErrorTag::ALL
            .iter()
            .fold(Self::new(field), |renderer, tag| renderer.with_category(tag.label(), tag.color()))
    }
}
