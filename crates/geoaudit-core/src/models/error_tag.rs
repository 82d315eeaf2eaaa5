use serde::Serialize;
use std::fmt;

/// RGB render color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const BROWN: Color = Color::rgb(165, 42, 42);
    pub const GREEN: Color = Color::rgb(0, 128, 0);
    pub const ORANGE: Color = Color::rgb(255, 165, 0);
    pub const RED: Color = Color::rgb(255, 0, 0);

    /// `#rrggbb`
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Category of geometry defect reported by the auditor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ErrorTag {
    /// Two features share an area
    Overlap,
    /// Linear length below the minimum
    ShortSegment,
    /// Geometry fails the validity test
    SelfIntersection,
    /// Feature made of more than one part
    MultiPart,
}

impl ErrorTag {
    pub const ALL: [ErrorTag; 4] = [
        ErrorTag::Overlap,
        ErrorTag::ShortSegment,
        ErrorTag::SelfIntersection,
        ErrorTag::MultiPart,
    ];

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorTag::Overlap => "G001",
            ErrorTag::ShortSegment => "G002",
            ErrorTag::SelfIntersection => "G003",
            ErrorTag::MultiPart => "G006",
        }
    }

    /// Display label, also the value written into the tag column
    pub fn label(&self) -> &'static str {
        match self {
            ErrorTag::Overlap => "Overlap",
            ErrorTag::ShortSegment => "ShortSegment",
            ErrorTag::SelfIntersection => "SelfIntersection",
            ErrorTag::MultiPart => "MultiPart",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            ErrorTag::Overlap => Color::BROWN,
            ErrorTag::ShortSegment => Color::GREEN,
            ErrorTag::SelfIntersection => Color::ORANGE,
            ErrorTag::MultiPart => Color::RED,
        }
    }

    pub fn from_code(code: &str) -> Option<ErrorTag> {
        Self::ALL.into_iter().find(|t| t.code().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for ErrorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.label())
    }
}
