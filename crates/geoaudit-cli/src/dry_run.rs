//! What `run --dry-run` reports instead of auditing

use crate::output::OutputWriter;
use geoaudit_core::config::AuditSettings;
use geoaudit_core::models::ShapefileSource;
use geoaudit_pipeline::OutputLayout;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    CreateDir,
    Audit,
    /// Only written when the audit flags something
    WriteIfFlagged,
}

impl StepKind {
    fn tag(self) -> &'static str {
        match self {
            StepKind::CreateDir => "mkdir",
            StepKind::Audit => "audit",
            StepKind::WriteIfFlagged => "write?",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanStep {
    pub kind: StepKind,
    pub target: String,
    pub notes: Vec<String>,
}

impl PlanStep {
    fn new(kind: StepKind, target: impl Into<String>) -> Self {
        Self { kind, target: target.into(), notes: Vec::new() }
    }

    fn note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

/// Ordered steps a run over the discovered sources would take
#[derive(Debug, Clone, Serialize)]
pub struct RunPlan {
    pub steps: Vec<PlanStep>,
}

impl RunPlan {
    pub fn build(sources: &[ShapefileSource], layout: &OutputLayout, settings: &AuditSettings) -> Self {
        let mut steps = vec![PlanStep::new(StepKind::CreateDir, layout.snapped_dir().display().to_string())];

        steps.extend(sources.iter().map(|source| {
            PlanStep::new(StepKind::Audit, source.path.display().to_string())
                .note(format!(
                    "split, fix, drop duplicate vertices within {}, snap within {}",
                    settings.duplicate_tolerance, settings.snap_tolerance
                ))
                .note(format!("snapped copy -> {}", layout.snapped_path(source).display()))
                .note(format!(
                    "flag overlaps over {}, segments under {}, invalid rings, multipart",
                    settings.min_overlap_area, settings.min_segment_length
                ))
        }));

        let mut merged = PlanStep::new(StepKind::WriteIfFlagged, layout.merged_path(None).display().to_string())
            .note(format!("label column {}", settings.error_field));
        if settings.apply_style {
            merged = merged.note("with a categorized .qml style");
        }
        steps.push(merged);
        steps.push(PlanStep::new(StepKind::WriteIfFlagged, layout.summary_path().display().to_string()));

        Self { steps }
    }

    /// Print the plan, or emit it as the JSON result document
    pub fn display(&self, output: &OutputWriter) -> anyhow::Result<()> {
        if output.is_json() {
            return output.result(serde_json::json!({
                "dry_run": true,
                "steps": self.steps,
            }));
        }

        output.section("Dry run");
        for step in &self.steps {
            output.info(format!("[{}] {}", step.kind.tag(), step.target));
            for note in &step.notes {
                output.info(format!("        {}", note));
            }
        }
        output.info("Nothing was written.");
        Ok(())
    }
}
