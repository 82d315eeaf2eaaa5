//! Console adapter for the auditor's feedback port

use geoaudit_core::ports::Feedback;
use indicatif::ProgressBar;

use crate::output::OutputWriter;
use crate::progress::{create_progress_bar, finish_failure, finish_success};

/// Prints audit messages through the [`OutputWriter`] and advances a
/// progress bar per input file. In JSON mode messages go to the log and
/// the bar is hidden so stdout carries only the result document.
pub struct ConsoleFeedback<'a> {
    output: &'a OutputWriter,
    bar: ProgressBar,
}

impl<'a> ConsoleFeedback<'a> {
    pub fn new(output: &'a OutputWriter) -> Self {
        let bar = if output.is_json() {
            ProgressBar::hidden()
        } else {
            create_progress_bar(0, "Auditing shapefiles")
        };
        Self { output, bar }
    }

    pub fn finish(&self, message: &str) {
        finish_success(&self.bar, message);
    }

    /// Stop the bar where it is, leaving it on screen
    pub fn abandon(&self, message: &str) {
        finish_failure(&self.bar, message);
    }
}

impl Feedback for ConsoleFeedback<'_> {
    fn info(&self, message: &str) {
        if self.output.is_json() {
            tracing::info!("{}", message);
        } else {
            self.bar.suspend(|| self.output.info(message));
        }
    }

    fn warning(&self, message: &str) {
        self.bar.suspend(|| self.output.warning(message));
    }

    fn progress(&self, done: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(done as u64);
    }
}
