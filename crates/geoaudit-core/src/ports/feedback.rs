/// Progress and message sink of the host running an audit
pub trait Feedback {
    fn info(&self, message: &str);

    fn warning(&self, message: &str);

    /// Called after each input file with the number of files done
    fn progress(&self, _done: usize, _total: usize) {}
}

/// Feedback that forwards to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFeedback;

impl Feedback for TracingFeedback {
    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn warning(&self, message: &str) {
        tracing::warn!("{}", message);
    }
}
