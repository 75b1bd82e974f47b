//! Progress sink abstraction.
//!
//! The migration engine reports progress through a [`ProgressSink`] passed in
//! by the caller. The engine never prints on its own; sinks decide whether
//! updates become a progress bar, test events, or nothing.

/// Receives progress updates from a migration run.
///
/// All methods should be cheap and must not panic on odd input
/// (e.g. `current > total`).
pub trait ProgressSink: Send + Sync {
    /// Progress for a named stage. `current` counts finished items.
    fn report(&self, stage: &str, current: usize, total: usize);

    fn start_stage(&self, name: &str);

    /// Called when a stage finishes, successfully or not.
    fn complete_stage(&self, name: &str);

    /// A warning that should not interrupt the progress display.
    fn warn(&self, message: &str);
}

impl<P: ProgressSink + ?Sized> ProgressSink for &P {
    fn report(&self, stage: &str, current: usize, total: usize) {
        (**self).report(stage, current, total)
    }

    fn start_stage(&self, name: &str) {
        (**self).start_stage(name)
    }

    fn complete_stage(&self, name: &str) {
        (**self).complete_stage(name)
    }

    fn warn(&self, message: &str) {
        (**self).warn(message)
    }
}
