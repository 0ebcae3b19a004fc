//! Progress reporting for reveal loops.
//!
//! Scroll passes and result pages are slow (several seconds each), so the
//! reveal controllers report every step through [`ProgressCallback`].
//! Rendering is left to callers: the CLI draws `indicatif` bars, tests and
//! library users pass [`NullProgress`].

use std::sync::Arc;

/// Receives progress updates from a running harvest.
pub trait ProgressCallback: Send + Sync {
    /// Sets the number of steps the current loop will take.
    fn set_total(&self, total: u64);

    /// Advances by `delta` steps.
    fn inc(&self, delta: u64);

    /// Replaces the status text shown next to the indicator.
    fn set_message(&self, msg: String);

    /// Marks the loop as complete with a final message.
    fn finish(&self, msg: String);

    /// Marks the loop as complete and removes the indicator.
    fn finish_and_clear(&self);
}

/// Discards every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
    fn finish_and_clear(&self) {}
}

/// Returns a shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
