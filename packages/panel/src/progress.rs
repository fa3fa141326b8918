//! Progress reporting trait for panel generation.
//!
//! Decouples progress reporting from any specific rendering backend
//! (e.g., `indicatif` progress bars, log-only reporting, or silence).
//! Implementations are provided upstream in crates that choose a
//! rendering strategy.

use std::sync::Arc;

/// Trait for reporting progress from a generation run.
///
/// Implementations must be `Send + Sync` so a shared panel cache can
/// report progress from whichever thread triggers a regeneration.
pub trait ProgressCallback: Send + Sync {
    /// Set the total expected units of work (one unit per country).
    fn set_total(&self, total: u64);

    /// Advance progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);
}

/// A no-op implementation of [`ProgressCallback`] that silently ignores
/// all progress updates.
///
/// Useful for library callers and tests that do not need visual progress
/// reporting.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`] instance for convenient use.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
