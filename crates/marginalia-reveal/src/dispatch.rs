//! Cursor change dispatcher.
//!
//! Collapses bursts of selection and document signals into one detection
//! cycle after a short debounce, and lets the engine skip cycles where the
//! caret has not moved.

use std::time::Duration;

use web_time::Instant;

use crate::schedule::DebounceTimer;
use crate::tree::UpdateTags;
use crate::types::CursorSnapshot;

#[derive(Debug, Clone)]
pub struct CursorDispatcher {
    debounce: Duration,
    timer: DebounceTimer,
    last_processed: Option<CursorSnapshot>,
}

impl CursorDispatcher {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            timer: DebounceTimer::new(),
            last_processed: None,
        }
    }

    /// Explicit selection change. Always accepted.
    pub fn selection_changed(&mut self, now: Instant) {
        self.timer.restart(now, self.debounce);
        tracing::trace!(target: "marginalia::dispatch", "selection changed, detection scheduled");
    }

    /// Document update. Undo/redo replays are ignored; returns whether the
    /// signal was accepted.
    pub fn document_updated(&mut self, tags: UpdateTags, now: Instant) -> bool {
        if tags.contains(UpdateTags::HISTORIC) {
            tracing::trace!(target: "marginalia::dispatch", "ignoring history replay");
            return false;
        }
        self.timer.restart(now, self.debounce);
        tracing::trace!(target: "marginalia::dispatch", ?tags, "document updated, detection scheduled");
        true
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    pub fn is_pending(&self) -> bool {
        self.timer.is_pending()
    }

    /// Whether the debounce window has elapsed. Consumes the deadline.
    pub fn take_due(&mut self, now: Instant) -> bool {
        self.timer.fire_if_due(now)
    }

    /// Drop the pending deadline without running detection.
    pub fn cancel(&mut self) {
        self.timer.cancel();
    }

    /// False when `snapshot` matches the last processed cycle.
    pub fn should_process(&self, snapshot: &CursorSnapshot) -> bool {
        self.last_processed.as_ref() != Some(snapshot)
    }

    pub fn mark_processed(&mut self, snapshot: CursorSnapshot) {
        self.last_processed = Some(snapshot);
    }

    /// Forget the last processed snapshot so the next cycle always runs.
    pub fn invalidate(&mut self) {
        self.last_processed = None;
    }
}
