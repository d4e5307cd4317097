//! The reveal engine.
//!
//! One engine per editor instance. The host forwards selection and document
//! signals, asks `next_deadline` when to call `poll`, and calls
//! `flush_frame` on its next paint when `needs_frame` is true:
//!
//! ```text
//! signal -> dispatcher (debounce) -> poll -> detect_all -> reconcile
//!        -> inline swap | block markers (sync now, insert next frame)
//! ```

use web_time::Instant;

use crate::config::RevealConfig;
use crate::detect::detect_all;
use crate::dispatch::CursorDispatcher;
use crate::error::SwapError;
use crate::focus::{FocusDiff, FocusState, InlineRegion, SlotChange};
use crate::marker::BlockMarkers;
use crate::platform::MarkerSurface;
use crate::reconcile::Reconciler;
use crate::schedule::{Clock, SystemClock};
use crate::swap::{InlineSwapper, RevealedNode};
use crate::tree::{DocumentTree, UpdateTags};
use crate::types::CursorSnapshot;

pub struct RevealEngine<S: MarkerSurface, C: Clock = SystemClock> {
    config: RevealConfig,
    clock: C,
    dispatcher: CursorDispatcher,
    reconciler: Reconciler,
    swapper: InlineSwapper,
    markers: BlockMarkers<S::Marker>,
}

impl<S: MarkerSurface> RevealEngine<S, SystemClock> {
    pub fn new(config: RevealConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<S: MarkerSurface, C: Clock> RevealEngine<S, C> {
    pub fn with_clock(config: RevealConfig, clock: C) -> Self {
        Self {
            dispatcher: CursorDispatcher::new(config.debounce()),
            config,
            clock,
            reconciler: Reconciler::new(),
            swapper: InlineSwapper::new(),
            markers: BlockMarkers::new(),
        }
    }

    pub fn config(&self) -> &RevealConfig {
        &self.config
    }

    /// Focus as of the last processed cycle.
    pub fn focus(&self) -> &FocusState {
        self.reconciler.state()
    }

    /// Restoration record of the active inline reveal.
    pub fn revealed(&self) -> Option<&RevealedNode> {
        self.swapper.revealed()
    }

    pub fn markers(&self) -> &BlockMarkers<S::Marker> {
        &self.markers
    }

    // === Signals ===

    pub fn selection_changed(&mut self) {
        self.dispatcher.selection_changed(self.clock.now());
    }

    /// Forward a document update. Returns false for ignored history replays.
    pub fn document_updated(&mut self, tags: UpdateTags) -> bool {
        self.dispatcher.document_updated(tags, self.clock.now())
    }

    // === Driving ===

    /// When the host should next call `poll`.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.dispatcher.deadline()
    }

    /// Whether marker insertions are waiting for `flush_frame`.
    pub fn needs_frame(&self) -> bool {
        self.markers.needs_frame()
    }

    /// Run a detection cycle if the debounce window has elapsed.
    ///
    /// Returns `None` when nothing was due or the caret has not moved since
    /// the last processed cycle.
    pub fn poll<T: DocumentTree + ?Sized>(
        &mut self,
        tree: &mut T,
        surface: &mut S,
    ) -> Option<FocusDiff> {
        if !self.dispatcher.take_due(self.clock.now()) {
            return None;
        }
        self.run_cycle(tree, surface)
    }

    /// Run a detection cycle now, cancelling any pending debounce.
    pub fn process_now<T: DocumentTree + ?Sized>(
        &mut self,
        tree: &mut T,
        surface: &mut S,
    ) -> Option<FocusDiff> {
        self.dispatcher.cancel();
        self.run_cycle(tree, surface)
    }

    /// Insert the markers scheduled by the last cycle. Call on the next paint.
    pub fn flush_frame(&mut self, surface: &mut S) {
        self.markers.flush_frame(surface);
    }

    /// Tear down all reveal state: cancel the debounce, cancel pending
    /// markers, remove placed markers and hide the inline reveal.
    ///
    /// The engine can be reused afterwards; its next cycle starts fresh.
    pub fn dispose<T: DocumentTree + ?Sized>(&mut self, tree: &mut T, surface: &mut S) {
        self.dispatcher.cancel();
        self.dispatcher.invalidate();
        self.markers.clear(surface);
        self.hide_inline(tree);
        self.reconciler.take();
        tracing::debug!(target: "marginalia::reveal", "reveal engine disposed");
    }

    fn run_cycle<T: DocumentTree + ?Sized>(
        &mut self,
        tree: &mut T,
        surface: &mut S,
    ) -> Option<FocusDiff> {
        let snapshot = CursorSnapshot::of(tree.selection().as_ref());
        if !self.dispatcher.should_process(&snapshot) {
            tracing::trace!(target: "marginalia::dispatch", "caret unchanged, skipping cycle");
            return None;
        }

        let mut diff = {
            let tree = &*tree;
            let detected = detect_all(tree, &self.config);
            self.reconciler
                .reconcile(tree, detected, self.swapper.raw_key())
        };

        diff.inline = self.apply_inline(tree, diff.inline);
        self.markers
            .sync(self.reconciler.state(), &self.config, surface);
        log_transitions(&diff);

        // Swaps move the caret to new keys; compare against where it is now.
        self.dispatcher
            .mark_processed(CursorSnapshot::of(tree.selection().as_ref()));
        Some(diff)
    }

    /// Perform the swaps for an inline slot change. Returns the change that
    /// actually happened.
    fn apply_inline<T: DocumentTree + ?Sized>(
        &mut self,
        tree: &mut T,
        change: SlotChange<InlineRegion>,
    ) -> SlotChange<InlineRegion> {
        // A hide the tree refused earlier leaves a record with no focus; retry it.
        let stuck = self.swapper.revealed().is_some() && self.reconciler.state().inline.is_none();
        if change.stopped().is_some() || stuck {
            self.hide_inline(tree);
        }
        let Some(region) = change.started() else {
            return change;
        };

        match self
            .swapper
            .reveal(tree, &region.key, self.config.handled_formats)
        {
            Ok(_) => change,
            Err(err) => {
                log_swap_error(&err, "reveal");
                self.reconciler.clear_inline();
                match change {
                    SlotChange::Replaced { from, .. } => SlotChange::Stopped(from),
                    _ => SlotChange::Unchanged,
                }
            }
        }
    }

    fn hide_inline<T: DocumentTree + ?Sized>(&mut self, tree: &mut T) {
        if let Err(err) = self.swapper.hide(tree) {
            log_swap_error(&err, "hide");
        }
    }
}

fn log_swap_error(err: &SwapError, op: &'static str) {
    if err.is_stale() {
        tracing::debug!(target: "marginalia::swap", op, error = %err, "swap abandoned");
    } else {
        tracing::warn!(target: "marginalia::swap", op, error = %err, "swap failed");
    }
}

fn log_transitions(diff: &FocusDiff) {
    fn log<T: std::fmt::Debug>(kind: &'static str, change: &SlotChange<T>) {
        match change {
            SlotChange::Unchanged => {}
            SlotChange::Started(to) => {
                tracing::debug!(target: "marginalia::reveal", kind, ?to, "focus started")
            }
            SlotChange::Stopped(from) => {
                tracing::debug!(target: "marginalia::reveal", kind, ?from, "focus stopped")
            }
            SlotChange::Replaced { from, to } => {
                tracing::debug!(target: "marginalia::reveal", kind, ?from, ?to, "focus replaced")
            }
        }
    }

    log("inline", &diff.inline);
    log("heading", &diff.heading);
    log("blockquote", &diff.blockquote);
    log("list-item", &diff.list_item);
    log("code-block", &diff.code_block);
}
