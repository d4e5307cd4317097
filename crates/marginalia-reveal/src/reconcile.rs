//! Reveal/hide reconciler.
//!
//! Owns the five focus slots and turns each freshly detected `FocusState`
//! into a `FocusDiff`. The inline slot gets one extra rule: a caret sitting
//! on the revealed raw node, or right against its edge, keeps the reveal
//! alive even though the detector sees no formatted run there.

use crate::focus::{FocusDiff, FocusState};
use crate::tree::{DocumentTree, NodeKind};
use crate::types::{NodeKey, Point, PointKind};

#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    state: FocusState,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Focus as of the last reconciled cycle.
    pub fn state(&self) -> &FocusState {
        &self.state
    }

    /// Diff `detected` against the stored state and store it.
    ///
    /// `raw_key` is the node currently standing in for the revealed run.
    pub fn reconcile<T: DocumentTree + ?Sized>(
        &mut self,
        tree: &T,
        mut detected: FocusState,
        raw_key: Option<&NodeKey>,
    ) -> FocusDiff {
        if detected.inline.is_none() && self.state.inline.is_some() {
            let selection = tree.selection();
            let keep = match (selection.as_ref().and_then(|s| s.caret()), raw_key) {
                (Some(caret), Some(raw_key)) => is_adjacent_to_raw(tree, caret, raw_key),
                _ => false,
            };
            if keep {
                tracing::trace!(target: "marginalia::reveal", "caret against revealed run, keeping it");
                detected.inline = self.state.inline.clone();
            }
        }

        let diff = self.state.diff(&detected);
        self.state = detected;
        diff
    }

    /// Forget the inline focus after a failed or stale swap.
    pub fn clear_inline(&mut self) {
        self.state.inline = None;
    }

    /// Empty every slot, returning what was stored.
    pub fn take(&mut self) -> FocusState {
        std::mem::take(&mut self.state)
    }
}

/// Whether the caret should keep the reveal of `raw_key` alive.
///
/// True when the caret is on the raw node itself, at offset 0 of a run whose
/// previous sibling is the raw node, at the end of a run whose next sibling
/// is the raw node, or at an element child index directly before or after
/// the raw node. Only the immediate neighbour counts: a caret two runs away
/// is outside even if the run between them is empty.
pub fn is_adjacent_to_raw<T: DocumentTree + ?Sized>(
    tree: &T,
    caret: &Point,
    raw_key: &NodeKey,
) -> bool {
    if !matches!(tree.kind(raw_key), Some(NodeKind::RawMarkdown(_))) {
        return false;
    }
    if &caret.key == raw_key {
        return true;
    }

    match caret.kind {
        PointKind::Text => {
            let at_start = caret.offset == 0;
            let at_end = caret.offset >= tree.text_len(&caret.key);
            (at_start && tree.previous_sibling(&caret.key) == Some(raw_key))
                || (at_end && tree.next_sibling(&caret.key) == Some(raw_key))
        }
        PointKind::Element => {
            let children = tree.children(&caret.key);
            let before = caret.offset.checked_sub(1).and_then(|ix| children.get(ix));
            let after = children.get(caret.offset);
            before == Some(raw_key) || after == Some(raw_key)
        }
    }
}
