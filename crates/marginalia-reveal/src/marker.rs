//! Block prefix and fence injection.
//!
//! Each block kind runs its own small state machine. A newly focused block
//! gets its markers scheduled for the next frame rather than inserted at
//! once; if focus moves on before the frame, the pending insertion is
//! simply replaced or dropped. Focus that stays on the same block with a
//! changed descriptor updates the marker text in place.

use smol_str::SmolStr;

use crate::config::RevealConfig;
use crate::focus::FocusState;
use crate::platform::{MarkerEdge, MarkerSurface};
use crate::syntax;
use crate::types::NodeKey;

/// The four block kinds that carry markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Heading,
    Blockquote,
    ListItem,
    CodeBlock,
}

impl BlockKind {
    pub const ALL: [BlockKind; 4] = [
        BlockKind::Heading,
        BlockKind::Blockquote,
        BlockKind::ListItem,
        BlockKind::CodeBlock,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Heading => "heading",
            BlockKind::Blockquote => "blockquote",
            BlockKind::ListItem => "list-item",
            BlockKind::CodeBlock => "code-block",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Markers one focused block should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerPlan {
    pub key: NodeKey,
    pub markers: Vec<(MarkerEdge, SmolStr)>,
}

impl MarkerPlan {
    fn same_layout(&self, other: &MarkerPlan) -> bool {
        self.key == other.key
            && self.markers.len() == other.markers.len()
            && self
                .markers
                .iter()
                .zip(&other.markers)
                .all(|((a, _), (b, _))| a == b)
    }
}

/// Marker plans for every focused block in `state`, indexed by `BlockKind`.
pub fn plan_markers(state: &FocusState, config: &RevealConfig) -> [Option<MarkerPlan>; 4] {
    let start = |key: &NodeKey, text: SmolStr| MarkerPlan {
        key: key.clone(),
        markers: vec![(MarkerEdge::Start, text)],
    };

    [
        state
            .heading
            .as_ref()
            .map(|h| start(&h.key, syntax::heading_prefix(h))),
        state
            .blockquote
            .as_ref()
            .map(|q| start(&q.key, syntax::quote_prefix(q))),
        state
            .list_item
            .as_ref()
            .map(|li| start(&li.key, syntax::list_prefix(li, config.list_indent))),
        state.code_block.as_ref().map(|code| {
            let mut markers = Vec::with_capacity(2);
            if code.fence.has_open() {
                markers.push((MarkerEdge::Start, syntax::open_fence(&code.language)));
            }
            if code.fence.has_close() {
                markers.push((MarkerEdge::End, SmolStr::new_static(syntax::CLOSE_FENCE)));
            }
            MarkerPlan {
                key: code.key.clone(),
                markers,
            }
        }),
    ]
}

#[derive(Debug)]
enum Slot<M> {
    Unfocused,
    /// Waiting for the next frame.
    Pending(MarkerPlan),
    Placed { plan: MarkerPlan, handles: Vec<M> },
    /// Element was not rendered at the last frame; retried next cycle.
    Missing(MarkerPlan),
}

impl<M> Default for Slot<M> {
    fn default() -> Self {
        Slot::Unfocused
    }
}

/// Marker state for the four block kinds.
#[derive(Debug)]
pub struct BlockMarkers<M> {
    slots: [Slot<M>; 4],
}

impl<M> Default for BlockMarkers<M> {
    fn default() -> Self {
        Self {
            slots: [
                Slot::Unfocused,
                Slot::Unfocused,
                Slot::Unfocused,
                Slot::Unfocused,
            ],
        }
    }
}

impl<M> BlockMarkers<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring every slot in line with the focused blocks of `state`.
    ///
    /// Removals and in-place updates happen now; insertions wait for
    /// `flush_frame`.
    pub fn sync<S>(&mut self, state: &FocusState, config: &RevealConfig, surface: &mut S)
    where
        S: MarkerSurface<Marker = M>,
    {
        let plans = plan_markers(state, config);
        for (kind, plan) in BlockKind::ALL.into_iter().zip(plans) {
            let slot = std::mem::take(&mut self.slots[kind.index()]);
            self.slots[kind.index()] = transition(kind, slot, plan, surface);
        }
    }

    /// Whether a marker insertion is waiting for a frame.
    pub fn needs_frame(&self) -> bool {
        self.slots.iter().any(|s| matches!(s, Slot::Pending(_)))
    }

    /// Insert every pending marker.
    pub fn flush_frame<S>(&mut self, surface: &mut S)
    where
        S: MarkerSurface<Marker = M>,
    {
        for kind in BlockKind::ALL {
            let slot = &mut self.slots[kind.index()];
            let Slot::Pending(plan) = std::mem::take(slot) else {
                continue;
            };
            *slot = place(kind, plan, surface);
        }
    }

    /// Cancel pending insertions and remove every placed marker.
    pub fn clear<S>(&mut self, surface: &mut S)
    where
        S: MarkerSurface<Marker = M>,
    {
        for slot in &mut self.slots {
            if let Slot::Placed { handles, .. } = std::mem::take(slot) {
                for handle in handles {
                    surface.remove_marker(handle);
                }
            }
        }
    }

    /// Plan currently shown (or about to be shown) for one kind.
    pub fn plan(&self, kind: BlockKind) -> Option<&MarkerPlan> {
        match &self.slots[kind.index()] {
            Slot::Unfocused => None,
            Slot::Pending(plan) | Slot::Missing(plan) | Slot::Placed { plan, .. } => Some(plan),
        }
    }

    /// Whether the markers for one kind are on screen.
    pub fn is_placed(&self, kind: BlockKind) -> bool {
        matches!(self.slots[kind.index()], Slot::Placed { .. })
    }
}

fn transition<S: MarkerSurface>(
    kind: BlockKind,
    slot: Slot<S::Marker>,
    plan: Option<MarkerPlan>,
    surface: &mut S,
) -> Slot<S::Marker> {
    match (slot, plan) {
        (Slot::Unfocused, None) => Slot::Unfocused,
        (Slot::Pending(_) | Slot::Missing(_), None) => {
            tracing::trace!(target: "marginalia::marker", kind = kind.as_str(), "pending markers cancelled");
            Slot::Unfocused
        }
        (Slot::Placed { handles, plan: old }, None) => {
            tracing::debug!(target: "marginalia::marker", kind = kind.as_str(), key = %old.key, "removing markers");
            remove_all(handles, surface);
            Slot::Unfocused
        }
        (Slot::Unfocused | Slot::Pending(_) | Slot::Missing(_), Some(plan)) => Slot::Pending(plan),
        (Slot::Placed { plan: old, handles }, Some(plan)) => {
            if !old.same_layout(&plan) {
                tracing::debug!(
                    target: "marginalia::marker",
                    kind = kind.as_str(),
                    from = %old.key,
                    to = %plan.key,
                    "marker layout changed, re-inserting"
                );
                remove_all(handles, surface);
                return Slot::Pending(plan);
            }
            for (handle, ((_, old_text), (_, new_text))) in
                handles.iter().zip(old.markers.iter().zip(&plan.markers))
            {
                if old_text != new_text {
                    tracing::trace!(target: "marginalia::marker", kind = kind.as_str(), text = %new_text, "updating marker");
                    surface.update_marker(handle, new_text);
                }
            }
            Slot::Placed { plan, handles }
        }
    }
}

fn place<S: MarkerSurface>(kind: BlockKind, plan: MarkerPlan, surface: &mut S) -> Slot<S::Marker> {
    let mut handles = Vec::with_capacity(plan.markers.len());
    for (edge, text) in &plan.markers {
        match surface.insert_marker(&plan.key, *edge, text) {
            Some(handle) => handles.push(handle),
            None => break,
        }
    }
    if handles.len() < plan.markers.len() {
        tracing::debug!(
            target: "marginalia::marker",
            kind = kind.as_str(),
            key = %plan.key,
            "element not rendered, skipping markers this cycle"
        );
        remove_all(handles, surface);
        return Slot::Missing(plan);
    }
    tracing::debug!(target: "marginalia::marker", kind = kind.as_str(), key = %plan.key, "markers inserted");
    Slot::Placed { plan, handles }
}

fn remove_all<S: MarkerSurface>(handles: Vec<S::Marker>, surface: &mut S) {
    for handle in handles {
        surface.remove_marker(handle);
    }
}
