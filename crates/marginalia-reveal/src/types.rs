//! Core cursor types: node keys, selection points, and cursor snapshots.
//!
//! These types are framework-agnostic and mirror the selection model of
//! key-addressed document trees: a point names a node by key and an offset
//! inside it.

use smol_str::SmolStr;

/// Stable identity of a node in the document tree.
///
/// Keys are short strings, so `SmolStr` keeps them inline and cheap to clone.
pub type NodeKey = SmolStr;

/// What a point's offset counts.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default)]
pub enum PointKind {
    /// Offset is a character offset into a text node (NOT a byte offset!)
    #[default]
    Text,
    /// Offset is a child index into an element node.
    Element,
}

/// One end of a selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Point {
    pub key: NodeKey,
    pub offset: usize,
    pub kind: PointKind,
}

impl Point {
    /// Create a point inside a text node.
    pub fn text(key: impl Into<NodeKey>, offset: usize) -> Self {
        Self {
            key: key.into(),
            offset,
            kind: PointKind::Text,
        }
    }

    /// Create a point between the children of an element node.
    pub fn element(key: impl Into<NodeKey>, offset: usize) -> Self {
        Self {
            key: key.into(),
            offset,
            kind: PointKind::Element,
        }
    }
}

/// Selection in the document tree with anchor and focus points.
///
/// The anchor is where the selection started, the focus is where the cursor is now.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeSelection {
    pub anchor: Point,
    pub focus: Point,
}

impl TreeSelection {
    /// Create a new selection.
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    /// Create a collapsed selection (caret).
    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    /// Check if the selection is collapsed (caret only).
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// The caret point, if the selection is collapsed.
    pub fn caret(&self) -> Option<&Point> {
        self.is_collapsed().then_some(&self.anchor)
    }

    /// Rewrite any point that references `from` so it references `to`.
    ///
    /// Used when a node is replaced in place: offsets stay valid because the
    /// replacement carries the same text.
    pub fn rekey(&mut self, from: &NodeKey, to: &NodeKey) {
        for point in [&mut self.anchor, &mut self.focus] {
            if &point.key == from {
                point.key = to.clone();
            }
        }
    }
}

/// The part of the selection the dispatcher compares between cycles.
///
/// Two snapshots being equal means the cursor has not semantically moved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CursorSnapshot {
    /// Collapsed selection at `(key, offset)`.
    Caret { key: NodeKey, offset: usize },
    /// A non-collapsed selection. Ranges never reveal anything.
    Range,
    /// No selection at all (editor blurred).
    Empty,
}

impl CursorSnapshot {
    /// Build a snapshot from the current selection.
    pub fn of(selection: Option<&TreeSelection>) -> Self {
        match selection {
            None => CursorSnapshot::Empty,
            Some(sel) => match sel.caret() {
                Some(point) => CursorSnapshot::Caret {
                    key: point.key.clone(),
                    offset: point.offset,
                },
                None => CursorSnapshot::Range,
            },
        }
    }
}
