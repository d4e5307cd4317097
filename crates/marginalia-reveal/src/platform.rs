//! Presentation abstraction for block markers.
//!
//! The core never touches rendered elements directly. It asks a
//! `MarkerSurface` to put an inert, read-only marker at one edge of the
//! element that renders a node, and later to change or remove it. The
//! browser implementation inserts DOM spans; `MemorySurface` keeps markers
//! as plain text for tests and non-DOM hosts.

use crate::types::NodeKey;

/// Which edge of a rendered element a marker sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerEdge {
    /// Prepended before the element's content.
    Start,
    /// Appended after the element's content.
    End,
}

impl MarkerEdge {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerEdge::Start => "start",
            MarkerEdge::End => "end",
        }
    }
}

/// Where markers are painted.
///
/// Markers live outside the document tree: they are never part of the
/// editable content and never persisted.
pub trait MarkerSurface {
    /// Handle to an inserted marker.
    type Marker;

    /// Insert `text` at `edge` of the element rendering `key`.
    ///
    /// Returns `None` when the node has no rendered element yet. That is not
    /// an error: the caller retries on a later cycle.
    fn insert_marker(&mut self, key: &NodeKey, edge: MarkerEdge, text: &str)
    -> Option<Self::Marker>;

    /// Replace the text of an inserted marker.
    fn update_marker(&mut self, marker: &Self::Marker, text: &str);

    /// Remove an inserted marker. Removing a marker whose element is gone is a no-op.
    fn remove_marker(&mut self, marker: Self::Marker);
}
