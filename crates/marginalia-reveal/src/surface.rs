//! In-memory marker surface.
//!
//! Treats every node as painted unless told otherwise and keeps markers as
//! text, so a rendered region can be read back with its markers inline.

use std::collections::{BTreeMap, HashSet};

use smol_str::SmolStr;

use crate::platform::{MarkerEdge, MarkerSurface};
use crate::types::NodeKey;

/// Handle to a marker on a `MemorySurface`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedMarker {
    pub key: NodeKey,
    pub edge: MarkerEdge,
    pub text: SmolStr,
}

#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    unpainted: HashSet<NodeKey>,
    markers: BTreeMap<MarkerId, PlacedMarker>,
    next_id: u64,
    inserts: usize,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend the element for `key` is not rendered. Insertions fail until
    /// `paint` is called.
    pub fn unpaint(&mut self, key: &NodeKey) {
        self.unpainted.insert(key.clone());
    }

    pub fn paint(&mut self, key: &NodeKey) {
        self.unpainted.remove(key);
    }

    pub fn is_painted(&self, key: &NodeKey) -> bool {
        !self.unpainted.contains(key)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Total successful insertions over the surface's life.
    pub fn insert_count(&self) -> usize {
        self.inserts
    }

    /// Live markers in insertion order.
    pub fn markers(&self) -> impl Iterator<Item = &PlacedMarker> {
        self.markers.values()
    }

    /// Markers on one element, in the order they appear when painted.
    pub fn markers_on(&self, key: &NodeKey) -> Vec<(MarkerEdge, &str)> {
        let starts = self
            .markers
            .values()
            .rev()
            .filter(|m| &m.key == key && m.edge == MarkerEdge::Start);
        let ends = self
            .markers
            .values()
            .filter(|m| &m.key == key && m.edge == MarkerEdge::End);
        starts
            .chain(ends)
            .map(|m| (m.edge, m.text.as_str()))
            .collect()
    }

    /// The element for `key` as text: start markers, then `body`, then end markers.
    ///
    /// Later start markers are prepended in front of earlier ones.
    pub fn decorate(&self, key: &NodeKey, body: &str) -> String {
        let mut out = String::new();
        let mut body_written = false;
        for (edge, text) in self.markers_on(key) {
            if edge == MarkerEdge::End && !body_written {
                out.push_str(body);
                body_written = true;
            }
            out.push_str(text);
        }
        if !body_written {
            out.push_str(body);
        }
        out
    }
}

impl MarkerSurface for MemorySurface {
    type Marker = MarkerId;

    fn insert_marker(&mut self, key: &NodeKey, edge: MarkerEdge, text: &str) -> Option<MarkerId> {
        if !self.is_painted(key) {
            return None;
        }
        let id = MarkerId(self.next_id);
        self.next_id += 1;
        self.inserts += 1;
        self.markers.insert(
            id,
            PlacedMarker {
                key: key.clone(),
                edge,
                text: text.into(),
            },
        );
        Some(id)
    }

    fn update_marker(&mut self, marker: &MarkerId, text: &str) {
        if let Some(placed) = self.markers.get_mut(marker) {
            placed.text = text.into();
        }
    }

    fn remove_marker(&mut self, marker: MarkerId) {
        self.markers.remove(&marker);
    }
}
