//! DOM marker surface.
//!
//! Block markers are `<span>` elements prepended or appended to the element
//! that renders a node. The renderer must tag node elements with
//! `data-node-key="<key>"` inside the editor root.
//!
//! # CSS Integration
//!
//! Markers carry the marker class (default `md-reveal-marker`) and a
//! `data-reveal-marker="start|end"` attribute:
//! ```css
//! .md-reveal-marker {
//!     opacity: 0.5;
//!     user-select: none;
//! }
//! ```

use marginalia_reveal::{MarkerEdge, MarkerSurface, NodeKey};
use web_sys::Element;

pub const DEFAULT_MARKER_CLASS: &str = "md-reveal-marker";

/// `MarkerSurface` backed by the live DOM.
#[derive(Debug, Clone)]
pub struct DomMarkerSurface {
    editor_id: String,
    marker_class: String,
}

impl DomMarkerSurface {
    pub fn new(editor_id: impl Into<String>) -> Self {
        Self {
            editor_id: editor_id.into(),
            marker_class: DEFAULT_MARKER_CLASS.to_string(),
        }
    }

    pub fn with_marker_class(mut self, class: impl Into<String>) -> Self {
        self.marker_class = class.into();
        self
    }

    pub fn editor_id(&self) -> &str {
        &self.editor_id
    }

    /// Rendered element for a node key, if it is in the editor right now.
    pub fn element_for(&self, key: &NodeKey) -> Option<Element> {
        let document = gloo_utils::document();
        let root = document.get_element_by_id(&self.editor_id)?;
        let selector = format!("[data-node-key=\"{}\"]", escape_attr(key));
        root.query_selector(&selector).ok().flatten()
    }
}

impl MarkerSurface for DomMarkerSurface {
    type Marker = Element;

    fn insert_marker(&mut self, key: &NodeKey, edge: MarkerEdge, text: &str) -> Option<Element> {
        let element = self.element_for(key)?;
        let document = element.owner_document()?;
        let marker = document.create_element("span").ok()?;

        marker.set_class_name(&self.marker_class);
        let _ = marker.set_attribute("contenteditable", "false");
        let _ = marker.set_attribute("aria-hidden", "true");
        let _ = marker.set_attribute("data-reveal-marker", edge.as_str());
        marker.set_text_content(Some(text));

        let inserted = match edge {
            MarkerEdge::Start => element.prepend_with_node_1(&marker),
            MarkerEdge::End => element.append_with_node_1(&marker),
        };
        if let Err(e) = inserted {
            tracing::debug!(target: "marginalia::marker", %key, "marker insertion rejected: {:?}", e);
            return None;
        }
        Some(marker)
    }

    fn update_marker(&mut self, marker: &Element, text: &str) {
        marker.set_text_content(Some(text));
    }

    fn remove_marker(&mut self, marker: Element) {
        marker.remove();
    }
}

/// Escape a value for use inside a double-quoted attribute selector.
fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
