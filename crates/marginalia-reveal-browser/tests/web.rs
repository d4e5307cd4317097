//! WASM browser tests for marginalia-reveal-browser.
//!
//! Run with: `wasm-pack test --headless --firefox` or `--chrome`

use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

use std::cell::RefCell;
use std::rc::Rc;

use marginalia_reveal_browser::{
    DocumentTree, DomMarkerSurface, ManualClock, MarkerEdge, MarkerSurface, MemoryTree, NodeKey,
    NodeKind, RevealConfig, RevealDriver, RevealEngine, TextFormat,
};
use web_sys::Element;

fn document() -> web_sys::Document {
    web_sys::window().unwrap().document().unwrap()
}

/// Mount an editor root with one element per key and return the root.
fn mount(editor_id: &str, keys: &[&str]) -> Element {
    let document = document();
    if let Some(old) = document.get_element_by_id(editor_id) {
        old.remove();
    }
    let root = document.create_element("div").unwrap();
    root.set_id(editor_id);
    for key in keys {
        let el = document.create_element("div").unwrap();
        el.set_attribute("data-node-key", key).unwrap();
        el.set_text_content(Some("body"));
        root.append_child(&el).unwrap();
    }
    document.body().unwrap().append_child(&root).unwrap();
    root
}

fn text_of(root: &Element, key: &str) -> String {
    root.query_selector(&format!("[data-node-key=\"{key}\"]"))
        .unwrap()
        .unwrap()
        .text_content()
        .unwrap_or_default()
}

// === Surface ===

#[wasm_bindgen_test]
fn test_insert_update_remove() {
    let root = mount("editor-surface", &["h"]);
    let mut surface = DomMarkerSurface::new("editor-surface");
    let key = NodeKey::from("h");

    let marker = surface.insert_marker(&key, MarkerEdge::Start, "# ").unwrap();
    assert_eq!(text_of(&root, "h"), "# body");
    assert_eq!(marker.get_attribute("contenteditable").as_deref(), Some("false"));
    assert_eq!(marker.get_attribute("data-reveal-marker").as_deref(), Some("start"));
    assert_eq!(marker.class_name(), "md-reveal-marker");

    surface.update_marker(&marker, "### ");
    assert_eq!(text_of(&root, "h"), "### body");

    surface.remove_marker(marker);
    assert_eq!(text_of(&root, "h"), "body");
}

#[wasm_bindgen_test]
fn test_end_marker_is_appended() {
    let root = mount("editor-fence", &["code"]);
    let mut surface = DomMarkerSurface::new("editor-fence").with_marker_class("fence");
    let key = NodeKey::from("code");

    surface.insert_marker(&key, MarkerEdge::Start, "```rust").unwrap();
    let end = surface.insert_marker(&key, MarkerEdge::End, "```").unwrap();
    assert_eq!(text_of(&root, "code"), "```rustbody```");
    assert_eq!(end.class_name(), "fence");
}

#[wasm_bindgen_test]
fn test_missing_element_returns_none() {
    mount("editor-missing", &[]);
    let mut surface = DomMarkerSurface::new("editor-missing");
    assert!(
        surface
            .insert_marker(&NodeKey::from("nope"), MarkerEdge::Start, "> ")
            .is_none()
    );

    let mut surface = DomMarkerSurface::new("no-such-editor");
    assert!(
        surface
            .insert_marker(&NodeKey::from("nope"), MarkerEdge::Start, "> ")
            .is_none()
    );
}

// === Engine against the DOM ===

#[wasm_bindgen_test]
fn test_engine_paints_heading_prefix() {
    let mut tree = MemoryTree::new();
    let tree_root = tree.root().clone();
    let h = tree.append(&tree_root, NodeKind::Heading { level: 2 }).unwrap();
    let t = tree.text(&h, "Title", TextFormat::empty()).unwrap();
    tree.set_caret(&t, 3);

    let root = mount("editor-engine", &[h.as_str()]);
    let mut surface = DomMarkerSurface::new("editor-engine");
    let mut engine: RevealEngine<DomMarkerSurface, ManualClock> =
        RevealEngine::with_clock(RevealConfig::default(), ManualClock::new());

    engine.process_now(&mut tree, &mut surface).unwrap();
    assert_eq!(text_of(&root, &h), "body");
    engine.flush_frame(&mut surface);
    assert_eq!(text_of(&root, &h), "## body");

    engine.dispose(&mut tree, &mut surface);
    assert_eq!(text_of(&root, &h), "body");
}

// === Driver ===

#[wasm_bindgen_test]
fn test_dropping_driver_removes_markers_and_hides_reveal() {
    let mut tree = MemoryTree::new();
    let tree_root = tree.root().clone();
    let h = tree.append(&tree_root, NodeKind::Heading { level: 2 }).unwrap();
    let t = tree.text(&h, "Loud", TextFormat::BOLD).unwrap();
    tree.set_caret(&t, 1);
    let tree = Rc::new(RefCell::new(tree));

    let root = mount("editor-drop", &[h.as_str()]);
    let driver = RevealDriver::new(
        tree.clone(),
        DomMarkerSurface::new("editor-drop"),
        RevealConfig::default(),
    );

    driver.process_now();
    driver.flush_now();
    assert_eq!(text_of(&root, &h), "## body");
    let revealed = tree.borrow().children(&h).to_vec();
    assert!(matches!(
        tree.borrow().kind(&revealed[0]),
        Some(NodeKind::RawMarkdown(_))
    ));

    drop(driver);
    assert_eq!(text_of(&root, &h), "body");
    assert_eq!(root.query_selector("[data-reveal-marker]").unwrap(), None);
    let tree = tree.borrow();
    let restored = &tree.children(&h)[0];
    assert!(matches!(tree.kind(restored), Some(NodeKind::Text(_))));
    assert_eq!(tree.display_text(&h), "Loud");
}
