//! Region detectors.
//!
//! Pure read-only queries that decide which construct contains the caret.
//! They never fail: any selection shape they do not understand is simply
//! "no focus". `detect_all` runs all five against one shared borrow of the
//! tree, so they see the same snapshot.

use ropey::Rope;

use crate::config::{RevealConfig, RevealKinds};
use crate::focus::{
    BlockquoteFocus, CodeBlockFocus, Fence, FocusState, HeadingFocus, InlineRegion, ListItemFocus,
};
use crate::tree::{DocumentTree, ListKind, NodeKind, TextFormat};
use crate::types::{NodeKey, Point, PointKind};

/// Run every enabled detector against the tree's current selection.
///
/// Range selections and a missing selection yield an empty state.
pub fn detect_all<T: DocumentTree + ?Sized>(tree: &T, config: &RevealConfig) -> FocusState {
    let Some(selection) = tree.selection() else {
        return FocusState::default();
    };
    let Some(caret) = selection.caret() else {
        return FocusState::default();
    };

    FocusState {
        inline: config
            .enabled(RevealKinds::INLINE)
            .then(|| detect_inline(tree, caret, config.handled_formats))
            .flatten(),
        heading: config
            .enabled(RevealKinds::HEADING)
            .then(|| detect_heading(tree, caret))
            .flatten(),
        blockquote: config
            .enabled(RevealKinds::BLOCKQUOTE)
            .then(|| detect_blockquote(tree, caret))
            .flatten(),
        list_item: config
            .enabled(RevealKinds::LIST_ITEM)
            .then(|| detect_list_item(tree, caret))
            .flatten(),
        code_block: config
            .enabled(RevealKinds::CODE_BLOCK)
            .then(|| detect_code_block(tree, caret))
            .flatten(),
    }
}

/// Caret inside a text run whose format has a revealable delimiter.
///
/// Every offset from 0 to the run length counts as inside, because the
/// delimiters are not characters of the run. Empty runs count too.
pub fn detect_inline<T: DocumentTree + ?Sized>(
    tree: &T,
    caret: &Point,
    handled: TextFormat,
) -> Option<InlineRegion> {
    let NodeKind::Text(run) = tree.kind(&caret.key)? else {
        return None;
    };
    if run.format.is_empty() || !run.format.intersects(handled) {
        return None;
    }
    Some(InlineRegion {
        key: caret.key.clone(),
        format: run.format,
        start_offset: 0,
        end_offset: run.len_chars(),
    })
}

/// Caret whose innermost block is a heading (or the caret is on an empty heading).
pub fn detect_heading<T: DocumentTree + ?Sized>(tree: &T, caret: &Point) -> Option<HeadingFocus> {
    let block = innermost_block(tree, &caret.key)?;
    match tree.kind(block)? {
        NodeKind::Heading { level } => Some(HeadingFocus {
            key: block.clone(),
            level: *level,
        }),
        _ => None,
    }
}

/// Innermost quote around the caret, with the number of enclosing quotes.
pub fn detect_blockquote<T: DocumentTree + ?Sized>(
    tree: &T,
    caret: &Point,
) -> Option<BlockquoteFocus> {
    let mut innermost = None;
    let mut depth = 0;
    for key in tree.self_and_ancestors(&caret.key) {
        if matches!(tree.kind(key), Some(NodeKind::Blockquote)) {
            depth += 1;
            innermost.get_or_insert(key);
        }
    }
    innermost.map(|key| BlockquoteFocus {
        key: key.clone(),
        depth,
    })
}

/// Nearest list item around the caret, with its list kind, position and depth.
pub fn detect_list_item<T: DocumentTree + ?Sized>(
    tree: &T,
    caret: &Point,
) -> Option<ListItemFocus> {
    let item = tree
        .self_and_ancestors(&caret.key)
        .find(|k| matches!(tree.kind(k), Some(NodeKind::ListItem { .. })))?;
    let NodeKind::ListItem { checked } = tree.kind(item)? else {
        return None;
    };
    let list = tree.parent(item)?;
    let NodeKind::List { kind, start } = tree.kind(list)? else {
        return None;
    };

    let index = tree
        .children(list)
        .iter()
        .take_while(|k| *k != item)
        .filter(|k| matches!(tree.kind(k), Some(NodeKind::ListItem { .. })))
        .count()
        + 1;
    let depth = tree
        .self_and_ancestors(list)
        .filter(|k| matches!(tree.kind(k), Some(NodeKind::List { .. })))
        .count();

    Some(ListItemFocus {
        key: item.clone(),
        kind: *kind,
        index,
        depth,
        checked: *kind == ListKind::Check && *checked,
        list_start: *start,
    })
}

/// Caret on the first or last line of a code block.
pub fn detect_code_block<T: DocumentTree + ?Sized>(
    tree: &T,
    caret: &Point,
) -> Option<CodeBlockFocus> {
    let block = tree
        .self_and_ancestors(&caret.key)
        .find(|k| matches!(tree.kind(k), Some(NodeKind::CodeBlock { .. })))?;
    let NodeKind::CodeBlock { language } = tree.kind(block)? else {
        return None;
    };

    let offset = offset_within(tree, block, caret);
    let fence = fence_for_offset(&tree.text_content(block), offset)?;

    Some(CodeBlockFocus {
        key: block.clone(),
        language: language.clone(),
        fence,
    })
}

/// Decide which fences show for a caret at `offset` chars into `body`.
///
/// A single line shows both; the first line shows the opening fence; the
/// last line shows the closing fence; interior lines show nothing.
pub fn fence_for_offset(body: &str, offset: usize) -> Option<Fence> {
    let rope = Rope::from_str(body);
    let total_lines = rope.len_lines();
    if total_lines <= 1 {
        return Some(Fence::Both);
    }

    let line = rope.char_to_line(offset.min(rope.len_chars()));
    if line == 0 {
        Some(Fence::Open)
    } else if line == total_lines - 1 {
        Some(Fence::Close)
    } else {
        None
    }
}

/// Nearest ancestor (or self) that is not an inline node.
fn innermost_block<'a, T: DocumentTree + ?Sized>(
    tree: &'a T,
    key: &'a NodeKey,
) -> Option<&'a NodeKey> {
    tree.self_and_ancestors(key)
        .find(|k| tree.kind(k).is_some_and(|kind| !kind.is_inline()))
}

/// Caret position in chars within the flattened text of `ancestor`.
fn offset_within<T: DocumentTree + ?Sized>(tree: &T, ancestor: &NodeKey, caret: &Point) -> usize {
    let mut offset = match caret.kind {
        PointKind::Text => caret.offset.min(tree.text_len(&caret.key)),
        PointKind::Element => tree
            .children(&caret.key)
            .iter()
            .take(caret.offset)
            .map(|c| tree.text_len(c))
            .sum(),
    };

    let mut current = &caret.key;
    while current != ancestor {
        let Some(parent) = tree.parent(current) else {
            break;
        };
        offset += tree
            .children(parent)
            .iter()
            .take_while(|k| *k != current)
            .map(|k| tree.text_len(k))
            .sum::<usize>();
        current = parent;
    }
    offset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTree;
    use crate::types::TreeSelection;

    fn para(tree: &mut MemoryTree) -> NodeKey {
        let root = tree.root().clone();
        tree.append(&root, NodeKind::Paragraph).unwrap()
    }

    fn caret(key: &NodeKey, offset: usize) -> Point {
        Point::text(key.clone(), offset)
    }

    #[test]
    fn test_inline_bold_at_start() {
        let mut tree = MemoryTree::new();
        let p = para(&mut tree);
        let text_a = tree.text(&p, "bold", TextFormat::BOLD).unwrap();

        let region = detect_inline(&tree, &caret(&text_a, 0), TextFormat::HANDLED);
        assert_eq!(
            region,
            Some(InlineRegion {
                key: text_a,
                format: TextFormat::BOLD,
                start_offset: 0,
                end_offset: 4,
            })
        );
    }

    #[test]
    fn test_inline_every_offset_counts() {
        let mut tree = MemoryTree::new();
        let p = para(&mut tree);
        let t = tree
            .text(&p, "strong", TextFormat::BOLD | TextFormat::ITALIC)
            .unwrap();
        for offset in 0..=6 {
            let region = detect_inline(&tree, &caret(&t, offset), TextFormat::HANDLED);
            assert_eq!(region.map(|r| r.key), Some(t.clone()), "offset {offset}");
        }
    }

    #[test]
    fn test_inline_siblings_are_outside() {
        let mut tree = MemoryTree::new();
        let p = para(&mut tree);
        let before = tree.text(&p, "plain ", TextFormat::empty()).unwrap();
        let _bold = tree.text(&p, "bold", TextFormat::BOLD).unwrap();
        let after = tree.text(&p, " tail", TextFormat::empty()).unwrap();

        assert_eq!(
            detect_inline(&tree, &caret(&before, 6), TextFormat::HANDLED),
            None
        );
        assert_eq!(
            detect_inline(&tree, &caret(&after, 0), TextFormat::HANDLED),
            None
        );
        assert_eq!(
            detect_inline(&tree, &Point::element(p, 1), TextFormat::HANDLED),
            None
        );
    }

    #[test]
    fn test_inline_unhandled_formats() {
        let mut tree = MemoryTree::new();
        let p = para(&mut tree);
        let plain = tree.text(&p, "plain", TextFormat::empty()).unwrap();
        let under = tree.text(&p, "under", TextFormat::UNDERLINE).unwrap();

        for offset in 0..=5 {
            assert_eq!(
                detect_inline(&tree, &caret(&plain, offset), TextFormat::HANDLED),
                None
            );
            assert_eq!(
                detect_inline(&tree, &caret(&under, offset), TextFormat::HANDLED),
                None
            );
        }
    }

    #[test]
    fn test_inline_empty_run_counts() {
        let mut tree = MemoryTree::new();
        let p = para(&mut tree);
        let t = tree.text(&p, "", TextFormat::CODE).unwrap();
        let region = detect_inline(&tree, &caret(&t, 0), TextFormat::HANDLED).unwrap();
        assert_eq!(region.end_offset, 0);
    }

    #[test]
    fn test_inline_respects_handled_set() {
        let mut tree = MemoryTree::new();
        let p = para(&mut tree);
        let t = tree.text(&p, "code", TextFormat::CODE).unwrap();
        assert_eq!(detect_inline(&tree, &caret(&t, 1), TextFormat::BOLD), None);
    }

    #[test]
    fn test_inline_raw_node_is_not_a_region() {
        let mut tree = MemoryTree::new();
        let p = para(&mut tree);
        let raw = tree
            .append(
                &p,
                NodeKind::RawMarkdown(crate::tree::TextRun::new("x", TextFormat::BOLD)),
            )
            .unwrap();
        assert_eq!(
            detect_inline(&tree, &caret(&raw, 0), TextFormat::HANDLED),
            None
        );
    }

    #[test]
    fn test_heading_through_text_and_link() {
        let mut tree = MemoryTree::new();
        let root = tree.root().clone();
        let h = tree.append(&root, NodeKind::Heading { level: 3 }).unwrap();
        let t = tree.text(&h, "Title ", TextFormat::empty()).unwrap();
        let link = tree
            .append(
                &h,
                NodeKind::Link {
                    url: "https://example.com".into(),
                },
            )
            .unwrap();
        let linked = tree.text(&link, "here", TextFormat::empty()).unwrap();

        let expected = Some(HeadingFocus {
            key: h.clone(),
            level: 3,
        });
        assert_eq!(detect_heading(&tree, &caret(&t, 0)), expected);
        assert_eq!(detect_heading(&tree, &caret(&t, 6)), expected);
        assert_eq!(detect_heading(&tree, &caret(&linked, 2)), expected);
    }

    #[test]
    fn test_empty_heading_caret_on_block() {
        let mut tree = MemoryTree::new();
        let root = tree.root().clone();
        let h = tree.append(&root, NodeKind::Heading { level: 1 }).unwrap();
        assert_eq!(
            detect_heading(&tree, &Point::element(h.clone(), 0)),
            Some(HeadingFocus { key: h, level: 1 })
        );
    }

    #[test]
    fn test_paragraph_is_not_heading() {
        let mut tree = MemoryTree::new();
        let p = para(&mut tree);
        let t = tree.text(&p, "body", TextFormat::empty()).unwrap();
        assert_eq!(detect_heading(&tree, &caret(&t, 1)), None);
    }

    #[test]
    fn test_nested_blockquote_depth() {
        let mut tree = MemoryTree::new();
        let root = tree.root().clone();
        let outer = tree.append(&root, NodeKind::Blockquote).unwrap();
        let outer_p = tree.append(&outer, NodeKind::Paragraph).unwrap();
        let outer_t = tree.text(&outer_p, "outer", TextFormat::empty()).unwrap();
        let inner = tree.append(&outer, NodeKind::Blockquote).unwrap();
        let inner_p = tree.append(&inner, NodeKind::Paragraph).unwrap();
        let inner_t = tree.text(&inner_p, "inner", TextFormat::empty()).unwrap();

        assert_eq!(
            detect_blockquote(&tree, &caret(&inner_t, 2)),
            Some(BlockquoteFocus {
                key: inner.clone(),
                depth: 2
            })
        );
        assert_eq!(
            detect_blockquote(&tree, &caret(&outer_t, 0)),
            Some(BlockquoteFocus {
                key: outer.clone(),
                depth: 1
            })
        );
        // Empty quote with the caret on the quote itself.
        assert_eq!(
            detect_blockquote(&tree, &Point::element(outer.clone(), 0)),
            Some(BlockquoteFocus {
                key: outer,
                depth: 1
            })
        );
    }

    fn numbered_list(tree: &mut MemoryTree, kind: ListKind) -> (NodeKey, Vec<NodeKey>) {
        let root = tree.root().clone();
        let list = tree.append(&root, NodeKind::List { kind, start: 1 }).unwrap();
        let mut texts = Vec::new();
        for label in ["First", "Second", "Third"] {
            let item = tree
                .append(&list, NodeKind::ListItem { checked: false })
                .unwrap();
            texts.push(tree.text(&item, label, TextFormat::empty()).unwrap());
        }
        (list, texts)
    }

    #[test]
    fn test_numbered_list_second_item() {
        let mut tree = MemoryTree::new();
        let (list, texts) = numbered_list(&mut tree, ListKind::Number);

        let focus = detect_list_item(&tree, &caret(&texts[1], 3)).unwrap();
        assert_eq!(focus.key, tree.children(&list)[1]);
        assert_eq!(focus.index, 2);
        assert_eq!(focus.depth, 1);
        assert_eq!(focus.kind, ListKind::Number);
        assert!(!focus.checked);
    }

    #[test]
    fn test_nested_list_depth_and_index() {
        let mut tree = MemoryTree::new();
        let (_, texts) = numbered_list(&mut tree, ListKind::Bullet);
        let third_item = tree.parent(&texts[2]).unwrap().clone();

        let nested = tree
            .append(
                &third_item,
                NodeKind::List {
                    kind: ListKind::Check,
                    start: 1,
                },
            )
            .unwrap();
        let a = tree
            .append(&nested, NodeKind::ListItem { checked: false })
            .unwrap();
        tree.text(&a, "todo", TextFormat::empty()).unwrap();
        let b = tree
            .append(&nested, NodeKind::ListItem { checked: true })
            .unwrap();
        let done = tree.text(&b, "done", TextFormat::empty()).unwrap();

        let focus = detect_list_item(&tree, &caret(&done, 4)).unwrap();
        assert_eq!(focus.key, b);
        assert_eq!(focus.kind, ListKind::Check);
        assert_eq!(focus.index, 2);
        assert_eq!(focus.depth, 2);
        assert!(focus.checked);

        // Caret in the outer item's own text still reports the outer item.
        let outer = detect_list_item(&tree, &caret(&texts[2], 0)).unwrap();
        assert_eq!(outer.key, third_item);
        assert_eq!(outer.depth, 1);
        assert_eq!(outer.index, 3);
    }

    #[test]
    fn test_checked_ignored_outside_check_lists() {
        let mut tree = MemoryTree::new();
        let root = tree.root().clone();
        let list = tree
            .append(
                &root,
                NodeKind::List {
                    kind: ListKind::Bullet,
                    start: 1,
                },
            )
            .unwrap();
        let item = tree
            .append(&list, NodeKind::ListItem { checked: true })
            .unwrap();
        let t = tree.text(&item, "x", TextFormat::empty()).unwrap();
        assert!(!detect_list_item(&tree, &caret(&t, 0)).unwrap().checked);
    }

    fn code_block(tree: &mut MemoryTree, lines: &[&str]) -> (NodeKey, Vec<NodeKey>) {
        let root = tree.root().clone();
        let block = tree
            .append(
                &root,
                NodeKind::CodeBlock {
                    language: "python".into(),
                },
            )
            .unwrap();
        let mut runs = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                tree.line_break(&block).unwrap();
            }
            runs.push(tree.text(&block, line, TextFormat::empty()).unwrap());
        }
        (block, runs)
    }

    #[test]
    fn test_code_block_fences() {
        let mut tree = MemoryTree::new();
        let (block, runs) = code_block(&mut tree, &["line1", "line2", "line3"]);
        assert_eq!(tree.text_content(&block), "line1\nline2\nline3");

        let fence = |tree: &MemoryTree, point: Point| detect_code_block(tree, &point).map(|f| f.fence);

        assert_eq!(fence(&tree, caret(&runs[0], 0)), Some(Fence::Open));
        assert_eq!(fence(&tree, caret(&runs[0], 5)), Some(Fence::Open));
        assert_eq!(fence(&tree, caret(&runs[1], 2)), None);
        assert_eq!(fence(&tree, caret(&runs[2], 0)), Some(Fence::Close));
        assert_eq!(fence(&tree, caret(&runs[2], 5)), Some(Fence::Close));

        let focus = detect_code_block(&tree, &caret(&runs[2], 3)).unwrap();
        assert_eq!(focus.key, block);
        assert_eq!(focus.language, "python");
    }

    #[test]
    fn test_code_block_single_line_and_empty() {
        let mut tree = MemoryTree::new();
        let (_, runs) = code_block(&mut tree, &["print(1)"]);
        assert_eq!(
            detect_code_block(&tree, &caret(&runs[0], 4)).map(|f| f.fence),
            Some(Fence::Both)
        );

        let mut tree = MemoryTree::new();
        let root = tree.root().clone();
        let empty = tree
            .append(
                &root,
                NodeKind::CodeBlock {
                    language: "".into(),
                },
            )
            .unwrap();
        assert_eq!(
            detect_code_block(&tree, &Point::element(empty, 0)).map(|f| f.fence),
            Some(Fence::Both)
        );
    }

    #[test]
    fn test_code_block_element_caret() {
        let mut tree = MemoryTree::new();
        let (block, _) = code_block(&mut tree, &["a", "b", "c"]);
        // Children: a, br, b, br, c. Index 4 sits before "c".
        assert_eq!(
            detect_code_block(&tree, &Point::element(block.clone(), 4)).map(|f| f.fence),
            Some(Fence::Close)
        );
        assert_eq!(
            detect_code_block(&tree, &Point::element(block, 2)).map(|f| f.fence),
            None
        );
    }

    #[test]
    fn test_fence_for_offset_table() {
        assert_eq!(fence_for_offset("", 0), Some(Fence::Both));
        assert_eq!(fence_for_offset("x = 1", 3), Some(Fence::Both));
        assert_eq!(fence_for_offset("a\nb", 1), Some(Fence::Open));
        assert_eq!(fence_for_offset("a\nb", 2), Some(Fence::Close));
        assert_eq!(fence_for_offset("a\nb\nc", 2), None);
        // Offsets past the end clamp to the last line.
        assert_eq!(fence_for_offset("a\nb\nc", 99), Some(Fence::Close));
    }

    #[test]
    fn test_only_newline_splits_code_lines() {
        assert_eq!(fence_for_offset("a\rb\x0Cc\u{2028}d", 5), Some(Fence::Both));
        assert_eq!(fence_for_offset("x\u{85}y\nz", 2), Some(Fence::Open));
        assert_eq!(fence_for_offset("x\r\ny\nz", 4), None);
    }

    #[test]
    fn test_detect_all_ignores_ranges() {
        let mut tree = MemoryTree::new();
        let root = tree.root().clone();
        let h = tree.append(&root, NodeKind::Heading { level: 2 }).unwrap();
        let t = tree.text(&h, "bold", TextFormat::BOLD).unwrap();

        tree.set_selection(Some(TreeSelection::new(caret(&t, 0), caret(&t, 2))));
        assert!(detect_all(&tree, &RevealConfig::default()).is_empty());

        tree.set_caret(&t, 1);
        let state = detect_all(&tree, &RevealConfig::default());
        assert_eq!(state.inline.map(|r| r.key), Some(t));
        assert_eq!(state.heading.map(|h| h.level), Some(2));
        assert!(state.blockquote.is_none());
    }

    #[test]
    fn test_detect_all_skips_disabled_kinds() {
        let mut tree = MemoryTree::new();
        let root = tree.root().clone();
        let h = tree.append(&root, NodeKind::Heading { level: 2 }).unwrap();
        let t = tree.text(&h, "bold", TextFormat::BOLD).unwrap();
        tree.set_caret(&t, 1);

        let config = RevealConfig::default().with_kinds(RevealKinds::HEADING);
        let state = detect_all(&tree, &config);
        assert!(state.inline.is_none());
        assert!(state.heading.is_some());
    }
}
