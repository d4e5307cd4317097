//! Document tree abstraction.
//!
//! The `DocumentTree` trait is the interface the reveal core needs from the
//! editing framework that owns the document: key lookup, parent/child
//! navigation, the current selection, and a single mutation primitive
//! (replace one node with another at the same position). `MemoryTree` is
//! the in-crate implementation.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::TreeError;
use crate::syntax;
use crate::types::{NodeKey, TreeSelection};

bitflags! {
    /// Inline format bitmask carried by text runs.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct TextFormat: u32 {
        const BOLD = 1;
        const ITALIC = 1 << 1;
        const STRIKETHROUGH = 1 << 2;
        const UNDERLINE = 1 << 3;
        const CODE = 1 << 4;
        const SUBSCRIPT = 1 << 5;
        const SUPERSCRIPT = 1 << 6;
        const HIGHLIGHT = 1 << 7;
    }
}

impl TextFormat {
    /// Formats that have a markdown delimiter and can be revealed inline.
    pub const HANDLED: Self = Self::BOLD
        .union(Self::ITALIC)
        .union(Self::STRIKETHROUGH)
        .union(Self::CODE);
}

bitflags! {
    /// Tags attached to a document update.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct UpdateTags: u32 {
        /// Update replays undo/redo history.
        const HISTORIC = 1;
        /// Update was made outside undo history (synthetic presentation edit).
        const SKIP_HISTORY = 1 << 1;
    }
}

/// Whether a mutation is recorded in undo history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryMode {
    #[default]
    Record,
    /// Side-channel edit invisible to undo/redo.
    Skip,
}

/// Kind of list a list item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Bullet,
    Number,
    Check,
}

impl ListKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListKind::Bullet => "bullet",
            ListKind::Number => "number",
            ListKind::Check => "check",
        }
    }
}

impl std::fmt::Display for ListKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text and format of a run. Shared by rendered and raw-markdown runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub format: TextFormat,
}

impl TextRun {
    pub fn new(text: impl Into<String>, format: TextFormat) -> Self {
        Self {
            text: text.into(),
            format,
        }
    }

    /// Length in chars (Unicode scalar values).
    pub fn len_chars(&self) -> usize {
        self.text.chars().count()
    }
}

/// Node variants of the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Paragraph,
    /// Heading with level 1-6.
    Heading { level: u8 },
    Blockquote,
    /// List container. `start` is the number of the first item.
    List { kind: ListKind, start: u32 },
    /// List item. `checked` is only meaningful inside check lists.
    ListItem { checked: bool },
    /// Fenced code block. Children are text runs and line breaks.
    CodeBlock { language: SmolStr },
    /// Inline link container.
    Link { url: SmolStr },
    /// Rendered formatted text.
    Text(TextRun),
    /// Text run currently shown as raw markdown.
    RawMarkdown(TextRun),
    LineBreak,
}

impl NodeKind {
    /// Text and raw-markdown runs.
    pub fn as_run(&self) -> Option<&TextRun> {
        match self {
            NodeKind::Text(run) | NodeKind::RawMarkdown(run) => Some(run),
            _ => None,
        }
    }

    pub fn as_run_mut(&mut self) -> Option<&mut TextRun> {
        match self {
            NodeKind::Text(run) | NodeKind::RawMarkdown(run) => Some(run),
            _ => None,
        }
    }

    /// Leaf nodes carry their own text; elements carry children.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            NodeKind::Text(_) | NodeKind::RawMarkdown(_) | NodeKind::LineBreak
        )
    }

    /// Inline nodes live inside blocks and never form a block boundary.
    pub fn is_inline(&self) -> bool {
        match self {
            NodeKind::Text(_)
            | NodeKind::RawMarkdown(_)
            | NodeKind::LineBreak
            | NodeKind::Link { .. } => true,
            NodeKind::Root
            | NodeKind::Paragraph
            | NodeKind::Heading { .. }
            | NodeKind::Blockquote
            | NodeKind::List { .. }
            | NodeKind::ListItem { .. }
            | NodeKind::CodeBlock { .. } => false,
        }
    }

    /// Text a leaf contributes to its block's flattened content.
    pub fn leaf_text(&self) -> Option<&str> {
        match self {
            NodeKind::Text(run) | NodeKind::RawMarkdown(run) => Some(&run.text),
            NodeKind::LineBreak => Some("\n"),
            _ => None,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading { .. } => "heading",
            NodeKind::Blockquote => "quote",
            NodeKind::List { .. } => "list",
            NodeKind::ListItem { .. } => "listitem",
            NodeKind::CodeBlock { .. } => "code",
            NodeKind::Link { .. } => "link",
            NodeKind::Text(_) => "text",
            NodeKind::RawMarkdown(_) => "raw-markdown",
            NodeKind::LineBreak => "linebreak",
        }
    }
}

/// Read access to a key-addressed document tree plus the single mutation
/// the reveal core performs.
///
/// A shared borrow of the tree is one atomic read: detectors run against a
/// single `&T` so they always see a consistent snapshot. Mutations need
/// `&mut T`, so a read can never observe a half-applied swap.
pub trait DocumentTree {
    // === Required ===

    /// Current selection, if the editor has one.
    fn selection(&self) -> Option<TreeSelection>;

    /// Resolve a key to a live node's kind.
    fn kind(&self, key: &NodeKey) -> Option<&NodeKind>;

    /// Parent key. None for the root or an unknown key.
    fn parent(&self, key: &NodeKey) -> Option<&NodeKey>;

    /// Ordered child keys. Empty for leaves and unknown keys.
    fn children(&self, key: &NodeKey) -> &[NodeKey];

    /// Replace `key` with a new node of kind `replacement` at the same
    /// position, returning the new node's key.
    ///
    /// Selection points on the replaced node move to the new node with
    /// their offsets intact. With `HistoryMode::Skip` the edit must not be
    /// undoable and must not clear the redo stack.
    fn replace_node(
        &mut self,
        key: &NodeKey,
        replacement: NodeKind,
        history: HistoryMode,
    ) -> Result<NodeKey, TreeError>;

    // === Provided: navigation ===

    /// Check if a key resolves to a live node.
    fn contains(&self, key: &NodeKey) -> bool {
        self.kind(key).is_some()
    }

    /// Position of `key` among its parent's children.
    fn index_in_parent(&self, key: &NodeKey) -> Option<usize> {
        let parent = self.parent(key)?;
        self.children(parent).iter().position(|k| k == key)
    }

    fn previous_sibling(&self, key: &NodeKey) -> Option<&NodeKey> {
        let parent = self.parent(key)?;
        let siblings = self.children(parent);
        let ix = siblings.iter().position(|k| k == key)?;
        ix.checked_sub(1).and_then(|prev| siblings.get(prev))
    }

    fn next_sibling(&self, key: &NodeKey) -> Option<&NodeKey> {
        let parent = self.parent(key)?;
        let siblings = self.children(parent);
        let ix = siblings.iter().position(|k| k == key)?;
        siblings.get(ix + 1)
    }

    /// Iterate `key` and then each of its ancestors up to the root.
    fn self_and_ancestors<'a>(&'a self, key: &'a NodeKey) -> Ancestors<'a, Self> {
        Ancestors {
            tree: self,
            next: self.contains(key).then_some(key),
        }
    }

    // === Provided: text ===

    /// Flattened text of a node and its descendants.
    fn text_content(&self, key: &NodeKey) -> String {
        let mut out = String::new();
        collect_text(self, key, false, &mut out);
        out
    }

    /// Text as the editor shows it: raw-markdown runs are written out with
    /// their delimiters, e.g. `a **bold** z` while `bold` is revealed.
    fn display_text(&self, key: &NodeKey) -> String {
        let mut out = String::new();
        collect_text(self, key, true, &mut out);
        out
    }

    /// Length of `text_content` in chars.
    fn text_len(&self, key: &NodeKey) -> usize {
        match self.kind(key) {
            Some(kind) if kind.is_leaf() => kind.leaf_text().map_or(0, |t| t.chars().count()),
            Some(_) => self.children(key).iter().map(|c| self.text_len(c)).sum(),
            None => 0,
        }
    }
}

fn collect_text<T: DocumentTree + ?Sized>(tree: &T, key: &NodeKey, raw: bool, out: &mut String) {
    match tree.kind(key) {
        Some(NodeKind::RawMarkdown(run)) if raw => out.push_str(&syntax::raw_markdown(run)),
        Some(kind) if kind.is_leaf() => {
            if let Some(text) = kind.leaf_text() {
                out.push_str(text);
            }
        }
        Some(_) => {
            for child in tree.children(key) {
                collect_text(tree, child, raw, out);
            }
        }
        None => {}
    }
}

/// Iterator over a node and its ancestors, innermost first.
pub struct Ancestors<'a, T: ?Sized> {
    tree: &'a T,
    next: Option<&'a NodeKey>,
}

impl<'a, T: DocumentTree + ?Sized> Iterator for Ancestors<'a, T> {
    type Item = &'a NodeKey;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.next?;
        self.next = self.tree.parent(key);
        Some(key)
    }
}
