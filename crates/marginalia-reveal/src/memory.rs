//! In-memory document tree.
//!
//! `MemoryTree` is a complete `DocumentTree` with selection tracking, an
//! undo history for user edits, and an update log. Replacements made with
//! `HistoryMode::Skip` leave the history untouched and register a key alias,
//! so undo entries recorded against the replaced key still find the node
//! after a reveal/hide swap.

use std::collections::{HashMap, HashSet};

use smol_str::format_smolstr;

use crate::error::TreeError;
use crate::tree::{DocumentTree, HistoryMode, NodeKind, TextFormat, TextRun, UpdateTags};
use crate::types::{NodeKey, Point, PointKind, TreeSelection};
use crate::undo::{History, UndoManager};

const ROOT_KEY: &str = "root";

#[derive(Debug, Clone)]
struct NodeEntry {
    kind: NodeKind,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
}

/// A recorded user edit.
#[derive(Debug, Clone)]
enum TreeEdit {
    SetText {
        key: NodeKey,
        before: String,
        after: String,
    },
    SetFormat {
        key: NodeKey,
        before: TextFormat,
        after: TextFormat,
    },
    SetChecked {
        key: NodeKey,
        before: bool,
        after: bool,
    },
    Replace {
        old_key: NodeKey,
        new_key: NodeKey,
        before: NodeKind,
        after: NodeKind,
    },
    Remove {
        key: NodeKey,
        parent: NodeKey,
        index: usize,
        subtree: Vec<(NodeKey, NodeEntry)>,
    },
}

impl TreeEdit {
    /// Keys this edit resolves when it is undone or redone.
    fn keys(&self) -> impl Iterator<Item = &NodeKey> {
        let (first, second) = match self {
            TreeEdit::SetText { key, .. }
            | TreeEdit::SetFormat { key, .. }
            | TreeEdit::SetChecked { key, .. } => (key, None),
            TreeEdit::Replace {
                old_key, new_key, ..
            } => (old_key, Some(new_key)),
            TreeEdit::Remove { key, parent, .. } => (key, Some(parent)),
        };
        std::iter::once(first).chain(second)
    }
}

/// Key-addressed document tree held in a hash map.
#[derive(Debug, Clone)]
pub struct MemoryTree {
    nodes: HashMap<NodeKey, NodeEntry>,
    root: NodeKey,
    selection: Option<TreeSelection>,
    next_id: u64,
    history: History<TreeEdit>,
    /// Replaced key -> replacement key, for history-skipping replacements.
    aliases: HashMap<NodeKey, NodeKey>,
    updates: Vec<UpdateTags>,
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTree {
    /// Create a tree holding only an empty root.
    pub fn new() -> Self {
        let root = NodeKey::from(ROOT_KEY);
        let mut nodes = HashMap::new();
        nodes.insert(
            root.clone(),
            NodeEntry {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            },
        );
        Self {
            nodes,
            root,
            selection: None,
            next_id: 1,
            history: History::default(),
            aliases: HashMap::new(),
            updates: Vec::new(),
        }
    }

    /// Set the maximum number of undo steps kept.
    pub fn with_max_undo(mut self, max_steps: usize) -> Self {
        self.history = History::new(max_steps);
        self
    }

    pub fn root(&self) -> &NodeKey {
        &self.root
    }

    /// Number of live nodes, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    // === Building ===

    /// Append a new node as the last child of `parent`.
    pub fn append(&mut self, parent: &NodeKey, kind: NodeKind) -> Result<NodeKey, TreeError> {
        let parent_entry = self
            .nodes
            .get_mut(parent)
            .ok_or_else(|| TreeError::NodeNotFound(parent.clone()))?;
        if parent_entry.kind.is_leaf() {
            return Err(TreeError::NotContainer(parent.clone()));
        }

        let key = format_smolstr!("n{}", self.next_id);
        self.next_id += 1;
        parent_entry.children.push(key.clone());
        self.nodes.insert(
            key.clone(),
            NodeEntry {
                kind,
                parent: Some(parent.clone()),
                children: Vec::new(),
            },
        );
        Ok(key)
    }

    /// Append a text run.
    pub fn text(
        &mut self,
        parent: &NodeKey,
        text: &str,
        format: TextFormat,
    ) -> Result<NodeKey, TreeError> {
        self.append(parent, NodeKind::Text(TextRun::new(text, format)))
    }

    pub fn line_break(&mut self, parent: &NodeKey) -> Result<NodeKey, TreeError> {
        self.append(parent, NodeKind::LineBreak)
    }

    // === Selection ===

    pub fn set_selection(&mut self, selection: Option<TreeSelection>) {
        self.selection = selection;
    }

    /// Place a caret. Leaves get a text point, elements an element point.
    pub fn set_caret(&mut self, key: &NodeKey, offset: usize) {
        let point = match self.nodes.get(key) {
            Some(entry) if !entry.kind.is_leaf() => Point::element(key.clone(), offset),
            _ => Point::text(key.clone(), offset),
        };
        self.selection = Some(TreeSelection::collapsed(point));
    }

    // === User edits (recorded in history) ===

    /// Replace the text of a run.
    pub fn set_text(&mut self, key: &NodeKey, text: impl Into<String>) -> Result<(), TreeError> {
        let after = text.into();
        let run = self.run_mut(key, "text")?;
        let before = std::mem::replace(&mut run.text, after.clone());
        self.clamp_selection();
        self.history.record(TreeEdit::SetText {
            key: key.clone(),
            before,
            after,
        });
        self.updates.push(UpdateTags::empty());
        Ok(())
    }

    /// Replace the format of a run.
    pub fn set_format(&mut self, key: &NodeKey, format: TextFormat) -> Result<(), TreeError> {
        let run = self.run_mut(key, "text")?;
        let before = std::mem::replace(&mut run.format, format);
        self.history.record(TreeEdit::SetFormat {
            key: key.clone(),
            before,
            after: format,
        });
        self.updates.push(UpdateTags::empty());
        Ok(())
    }

    /// Toggle a list item's checked flag.
    pub fn set_checked(&mut self, key: &NodeKey, checked: bool) -> Result<(), TreeError> {
        let entry = self
            .nodes
            .get_mut(key)
            .ok_or_else(|| TreeError::NodeNotFound(key.clone()))?;
        let NodeKind::ListItem { checked: current } = &mut entry.kind else {
            return Err(TreeError::InvalidReplacement {
                key: key.clone(),
                existing: entry.kind.name(),
                replacement: "listitem",
            });
        };
        let before = std::mem::replace(current, checked);
        self.history.record(TreeEdit::SetChecked {
            key: key.clone(),
            before,
            after: checked,
        });
        self.updates.push(UpdateTags::empty());
        Ok(())
    }

    /// Remove a node and its descendants.
    pub fn remove(&mut self, key: &NodeKey) -> Result<(), TreeError> {
        let (parent, index) = self.detach(key)?;
        let subtree = self.take_subtree(key);
        self.fix_selection_after_remove(&parent, index, &subtree);
        self.history.record(TreeEdit::Remove {
            key: key.clone(),
            parent,
            index,
            subtree,
        });
        self.updates.push(UpdateTags::empty());
        Ok(())
    }

    // === Inspection ===

    /// Text run at `key`, rendered or raw.
    pub fn run(&self, key: &NodeKey) -> Option<&TextRun> {
        self.nodes.get(key).and_then(|e| e.kind.as_run())
    }

    /// Follow replacement aliases until a live key is found.
    pub fn resolve(&self, key: &NodeKey) -> Option<NodeKey> {
        let mut current = key;
        // Alias chains cannot be longer than the alias table.
        for _ in 0..=self.aliases.len() {
            if self.nodes.contains_key(current) {
                return Some(current.clone());
            }
            current = self.aliases.get(current)?;
        }
        None
    }

    /// Number of undoable edits.
    pub fn undo_len(&self) -> usize {
        self.history.undo_len()
    }

    /// Take the tags of every update since the last drain, oldest first.
    pub fn drain_updates(&mut self) -> Vec<UpdateTags> {
        std::mem::take(&mut self.updates)
    }

    // === Internals ===

    fn run_mut(&mut self, key: &NodeKey, expected: &'static str) -> Result<&mut TextRun, TreeError> {
        let entry = self
            .nodes
            .get_mut(key)
            .ok_or_else(|| TreeError::NodeNotFound(key.clone()))?;
        let existing = entry.kind.name();
        entry
            .kind
            .as_run_mut()
            .ok_or_else(|| TreeError::InvalidReplacement {
                key: key.clone(),
                existing,
                replacement: expected,
            })
    }

    /// Move the node at `key` to `new_key` with a new kind, keeping its
    /// position, children, and any selection points on it.
    fn swap_entry(
        &mut self,
        key: &NodeKey,
        new_key: NodeKey,
        kind: NodeKind,
    ) -> Result<NodeKind, TreeError> {
        let parent = {
            let existing = self
                .nodes
                .get(key)
                .ok_or_else(|| TreeError::NodeNotFound(key.clone()))?;
            if existing.kind.is_leaf() != kind.is_leaf() {
                return Err(TreeError::InvalidReplacement {
                    key: key.clone(),
                    existing: existing.kind.name(),
                    replacement: kind.name(),
                });
            }
            existing
                .parent
                .clone()
                .ok_or_else(|| TreeError::DetachedNode(key.clone()))?
        };

        let mut entry = self
            .nodes
            .remove(key)
            .ok_or_else(|| TreeError::NodeNotFound(key.clone()))?;
        let before = std::mem::replace(&mut entry.kind, kind);

        for child in &entry.children {
            if let Some(child) = self.nodes.get_mut(child) {
                child.parent = Some(new_key.clone());
            }
        }
        if let Some(parent) = self.nodes.get_mut(&parent) {
            if let Some(ix) = parent.children.iter().position(|k| k == key) {
                parent.children[ix] = new_key.clone();
            }
        }
        self.nodes.insert(new_key.clone(), entry);

        if let Some(selection) = self.selection.as_mut() {
            selection.rekey(key, &new_key);
        }
        Ok(before)
    }

    /// Point `from` and everything that resolved to it at `to`, then drop
    /// aliases no history entry can ask for. Chains stay one hop long and
    /// the table stays bounded by the history size.
    fn add_alias(&mut self, from: &NodeKey, to: &NodeKey) {
        for target in self.aliases.values_mut() {
            if target == from {
                *target = to.clone();
            }
        }
        self.aliases.insert(from.clone(), to.clone());

        let referenced: HashSet<&NodeKey> =
            self.history.entries().flat_map(TreeEdit::keys).collect();
        self.aliases.retain(|k, _| referenced.contains(k));
    }

    fn detach(&mut self, key: &NodeKey) -> Result<(NodeKey, usize), TreeError> {
        let parent = self
            .nodes
            .get(key)
            .ok_or_else(|| TreeError::NodeNotFound(key.clone()))?
            .parent
            .clone()
            .ok_or_else(|| TreeError::DetachedNode(key.clone()))?;
        let index = self
            .nodes
            .get_mut(&parent)
            .and_then(|p| {
                let ix = p.children.iter().position(|k| k == key)?;
                p.children.remove(ix);
                Some(ix)
            })
            .ok_or_else(|| TreeError::DetachedNode(key.clone()))?;
        Ok((parent, index))
    }

    fn take_subtree(&mut self, key: &NodeKey) -> Vec<(NodeKey, NodeEntry)> {
        let mut removed = Vec::new();
        let mut stack = vec![key.clone()];
        while let Some(next) = stack.pop() {
            if let Some(entry) = self.nodes.remove(&next) {
                stack.extend(entry.children.iter().cloned());
                removed.push((next, entry));
            }
        }
        removed
    }

    fn restore_subtree(
        &mut self,
        key: &NodeKey,
        parent: &NodeKey,
        index: usize,
        subtree: &[(NodeKey, NodeEntry)],
    ) -> bool {
        let Some(parent) = self.resolve(parent) else {
            return false;
        };
        for (k, entry) in subtree {
            let mut entry = entry.clone();
            if k == key {
                entry.parent = Some(parent.clone());
            }
            self.nodes.insert(k.clone(), entry);
        }
        if let Some(p) = self.nodes.get_mut(&parent) {
            let index = index.min(p.children.len());
            p.children.insert(index, key.clone());
        }
        true
    }

    fn fix_selection_after_remove(
        &mut self,
        parent: &NodeKey,
        index: usize,
        removed: &[(NodeKey, NodeEntry)],
    ) {
        let Some(selection) = self.selection.as_mut() else {
            return;
        };
        for point in [&mut selection.anchor, &mut selection.focus] {
            if removed.iter().any(|(k, _)| *k == point.key) {
                *point = Point::element(parent.clone(), index);
            }
        }
    }

    /// Keep text points within their run's length.
    fn clamp_selection(&mut self) {
        let Some(selection) = self.selection.as_mut() else {
            return;
        };
        for point in [&mut selection.anchor, &mut selection.focus] {
            if point.kind != PointKind::Text {
                continue;
            }
            if let Some(run) = self.nodes.get(&point.key).and_then(|e| e.kind.as_run()) {
                point.offset = point.offset.min(run.len_chars());
            }
        }
    }

    fn set_run_text(&mut self, key: &NodeKey, text: &str) -> bool {
        let Some(key) = self.resolve(key) else {
            return false;
        };
        match self.nodes.get_mut(&key).and_then(|e| e.kind.as_run_mut()) {
            Some(run) => {
                run.text = text.to_string();
                self.clamp_selection();
                true
            }
            None => false,
        }
    }

    fn set_run_format(&mut self, key: &NodeKey, format: TextFormat) -> bool {
        let Some(key) = self.resolve(key) else {
            return false;
        };
        match self.nodes.get_mut(&key).and_then(|e| e.kind.as_run_mut()) {
            Some(run) => {
                run.format = format;
                true
            }
            None => false,
        }
    }

    fn set_item_checked(&mut self, key: &NodeKey, checked: bool) -> bool {
        let Some(key) = self.resolve(key) else {
            return false;
        };
        match self.nodes.get_mut(&key).map(|e| &mut e.kind) {
            Some(NodeKind::ListItem { checked: current }) => {
                *current = checked;
                true
            }
            _ => false,
        }
    }

    /// Undo one edit. Returns the edit to push on the redo stack, or None
    /// when the edit no longer applies.
    fn revert(&mut self, mut edit: TreeEdit) -> Option<TreeEdit> {
        let applied = match &mut edit {
            TreeEdit::SetText { key, before, .. } => self.set_run_text(key, before),
            TreeEdit::SetFormat { key, before, .. } => self.set_run_format(key, *before),
            TreeEdit::SetChecked { key, before, .. } => self.set_item_checked(key, *before),
            TreeEdit::Replace {
                old_key,
                new_key,
                before,
                ..
            } => match self.resolve(new_key) {
                Some(current) => self
                    .swap_entry(&current, old_key.clone(), before.clone())
                    .is_ok(),
                None => false,
            },
            TreeEdit::Remove {
                key,
                parent,
                index,
                subtree,
            } => self.restore_subtree(key, parent, *index, subtree),
        };
        applied.then_some(edit)
    }

    /// Redo one edit. Returns the edit to push back on the undo stack.
    fn reapply(&mut self, mut edit: TreeEdit) -> Option<TreeEdit> {
        let applied = match &mut edit {
            TreeEdit::SetText { key, after, .. } => self.set_run_text(key, after),
            TreeEdit::SetFormat { key, after, .. } => self.set_run_format(key, *after),
            TreeEdit::SetChecked { key, after, .. } => self.set_item_checked(key, *after),
            TreeEdit::Replace {
                old_key,
                new_key,
                after,
                ..
            } => match self.resolve(old_key) {
                Some(current) => self
                    .swap_entry(&current, new_key.clone(), after.clone())
                    .is_ok(),
                None => false,
            },
            TreeEdit::Remove {
                key,
                parent,
                index,
                subtree,
            } => match self.resolve(key) {
                Some(current) => match self.detach(&current) {
                    Ok((p, ix)) => {
                        *subtree = self.take_subtree(&current);
                        self.fix_selection_after_remove(&p, ix, subtree);
                        *key = current;
                        *parent = p;
                        *index = ix;
                        true
                    }
                    Err(_) => false,
                },
                None => false,
            },
        };
        applied.then_some(edit)
    }
}

impl DocumentTree for MemoryTree {
    fn selection(&self) -> Option<TreeSelection> {
        self.selection.clone()
    }

    fn kind(&self, key: &NodeKey) -> Option<&NodeKind> {
        self.nodes.get(key).map(|e| &e.kind)
    }

    fn parent(&self, key: &NodeKey) -> Option<&NodeKey> {
        self.nodes.get(key).and_then(|e| e.parent.as_ref())
    }

    fn children(&self, key: &NodeKey) -> &[NodeKey] {
        self.nodes
            .get(key)
            .map(|e| e.children.as_slice())
            .unwrap_or(&[])
    }

    fn replace_node(
        &mut self,
        key: &NodeKey,
        replacement: NodeKind,
        history: HistoryMode,
    ) -> Result<NodeKey, TreeError> {
        let new_key = format_smolstr!("n{}", self.next_id);
        let after = (history == HistoryMode::Record).then(|| replacement.clone());
        let before = self.swap_entry(key, new_key.clone(), replacement)?;
        self.next_id += 1;

        match after {
            Some(after) => {
                self.history.record(TreeEdit::Replace {
                    old_key: key.clone(),
                    new_key: new_key.clone(),
                    before,
                    after,
                });
                self.updates.push(UpdateTags::empty());
            }
            None => {
                self.add_alias(key, &new_key);
                self.updates.push(UpdateTags::SKIP_HISTORY);
            }
        }
        Ok(new_key)
    }
}

impl UndoManager for MemoryTree {
    fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn undo(&mut self) -> bool {
        while let Some(edit) = self.history.take_undo() {
            if let Some(edit) = self.revert(edit) {
                self.history.push_redo(edit);
                self.updates.push(UpdateTags::HISTORIC);
                return true;
            }
            tracing::debug!(target: "marginalia::history", "dropping stale undo entry");
        }
        false
    }

    fn redo(&mut self) -> bool {
        while let Some(edit) = self.history.take_redo() {
            if let Some(edit) = self.reapply(edit) {
                self.history.push_undo(edit);
                self.updates.push(UpdateTags::HISTORIC);
                return true;
            }
            tracing::debug!(target: "marginalia::history", "dropping stale redo entry");
        }
        false
    }

    fn clear_history(&mut self) {
        self.history.clear();
        self.aliases.clear();
    }
}
