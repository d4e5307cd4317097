//! Focus descriptors and per-slot diffing.
//!
//! One descriptor type per revealable construct. The reconciler keeps at
//! most one of each in a `FocusState` and compares them cycle to cycle with
//! `diff_slot`, which only looks at the fields that change what is rendered.

use smol_str::SmolStr;

use crate::tree::{ListKind, TextFormat};
use crate::types::NodeKey;

/// A focus descriptor stored in one of the five slots.
pub trait Focus: Clone + std::fmt::Debug {
    /// Node that owns the reveal.
    fn key(&self) -> &NodeKey;

    /// Equality on the fields that matter to rendering.
    fn same_focus(&self, other: &Self) -> bool;
}

/// Caret inside a formatted text run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineRegion {
    pub key: NodeKey,
    pub format: TextFormat,
    pub start_offset: usize,
    /// Run length in chars.
    pub end_offset: usize,
}

impl Focus for InlineRegion {
    fn key(&self) -> &NodeKey {
        &self.key
    }

    // Offsets change while typing inside the run and do not affect the reveal.
    fn same_focus(&self, other: &Self) -> bool {
        self.key == other.key && self.format == other.format
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingFocus {
    pub key: NodeKey,
    pub level: u8,
}

/// Innermost quote around the caret and how many quotes enclose it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockquoteFocus {
    pub key: NodeKey,
    pub depth: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItemFocus {
    pub key: NodeKey,
    pub kind: ListKind,
    /// 1-based position among the items of its list.
    pub index: usize,
    /// Number of enclosing lists; 1 for a top-level item.
    pub depth: usize,
    /// Always false outside check lists.
    pub checked: bool,
    /// Number of the list's first item.
    pub list_start: u32,
}

impl ListItemFocus {
    /// Number shown for this item in a numbered list.
    pub fn number(&self) -> u64 {
        (u64::from(self.list_start) + self.index as u64).saturating_sub(1)
    }
}

/// Which fences of a code block are revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fence {
    Open,
    Close,
    Both,
}

impl Fence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Fence::Open => "open",
            Fence::Close => "close",
            Fence::Both => "both",
        }
    }

    pub fn has_open(&self) -> bool {
        matches!(self, Fence::Open | Fence::Both)
    }

    pub fn has_close(&self) -> bool {
        matches!(self, Fence::Close | Fence::Both)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlockFocus {
    pub key: NodeKey,
    pub language: SmolStr,
    pub fence: Fence,
}

macro_rules! block_focus {
    ($($ty:ty),*) => {
        $(
            impl Focus for $ty {
                fn key(&self) -> &NodeKey {
                    &self.key
                }

                fn same_focus(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

block_focus!(HeadingFocus, BlockquoteFocus, ListItemFocus, CodeBlockFocus);

/// Outcome of comparing one slot between cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotChange<T> {
    Unchanged,
    Started(T),
    Stopped(T),
    /// Stop the old focus, then start the new one.
    Replaced { from: T, to: T },
}

impl<T> SlotChange<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, SlotChange::Unchanged)
    }

    /// Focus that must be torn down, if any.
    pub fn stopped(&self) -> Option<&T> {
        match self {
            SlotChange::Stopped(old) | SlotChange::Replaced { from: old, .. } => Some(old),
            _ => None,
        }
    }

    /// Focus that must be set up, if any.
    pub fn started(&self) -> Option<&T> {
        match self {
            SlotChange::Started(new) | SlotChange::Replaced { to: new, .. } => Some(new),
            _ => None,
        }
    }
}

/// Compare a slot's previous and next value.
pub fn diff_slot<T: Focus>(prev: Option<&T>, next: Option<&T>) -> SlotChange<T> {
    match (prev, next) {
        (None, None) => SlotChange::Unchanged,
        (None, Some(next)) => SlotChange::Started(next.clone()),
        (Some(prev), None) => SlotChange::Stopped(prev.clone()),
        (Some(prev), Some(next)) if prev.same_focus(next) => SlotChange::Unchanged,
        (Some(prev), Some(next)) => SlotChange::Replaced {
            from: prev.clone(),
            to: next.clone(),
        },
    }
}

/// The five focus slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusState {
    pub inline: Option<InlineRegion>,
    pub heading: Option<HeadingFocus>,
    pub blockquote: Option<BlockquoteFocus>,
    pub list_item: Option<ListItemFocus>,
    pub code_block: Option<CodeBlockFocus>,
}

impl FocusState {
    pub fn is_empty(&self) -> bool {
        self.inline.is_none()
            && self.heading.is_none()
            && self.blockquote.is_none()
            && self.list_item.is_none()
            && self.code_block.is_none()
    }

    /// Diff every slot against `next`.
    pub fn diff(&self, next: &FocusState) -> FocusDiff {
        FocusDiff {
            inline: diff_slot(self.inline.as_ref(), next.inline.as_ref()),
            heading: diff_slot(self.heading.as_ref(), next.heading.as_ref()),
            blockquote: diff_slot(self.blockquote.as_ref(), next.blockquote.as_ref()),
            list_item: diff_slot(self.list_item.as_ref(), next.list_item.as_ref()),
            code_block: diff_slot(self.code_block.as_ref(), next.code_block.as_ref()),
        }
    }
}

/// Per-slot changes of one processed cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusDiff {
    pub inline: SlotChange<InlineRegion>,
    pub heading: SlotChange<HeadingFocus>,
    pub blockquote: SlotChange<BlockquoteFocus>,
    pub list_item: SlotChange<ListItemFocus>,
    pub code_block: SlotChange<CodeBlockFocus>,
}

impl FocusDiff {
    pub fn is_unchanged(&self) -> bool {
        self.inline.is_unchanged()
            && self.heading.is_unchanged()
            && self.blockquote.is_unchanged()
            && self.list_item.is_unchanged()
            && self.code_block.is_unchanged()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(key: &str, format: TextFormat, len: usize) -> InlineRegion {
        InlineRegion {
            key: key.into(),
            format,
            start_offset: 0,
            end_offset: len,
        }
    }

    #[test]
    fn test_diff_slot_outcomes() {
        let a = HeadingFocus {
            key: "h1".into(),
            level: 1,
        };
        let b = HeadingFocus {
            key: "h1".into(),
            level: 2,
        };

        assert_eq!(diff_slot::<HeadingFocus>(None, None), SlotChange::Unchanged);
        assert_eq!(diff_slot(None, Some(&a)), SlotChange::Started(a.clone()));
        assert_eq!(diff_slot(Some(&a), None), SlotChange::Stopped(a.clone()));
        assert_eq!(diff_slot(Some(&a), Some(&a)), SlotChange::Unchanged);
        assert_eq!(
            diff_slot(Some(&a), Some(&b)),
            SlotChange::Replaced {
                from: a.clone(),
                to: b.clone()
            }
        );
    }

    #[test]
    fn test_inline_ignores_offsets() {
        let before = region("t1", TextFormat::BOLD, 4);
        let typed = region("t1", TextFormat::BOLD, 5);
        assert!(before.same_focus(&typed));

        let reformatted = region("t1", TextFormat::BOLD | TextFormat::ITALIC, 4);
        assert!(!before.same_focus(&reformatted));
    }

    #[test]
    fn test_list_item_tracks_index_and_checked() {
        let item = ListItemFocus {
            key: "li".into(),
            kind: ListKind::Check,
            index: 1,
            depth: 1,
            checked: false,
            list_start: 1,
        };
        let checked = ListItemFocus {
            checked: true,
            ..item.clone()
        };
        let moved = ListItemFocus {
            index: 2,
            ..item.clone()
        };
        assert!(!item.same_focus(&checked));
        assert!(!item.same_focus(&moved));
    }

    #[test]
    fn test_list_number_uses_start() {
        let item = ListItemFocus {
            key: "li".into(),
            kind: ListKind::Number,
            index: 2,
            depth: 1,
            checked: false,
            list_start: 5,
        };
        assert_eq!(item.number(), 6);

        let zeroed = ListItemFocus {
            index: 0,
            list_start: 0,
            ..item
        };
        assert_eq!(zeroed.number(), 0);
    }

    #[test]
    fn test_change_accessors() {
        let a = region("a", TextFormat::BOLD, 1);
        let b = region("b", TextFormat::CODE, 1);
        let change = SlotChange::Replaced {
            from: a.clone(),
            to: b.clone(),
        };
        assert_eq!(change.stopped(), Some(&a));
        assert_eq!(change.started(), Some(&b));
        assert_eq!(SlotChange::Started(b.clone()).stopped(), None);
    }

    #[test]
    fn test_empty_state_diff_is_unchanged() {
        let state = FocusState::default();
        assert!(state.is_empty());
        assert!(state.diff(&FocusState::default()).is_unchanged());
    }
}
