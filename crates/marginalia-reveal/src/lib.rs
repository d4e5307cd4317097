//! marginalia-reveal: reveal-on-focus for a structured markdown editor.
//!
//! This crate provides:
//! - `DocumentTree` trait for the editor's node tree, and `MemoryTree`
//! - Region detectors for inline runs, headings, quotes, list items and code blocks
//! - `RevealEngine` - debounced detection, reconciliation, inline swaps, block markers
//! - `MarkerSurface` trait for painting block markers, and `MemorySurface`

pub mod config;
pub mod detect;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod focus;
pub mod marker;
pub mod memory;
pub mod platform;
pub mod reconcile;
pub mod schedule;
pub mod surface;
pub mod swap;
pub mod syntax;
pub mod tree;
pub mod types;
pub mod undo;

pub use config::{RevealConfig, RevealKinds};
pub use detect::{
    detect_all, detect_blockquote, detect_code_block, detect_heading, detect_inline,
    detect_list_item,
};
pub use dispatch::CursorDispatcher;
pub use engine::RevealEngine;
pub use error::{SwapError, TreeError};
pub use focus::{
    BlockquoteFocus, CodeBlockFocus, Fence, Focus, FocusDiff, FocusState, HeadingFocus,
    InlineRegion, ListItemFocus, SlotChange,
};
pub use marker::{BlockKind, BlockMarkers, MarkerPlan};
pub use memory::MemoryTree;
pub use platform::{MarkerEdge, MarkerSurface};
pub use reconcile::{Reconciler, is_adjacent_to_raw};
pub use schedule::{Clock, DebounceTimer, ManualClock, SystemClock};
pub use smol_str::SmolStr;
pub use surface::{MarkerId, MemorySurface, PlacedMarker};
pub use swap::{InlineSwapper, RevealedNode};
pub use tree::{DocumentTree, HistoryMode, ListKind, NodeKind, TextFormat, TextRun, UpdateTags};
pub use types::{CursorSnapshot, NodeKey, Point, PointKind, TreeSelection};
pub use undo::{History, UndoManager};
