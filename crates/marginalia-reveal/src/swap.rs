//! Inline node swapper.
//!
//! Reveal replaces a formatted text run with a raw-markdown run carrying the
//! same text and format; hide puts a text run back. Both go through the
//! tree's replace primitive with `HistoryMode::Skip`, so neither ever shows
//! up in undo history.

use crate::error::SwapError;
use crate::tree::{DocumentTree, HistoryMode, NodeKind, TextFormat, TextRun};
use crate::types::NodeKey;

/// Restoration record for the active inline reveal.
///
/// `original_*` describe the run as it was when revealed. Hide restores from
/// the live raw node instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealedNode {
    pub raw_key: NodeKey,
    pub original_text: String,
    pub original_format: TextFormat,
}

/// Holds at most one active reveal.
#[derive(Debug, Clone, Default)]
pub struct InlineSwapper {
    revealed: Option<RevealedNode>,
}

impl InlineSwapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revealed(&self) -> Option<&RevealedNode> {
        self.revealed.as_ref()
    }

    pub fn raw_key(&self) -> Option<&NodeKey> {
        self.revealed.as_ref().map(|r| &r.raw_key)
    }

    /// Swap the text run at `key` for its raw form. Returns the raw node's key.
    ///
    /// An active reveal is hidden first, so two raw nodes never coexist.
    pub fn reveal<T: DocumentTree + ?Sized>(
        &mut self,
        tree: &mut T,
        key: &NodeKey,
        handled: TextFormat,
    ) -> Result<NodeKey, SwapError> {
        match self.hide(tree) {
            Ok(_) => {}
            // The stale record is gone; nothing is left to restore.
            Err(err) if err.is_stale() => {
                tracing::debug!(target: "marginalia::swap", error = %err, "dropped stale reveal");
            }
            Err(err) => return Err(err),
        }

        let run = match tree.kind(key) {
            Some(NodeKind::Text(run)) => run,
            _ => {
                return Err(SwapError::Stale {
                    key: key.clone(),
                    expected: "text",
                });
            }
        };
        if !run.format.intersects(handled) {
            return Err(SwapError::UnhandledFormat(key.clone()));
        }

        let original_text = run.text.clone();
        let original_format = run.format;
        let raw_key = tree.replace_node(
            key,
            NodeKind::RawMarkdown(TextRun::new(original_text.clone(), original_format)),
            HistoryMode::Skip,
        )?;

        tracing::debug!(
            target: "marginalia::swap",
            %key,
            %raw_key,
            format = original_format.bits(),
            "revealed inline run"
        );
        self.revealed = Some(RevealedNode {
            raw_key: raw_key.clone(),
            original_text,
            original_format,
        });
        Ok(raw_key)
    }

    /// Put a text run back in place of the raw node.
    ///
    /// Returns the restored run's key, or `None` when nothing was revealed.
    /// The run takes the raw node's current text and format, so edits made
    /// while revealed (including undo of a format change) are kept.
    ///
    /// A stale record is dropped. When the tree refuses the replacement the
    /// record is kept so a later hide can retry.
    pub fn hide<T: DocumentTree + ?Sized>(
        &mut self,
        tree: &mut T,
    ) -> Result<Option<NodeKey>, SwapError> {
        let Some(record) = self.revealed.as_ref() else {
            return Ok(None);
        };

        let run = match tree.kind(&record.raw_key) {
            Some(NodeKind::RawMarkdown(run)) => run.clone(),
            _ => {
                let key = record.raw_key.clone();
                self.revealed = None;
                return Err(SwapError::Stale {
                    key,
                    expected: "raw-markdown",
                });
            }
        };
        let edited = run.text != record.original_text || run.format != record.original_format;
        let key = match tree.replace_node(&record.raw_key, NodeKind::Text(run), HistoryMode::Skip) {
            Ok(key) => key,
            Err(err) => {
                let err = SwapError::from(err);
                if err.is_stale() {
                    self.revealed = None;
                }
                return Err(err);
            }
        };

        tracing::debug!(
            target: "marginalia::swap",
            raw_key = %record.raw_key,
            %key,
            edited,
            "hid inline run"
        );
        self.revealed = None;
        Ok(Some(key))
    }
}
