//! Error types for tree mutation and inline swaps.
//!
//! None of these reach the end user. The engine logs them and recovers by
//! clearing the affected focus state.

use thiserror::Error;

use crate::types::NodeKey;

/// Errors from the tree's replace primitive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TreeError {
    /// Key does not resolve to a live node.
    #[error("node {0} not found")]
    NodeNotFound(NodeKey),

    /// Node exists but has no parent (the root cannot be replaced).
    #[error("node {0} is detached from the tree")]
    DetachedNode(NodeKey),

    /// Children can only be attached to element nodes.
    #[error("node {0} cannot have children")]
    NotContainer(NodeKey),

    /// Replacement kind cannot take the place of the existing node.
    #[error("cannot replace {key} ({existing}) with {replacement}")]
    InvalidReplacement {
        key: NodeKey,
        existing: &'static str,
        replacement: &'static str,
    },
}

/// Errors from revealing or hiding an inline region.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SwapError {
    /// Stored key no longer resolves to a node of the expected kind.
    #[error("stale reference: {key} is no longer a {expected} node")]
    Stale {
        key: NodeKey,
        expected: &'static str,
    },

    /// Run exists but its format has no revealable delimiter.
    #[error("format of {0} is not revealable")]
    UnhandledFormat(NodeKey),

    /// The tree rejected the replacement.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl SwapError {
    /// Stale references are expected during fast edits and only logged at debug.
    pub fn is_stale(&self) -> bool {
        matches!(
            self,
            SwapError::Stale { .. }
                | SwapError::UnhandledFormat(_)
                | SwapError::Tree(TreeError::NodeNotFound(_))
        )
    }
}
