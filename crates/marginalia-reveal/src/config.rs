//! Reveal configuration.

use std::time::Duration;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::tree::TextFormat;

bitflags! {
    /// Which constructs reveal their markdown on focus.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct RevealKinds: u32 {
        const INLINE = 1;
        const HEADING = 1 << 1;
        const BLOCKQUOTE = 1 << 2;
        const LIST_ITEM = 1 << 3;
        const CODE_BLOCK = 1 << 4;
    }
}

impl Default for RevealKinds {
    fn default() -> Self {
        Self::all()
    }
}

/// Tuning for the reveal engine.
///
/// Every field has a default, so a host can embed this in its own settings
/// and only override what it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// Debounce window for cursor detection, in milliseconds. About one frame.
    pub debounce_ms: u64,
    /// Text formats that reveal inline.
    pub handled_formats: TextFormat,
    /// Constructs that take part in reveal.
    pub kinds: RevealKinds,
    /// Spaces of indent per nested list level in list prefixes.
    pub list_indent: usize,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 16,
            handled_formats: TextFormat::HANDLED,
            kinds: RevealKinds::default(),
            list_indent: 2,
        }
    }
}

impl RevealConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce_ms = debounce.as_millis() as u64;
        self
    }

    pub fn with_kinds(mut self, kinds: RevealKinds) -> Self {
        self.kinds = kinds;
        self
    }

    pub fn with_handled_formats(mut self, formats: TextFormat) -> Self {
        self.handled_formats = formats;
        self
    }

    pub fn enabled(&self, kind: RevealKinds) -> bool {
        self.kinds.contains(kind)
    }
}
