//! Browser DOM layer for the marginalia reveal engine.
//!
//! This crate paints block markers into the live DOM and drives the
//! engine's debounce and frame work from browser callbacks. It assumes a
//! `wasm32-unknown-unknown` target environment.
//!
//! # Architecture
//!
//! - `markers`: `DomMarkerSurface`, markers as `<span>` elements on rendered nodes
//! - `schedule`: cancellable `setTimeout` / `requestAnimationFrame` handles
//! - `driver`: `RevealDriver`, wiring the engine, the surface and the callbacks
//!
//! # Re-exports
//!
//! This crate re-exports `marginalia-reveal` for convenience, so consumers
//! only need to depend on `marginalia-reveal-browser`.

// Re-export core crate
pub use marginalia_reveal;
pub use marginalia_reveal::*;

pub mod driver;
pub mod markers;
pub mod schedule;

pub use driver::RevealDriver;
pub use markers::{DEFAULT_MARKER_CLASS, DomMarkerSurface};
pub use schedule::{AnimationFrame, Timeout, delay_until, timeout_millis};
