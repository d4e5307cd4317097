//! Cancellable browser callbacks.
//!
//! The debounce uses `gloo_timers::callback::Timeout`, which clears itself on
//! drop. `AnimationFrame` does the same for `requestAnimationFrame`, so
//! replacing a stored handle is how pending work is cancelled.

use std::time::Duration;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_time::Instant;

pub use gloo_timers::callback::Timeout;

pub struct AnimationFrame {
    id: i32,
    _closure: Closure<dyn FnMut()>,
}

impl AnimationFrame {
    /// Run `f` before the next repaint. None if the browser refuses the request.
    pub fn request(f: impl FnOnce() + 'static) -> Option<Self> {
        let closure: Closure<dyn FnMut()> = Closure::once(f);
        let id = gloo_utils::window()
            .request_animation_frame(closure.as_ref().unchecked_ref())
            .ok()?;
        Some(Self {
            id,
            _closure: closure,
        })
    }
}

impl Drop for AnimationFrame {
    fn drop(&mut self) {
        let _ = gloo_utils::window().cancel_animation_frame(self.id);
    }
}

/// Time left until `deadline`, zero if it has passed.
pub fn delay_until(deadline: Instant, now: Instant) -> Duration {
    deadline.saturating_duration_since(now)
}

/// `delay` in whole milliseconds for `Timeout::new`, saturating.
pub fn timeout_millis(delay: Duration) -> u32 {
    u32::try_from(delay.as_millis()).unwrap_or(u32::MAX)
}
