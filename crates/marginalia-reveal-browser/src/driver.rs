//! Browser event-loop driver for the reveal engine.
//!
//! Owns a `RevealEngine` and a `DomMarkerSurface`, shares the document tree
//! with the host, and keeps at most one pending `setTimeout` (for the
//! debounce deadline) and one pending `requestAnimationFrame` (for marker
//! insertion). Callbacks hold weak references. Dropping the driver disposes
//! it: callbacks are cancelled, markers removed and the inline reveal hidden.
//!
//! Hosts forward selection changes and document updates after the tree
//! borrow that produced them has ended.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use marginalia_reveal::{DocumentTree, FocusState, RevealConfig, RevealEngine, UpdateTags};
use web_time::Instant;

use crate::markers::DomMarkerSurface;
use crate::schedule::{AnimationFrame, Timeout, delay_until, timeout_millis};

struct DriverState<T> {
    engine: RevealEngine<DomMarkerSurface>,
    surface: DomMarkerSurface,
    tree: Rc<RefCell<T>>,
    timeout: Option<Timeout>,
    frame: Option<AnimationFrame>,
}

pub struct RevealDriver<T: DocumentTree + 'static> {
    state: Rc<RefCell<DriverState<T>>>,
}

impl<T: DocumentTree + 'static> RevealDriver<T> {
    pub fn new(tree: Rc<RefCell<T>>, surface: DomMarkerSurface, config: RevealConfig) -> Self {
        Self {
            state: Rc::new(RefCell::new(DriverState {
                engine: RevealEngine::new(config),
                surface,
                tree,
                timeout: None,
                frame: None,
            })),
        }
    }

    pub fn selection_changed(&self) {
        self.state.borrow_mut().engine.selection_changed();
        arm_timeout(&self.state);
    }

    pub fn document_updated(&self, tags: UpdateTags) {
        let accepted = self.state.borrow_mut().engine.document_updated(tags);
        if accepted {
            arm_timeout(&self.state);
        }
    }

    /// Detect immediately, e.g. when the editor gains focus.
    pub fn process_now(&self) {
        {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            state.timeout = None;
            let mut tree = state.tree.borrow_mut();
            state.engine.process_now(&mut *tree, &mut state.surface);
        }
        arm_frame(&self.state);
    }

    /// Insert pending markers now instead of on the next animation frame.
    pub fn flush_now(&self) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.frame = None;
        state.engine.flush_frame(&mut state.surface);
    }

    pub fn focus(&self) -> FocusState {
        self.state.borrow().engine.focus().clone()
    }

    /// Cancel pending callbacks, remove markers and hide the inline reveal.
    pub fn dispose(&self) {
        teardown(&mut self.state.borrow_mut());
    }
}

impl<T: DocumentTree + 'static> Drop for RevealDriver<T> {
    fn drop(&mut self) {
        // Only borrowed here on a re-entrant drop.
        let Ok(mut state) = self.state.try_borrow_mut() else {
            tracing::warn!(target: "marginalia::reveal", "driver dropped while busy, skipping dispose");
            return;
        };
        teardown(&mut state);
    }
}

fn teardown<T: DocumentTree>(state: &mut DriverState<T>) {
    state.timeout = None;
    state.frame = None;
    let Ok(mut tree) = state.tree.try_borrow_mut() else {
        tracing::warn!(target: "marginalia::reveal", "tree borrowed by host, skipping dispose");
        return;
    };
    state.engine.dispose(&mut *tree, &mut state.surface);
}

fn arm_timeout<T: DocumentTree + 'static>(state: &Rc<RefCell<DriverState<T>>>) {
    let weak = Rc::downgrade(state);
    let mut guard = state.borrow_mut();
    let Some(deadline) = guard.engine.next_deadline() else {
        guard.timeout = None;
        return;
    };
    let delay = delay_until(deadline, Instant::now());
    // Replacing the handle cancels the previous timeout.
    guard.timeout = Some(Timeout::new(timeout_millis(delay), move || {
        on_timeout(&weak)
    }));
}

fn on_timeout<T: DocumentTree + 'static>(weak: &Weak<RefCell<DriverState<T>>>) {
    let Some(state) = weak.upgrade() else {
        return;
    };
    {
        let mut guard = state.borrow_mut();
        let inner = &mut *guard;
        inner.timeout = None;
        let mut tree = inner.tree.borrow_mut();
        inner.engine.poll(&mut *tree, &mut inner.surface);
    }
    // Timers can fire a little early; re-arm for whatever is still pending.
    arm_timeout(&state);
    arm_frame(&state);
}

fn arm_frame<T: DocumentTree + 'static>(state: &Rc<RefCell<DriverState<T>>>) {
    let weak = Rc::downgrade(state);
    let mut guard = state.borrow_mut();
    if guard.frame.is_some() || !guard.engine.needs_frame() {
        return;
    }
    guard.frame = AnimationFrame::request(move || {
        let Some(state) = weak.upgrade() else {
            return;
        };
        let mut guard = state.borrow_mut();
        let inner = &mut *guard;
        inner.frame = None;
        inner.engine.flush_frame(&mut inner.surface);
    });
}
