//! This module contains the host-loop seam.
//!
//! The scheduler needs exactly one facility from the loop it runs on:
//! schedule a callback to run once, at the loop's next idle opportunity.
//! That is the [`EventLoop`] trait. [`LocalLoop`] is a small
//! single-threaded implementation for callers and tests; production users
//! instead implement [`EventLoop`] for whatever loop already drives their
//! process.

use std::cell::RefCell;
use std::collections::VecDeque;

use slab::Slab;

/// A callback scheduled to run once when the loop is idle.
pub type IdleCallback = Box<dyn FnOnce()>;

/// The slice of a host loop the scheduler relies on.
pub trait EventLoop {
    /// Schedules `cb` to run once, at the loop's next idle opportunity.
    /// Ordering relative to other idle work is the loop's own business.
    fn idle_add(&self, cb: IdleCallback);
}

/// Identifies a source added to a [`LocalLoop`], for removal before it
/// runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceId(usize);

struct LoopState {
    sources: Slab<IdleCallback>,
    // dispatch order; keys of removed sources are skipped
    queue: VecDeque<usize>,
    quit: bool,
}

/// A single-threaded dispatch loop with removable, FIFO idle sources.
///
/// [`LocalLoop::run`] dispatches sources until [`LocalLoop::quit`] is
/// called or none remain. Without timers or cross-thread wakeups nothing
/// can re-arm an empty loop, so an empty queue ends the run rather than
/// blocking forever.
pub struct LocalLoop {
    state: RefCell<LoopState>,
}

impl LocalLoop {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(LoopState {
                sources: Slab::new(),
                queue: VecDeque::new(),
                quit: false,
            }),
        }
    }

    /// Schedules `cb` to run once and returns an id usable with
    /// [`LocalLoop::source_remove`]. Sources added while the loop is
    /// running are dispatched in the same run.
    pub fn idle_add(&self, cb: IdleCallback) -> SourceId {
        let mut state = self.state.borrow_mut();
        let key = state.sources.insert(cb);
        state.queue.push_back(key);
        SourceId(key)
    }

    /// Removes a not-yet-dispatched source. Returns whether it was still
    /// pending.
    pub fn source_remove(&self, id: SourceId) -> bool {
        self.state.borrow_mut().sources.try_remove(id.0).is_some()
    }

    /// Dispatches sources in order until [`LocalLoop::quit`] is called or
    /// no sources remain.
    pub fn run(&self) {
        loop {
            let cb = {
                let mut state = self.state.borrow_mut();
                if state.quit {
                    state.quit = false;
                    return;
                }
                match state.queue.pop_front() {
                    // removed before dispatch
                    Some(key) => match state.sources.try_remove(key) {
                        Some(cb) => cb,
                        None => continue,
                    },
                    None => return,
                }
            };
            cb();
        }
    }

    /// Stops the current [`LocalLoop::run`] before its next dispatch.
    /// Pending sources stay queued for a later run.
    pub fn quit(&self) {
        self.state.borrow_mut().quit = true;
    }

    /// The number of sources waiting to be dispatched.
    pub fn pending(&self) -> usize {
        self.state.borrow().sources.len()
    }
}

impl Default for LocalLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLoop for LocalLoop {
    fn idle_add(&self, cb: IdleCallback) {
        LocalLoop::idle_add(self, cb);
    }
}
