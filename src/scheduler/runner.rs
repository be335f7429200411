//! This module contains [`Runner`], the state machine that owns one
//! suspended routine and drives it across its suspension points.
//!
//! A runner moves through created → running → suspended (on an operation
//! or on idle) → running → … → finalized. The suspended states are held
//! implicitly: an idle suspension parks a resumption on the host loop, an
//! operation suspension parks the runner inside the awaited token.
//! Finalized is terminal; the routine and the outcome callback are both
//! nulled, so any stray resumption afterwards is a no-op.

use std::any::Any;
use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use crate::coroutine::{Idle, Resume, RoutineImpl, Step};
use crate::error::Failure;
use crate::event_loop::EventLoop;
use crate::op::PendingOp;
use crate::outcome::{Outcome, Value};

/// The caller-supplied callback invoked exactly once with the final
/// [`Outcome`].
pub type OutcomeFn = Box<dyn FnOnce(Outcome)>;

struct RunnerState {
    routine: Option<RoutineImpl>,
    on_done: Option<OutcomeFn>,
    ev: Rc<dyn EventLoop>,
}

/// Drives one routine to completion. Cheap to clone; clones share the
/// same routine.
#[derive(Clone)]
pub struct Runner {
    state: Rc<RefCell<RunnerState>>,
}

impl Runner {
    pub(crate) fn new(
        routine: Option<RoutineImpl>,
        on_done: OutcomeFn,
        ev: Rc<dyn EventLoop>,
    ) -> Self {
        Self {
            state: Rc::new(RefCell::new(RunnerState {
                routine,
                on_done: Some(on_done),
                ev,
            })),
        }
    }

    /// First resumption; the routine has no suspension point to deliver a
    /// value to yet.
    pub(crate) fn start(&self) {
        self.run(Resume::Value(None));
    }

    /// Resumes the routine with the value its awaited suspension produced.
    pub(crate) fn resume(&self, value: Option<Value>) {
        self.run(Resume::Value(value));
    }

    /// Re-injects a failure at the routine's suspension point, so
    /// routine-local handling observes it exactly as if it had been raised
    /// there.
    pub(crate) fn resume_with_failure(&self, failure: Failure) {
        self.run(Resume::Failure(failure));
    }

    fn run(&self, input: Resume) {
        let step = {
            let mut state = self.state.borrow_mut();
            let Some(routine) = state.routine.as_mut() else {
                // finalized; a stray completion has nothing to resume
                return;
            };
            routine.resume(input)
        };

        match step {
            Ok(Step::Suspended(yielded)) => self.on_suspend(yielded),
            Ok(Step::Complete(value)) => self.finalize(Outcome::success(value)),
            Err(failure) => self.finalize(Outcome::failure(failure)),
        }
    }

    fn on_suspend(&self, yielded: Box<dyn Any>) {
        if yielded.is::<Idle>() {
            let this = self.clone();
            let ev = self.state.borrow().ev.clone();
            ev.idle_add(Box::new(move || this.resume(None)));
            return;
        }

        match yielded.downcast::<PendingOp>() {
            Ok(op) => op.attach(self.clone()),
            // surfaced through the routine's own failure handling,
            // without a host-loop round trip
            Err(_) => self.resume_with_failure(Failure::ProtocolViolation),
        }
    }

    /// Invokes the outcome callback exactly once and releases the routine.
    /// A panicking callback is logged and suppressed; it must not reach
    /// the loop's dispatch machinery.
    pub(crate) fn finalize(&self, outcome: Outcome) {
        let on_done = {
            let mut state = self.state.borrow_mut();
            state.routine = None;
            state.on_done.take()
        };
        let Some(on_done) = on_done else {
            return;
        };

        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| on_done(outcome))) {
            tracing::error!(
                "outcome callback panicked: {}",
                panic_message(panic.as_ref())
            );
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg
    } else {
        "non-string panic payload"
    }
}
