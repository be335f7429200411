//! This module contains [`PendingOp`], the token for one outstanding
//! two-phase operation.
//!
//! The token is created by [`launch`](crate::op::launch) before the
//! operation's begin step runs, yielded by the routine, and completed
//! exactly once when the wrapped library signals completion. At most one
//! [`Runner`] is ever attached to it, and both the finish step and the
//! runner back-reference are taken before re-entry, so a second
//! completion finds nothing left to do.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{BoxError, Failure};
use crate::outcome::Value;
use crate::scheduler::Runner;

/// The raw completion signal the wrapped library delivers; only the
/// operation's own finish step knows its concrete type.
pub type Signal = Box<dyn std::any::Any>;

pub(crate) type FinishFn = Box<dyn FnOnce(Signal) -> Result<Value, BoxError>>;

struct TokenState {
    finish: Option<FinishFn>,
    runner: Option<Runner>,
    // completion that arrived before a runner was attached
    early: Option<Result<Value, Failure>>,
}

/// One outstanding two-phase operation.
///
/// Clones share the same state: the clone captured by the library-level
/// completion callback is the correlation handle that finds its way back
/// to the suspended routine.
#[derive(Clone)]
pub struct PendingOp {
    state: Rc<RefCell<TokenState>>,
}

impl PendingOp {
    pub(crate) fn new(finish: FinishFn) -> Self {
        Self {
            state: Rc::new(RefCell::new(TokenState {
                finish: Some(finish),
                runner: None,
                early: None,
            })),
        }
    }

    /// Completes the operation with the library's raw signal: applies the
    /// finish step and resumes the attached runner with the produced value
    /// or the reported failure. A second call is a no-op.
    pub fn complete(&self, signal: Signal) {
        let finish = self.state.borrow_mut().finish.take();
        let Some(finish) = finish else {
            // already completed
            return;
        };

        let result = finish(signal).map_err(Failure::Operation);

        // clear the back-reference before resuming, so a defensive
        // re-entry from inside the routine finds the token spent
        let runner = self.state.borrow_mut().runner.take();
        match runner {
            Some(runner) => match result {
                Ok(value) => runner.resume(Some(value)),
                Err(failure) => runner.resume_with_failure(failure),
            },
            None => {
                tracing::debug!("operation completed before its routine suspended on it");
                self.state.borrow_mut().early = Some(result);
            }
        }
    }

    /// Attaches the runner awaiting this operation. If the completion
    /// already arrived, the runner is resumed with it right away.
    pub(crate) fn attach(&self, runner: Runner) {
        let early = self.state.borrow_mut().early.take();
        match early {
            Some(Ok(value)) => runner.resume(Some(value)),
            Some(Err(failure)) => runner.resume_with_failure(failure),
            None => self.state.borrow_mut().runner = Some(runner),
        }
    }
}
