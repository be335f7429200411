//! This module contains [`Routine`], the resumable unit of sequential
//! logic the scheduler owns, and the [`Resume`]/[`Step`] values exchanged
//! with it on every resumption.
//!
//! A routine is an explicit state machine: each [`Routine::resume`] call
//! runs it from its last suspension point to the next one, or to
//! completion. The scheduler resumes it with either the value its awaited
//! suspension produced or a failure injected at that point, so routine
//! code observes asynchronous errors exactly where it suspended.

use std::any::Any;

use crate::coroutine::Idle;
use crate::error::Failure;
use crate::outcome::Value;

/// What a resumption delivers into the routine at its suspension point.
pub enum Resume {
    /// The value the awaited suspension produced. `None` on the first
    /// resumption and after an [`Idle`] suspension.
    Value(Option<Value>),

    /// A failure injected at the suspension point.
    Failure(Failure),
}

impl Resume {
    /// Unpacks the resumption, propagating an injected failure.
    ///
    /// Routine bodies usually start with `let value = input.into_result()?;`
    /// so an injected failure behaves as if it had been raised right at the
    /// suspension point. Match on [`Resume::Failure`] instead to handle it
    /// locally.
    pub fn into_result(self) -> Result<Option<Value>, Failure> {
        match self {
            Resume::Value(value) => Ok(value),
            Resume::Failure(failure) => Err(failure),
        }
    }
}

/// What one slice of execution did: suspended on something, or finished.
pub enum Step {
    /// The routine suspended. The yielded value must be a pending
    /// operation token or [`Idle`]; anything else is a protocol violation
    /// the scheduler injects back as a [`Failure`].
    Suspended(Box<dyn Any>),

    /// The routine ran to completion, with an explicit return value or
    /// without one. The scheduler treats both as success.
    Complete(Option<Value>),
}

impl Step {
    /// Suspends on [`Idle`]: yield control to the loop, resume at its next
    /// idle opportunity.
    pub fn idle() -> Self {
        Step::Suspended(Box::new(Idle))
    }

    /// Suspends on `yielded`, normally a pending operation token.
    pub fn suspend<T: Any>(yielded: T) -> Self {
        Step::Suspended(Box::new(yielded))
    }

    /// Completes without a return value.
    pub fn done() -> Self {
        Step::Complete(None)
    }

    /// Completes with an explicit return value.
    pub fn value<T: Any>(value: T) -> Self {
        Step::Complete(Some(Box::new(value)))
    }
}

/// A resumable unit of sequential logic.
pub trait Routine {
    /// Runs the routine from its last suspension point until it suspends
    /// again or completes. An `Err` is a failure the routine let escape.
    fn resume(&mut self, input: Resume) -> Result<Step, Failure>;
}

/// The boxed form the scheduler owns.
pub type RoutineImpl = Box<dyn Routine>;

/// A [`Routine`] backed by a closure. Created by [`routine_fn`].
pub struct RoutineFn<F>(F);

impl<F> Routine for RoutineFn<F>
where
    F: FnMut(Resume) -> Result<Step, Failure>,
{
    fn resume(&mut self, input: Resume) -> Result<Step, Failure> {
        (self.0)(input)
    }
}

/// Adapts a closure into a [`Routine`], the way `std::iter::from_fn`
/// adapts one into an iterator. The closure carries the state machine in
/// its captures.
pub fn routine_fn<F>(f: F) -> RoutineFn<F>
where
    F: FnMut(Resume) -> Result<Step, Failure>,
{
    RoutineFn(f)
}
