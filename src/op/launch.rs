//! This module contains [`launch`], the helper that starts a two-phase
//! operation and returns the [`PendingOp`] the routine suspends on.

use std::any::Any;
use std::error::Error as StdError;

use crate::error::BoxError;
use crate::op::token::{FinishFn, PendingOp, Signal};
use crate::outcome::Value;

/// The completion callback a begin step hands to the wrapped library. The
/// library must invoke it exactly once with the raw completion signal.
pub type Completion = Box<dyn FnOnce(Signal)>;

/// Starts a two-phase operation and returns its token.
///
/// `begin` is invoked immediately (synchronous call, asynchronous effect)
/// with a [`Completion`] that routes the raw signal back to the token.
/// `finish` converts that signal into the operation's value or error once
/// the completion fires. The begin/finish pair is bound here, at the call
/// site, so a mismatched pair is a compile error rather than a runtime
/// lookup failure.
///
/// The returned token must be suspended on for the produced value (or an
/// injected failure) to reach the routine:
///
/// ```
/// use coloop::{launch, Step};
///
/// let op = launch(
///     |done| {
///         // hand `done` to the wrapped library here; for the sake of
///         // the example, complete immediately
///         done(Box::new(42u32));
///     },
///     |signal| Ok::<u32, std::io::Error>(*signal.downcast::<u32>().unwrap()),
/// );
/// let step = Step::suspend(op);
/// ```
pub fn launch<B, F, T, E>(begin: B, finish: F) -> PendingOp
where
    B: FnOnce(Completion),
    F: FnOnce(Signal) -> Result<T, E> + 'static,
    T: Any,
    E: StdError + 'static,
{
    let finish: FinishFn = Box::new(move |signal| {
        finish(signal)
            .map(|value| Box::new(value) as Value)
            .map_err(|err| Box::new(err) as BoxError)
    });

    let op = PendingOp::new(finish);
    let done: Completion = {
        let op = op.clone();
        Box::new(move |signal| op.complete(signal))
    };
    begin(done);
    op
}
