//! This module contains [`spawn`], the entry point that turns a routine
//! definition into a driven coroutine.

use std::rc::Rc;

use crate::coroutine::{Routine, RoutineImpl};
use crate::error::Failure;
use crate::event_loop::EventLoop;
use crate::outcome::{Outcome, Value};
use crate::scheduler::{OutcomeFn, Runner};

/// What a routine definition produced when it was invoked.
pub enum Spawned {
    /// A fresh, unstarted routine for a [`Runner`] to drive.
    Routine(RoutineImpl),

    /// The definition ran to completion synchronously, with no suspension
    /// points; its value is the immediate outcome.
    Value(Option<Value>),
}

impl Spawned {
    /// Wraps a routine to be driven across its suspension points.
    pub fn routine<R: Routine + 'static>(routine: R) -> Self {
        Spawned::Routine(Box::new(routine))
    }

    /// Immediate completion with a value.
    pub fn value<T: std::any::Any>(value: T) -> Self {
        Spawned::Value(Some(Box::new(value)))
    }

    /// Immediate completion without a value.
    pub fn done() -> Self {
        Spawned::Value(None)
    }
}

/// Invokes `definition` and drives whatever it produced, reporting the
/// eventual outcome to `on_done` exactly once.
///
/// A definition that produces a routine gets a [`Runner`] and is resumed
/// through `ev`'s idle facility and through the operations it suspends on.
/// A definition that completes synchronously (a plain computation, or one
/// that fails before ever suspending) is finalized on the spot, with no
/// token or idle machinery touched; callers cannot tell the two apart.
///
/// `on_done: None` selects the default callback, which logs unhandled
/// failures and discards values.
pub fn spawn<E, F>(ev: &Rc<E>, definition: F, on_done: Option<OutcomeFn>)
where
    E: EventLoop + 'static,
    F: FnOnce() -> Result<Spawned, Failure>,
{
    let ev: Rc<dyn EventLoop> = ev.clone();
    let on_done = on_done.unwrap_or_else(|| Box::new(default_on_done));

    match definition() {
        Ok(Spawned::Routine(routine)) => {
            Runner::new(Some(routine), on_done, ev).start();
        }
        Ok(Spawned::Value(value)) => {
            Runner::new(None, on_done, ev).finalize(Outcome::success(value));
        }
        Err(failure) => {
            Runner::new(None, on_done, ev).finalize(Outcome::failure(failure));
        }
    }
}

fn default_on_done(outcome: Outcome) {
    if let Err(failure) = outcome.result() {
        tracing::error!("unhandled failure in coroutine: {failure}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coroutine::{routine_fn, Resume, Step};
    use crate::event_loop::{IdleCallback, LocalLoop};
    use crate::op::launch;
    use crate::op::Completion;
    use std::cell::{Cell, RefCell};
    use std::io;

    /// Counts idle scheduling while delegating to a real loop, so tests
    /// can assert the exact number of idle round trips.
    struct CountingLoop {
        inner: Rc<LocalLoop>,
        idles: Cell<usize>,
    }

    impl EventLoop for CountingLoop {
        fn idle_add(&self, cb: IdleCallback) {
            self.idles.set(self.idles.get() + 1);
            self.inner.idle_add(cb);
        }
    }

    struct Driver {
        ev: Rc<CountingLoop>,
        outcome: Rc<RefCell<Option<Outcome>>>,
        fired: Rc<Cell<u32>>,
    }

    impl Driver {
        fn new() -> Self {
            Self {
                ev: Rc::new(CountingLoop {
                    inner: Rc::new(LocalLoop::new()),
                    idles: Cell::new(0),
                }),
                outcome: Rc::new(RefCell::new(None)),
                fired: Rc::new(Cell::new(0)),
            }
        }

        fn on_done(&self) -> OutcomeFn {
            let outcome = self.outcome.clone();
            let fired = self.fired.clone();
            Box::new(move |o| {
                fired.set(fired.get() + 1);
                *outcome.borrow_mut() = Some(o);
            })
        }

        /// Spawns, runs the loop dry, and hands back the single outcome.
        fn drive<F>(&self, definition: F) -> Outcome
        where
            F: FnOnce() -> Result<Spawned, Failure>,
        {
            spawn(&self.ev, definition, Some(self.on_done()));
            self.ev.inner.run();
            assert_eq!(self.fired.get(), 1, "outcome callback must fire exactly once");
            self.outcome.borrow_mut().take().unwrap()
        }
    }

    fn value_of<T: 'static>(outcome: Outcome) -> T {
        *outcome
            .result()
            .unwrap()
            .expect("expected a value")
            .downcast::<T>()
            .unwrap()
    }

    #[derive(Debug, thiserror::Error)]
    #[error("not found")]
    struct NotFound;

    /// A begin step that delivers its completion through the loop, the way
    /// a real callback-driven library would.
    fn begin_on_idle(ev: &Rc<LocalLoop>, signal: impl std::any::Any) -> impl FnOnce(Completion) + '_ {
        let signal: Box<dyn std::any::Any> = Box::new(signal);
        move |done: Completion| {
            ev.idle_add(Box::new(move || done(signal)));
        }
    }

    #[test]
    fn test_idle_then_done() {
        let driver = Driver::new();
        let mut steps = 0;
        let outcome = driver.drive(move || {
            Ok(Spawned::routine(routine_fn(move |input| {
                input.into_result()?;
                steps += 1;
                Ok(if steps == 1 { Step::idle() } else { Step::done() })
            })))
        });
        assert!(outcome.result().unwrap().is_none());
        assert_eq!(driver.ev.idles.get(), 1);
    }

    #[test]
    fn test_two_idles_then_explicit_return() {
        let driver = Driver::new();
        let mut steps = 0;
        let outcome = driver.drive(move || {
            Ok(Spawned::routine(routine_fn(move |input| {
                input.into_result()?;
                steps += 1;
                Ok(match steps {
                    1 | 2 => Step::idle(),
                    _ => Step::value("done".to_string()),
                })
            })))
        });
        assert_eq!(value_of::<String>(outcome), "done");
        assert_eq!(driver.ev.idles.get(), 2, "exactly two idle round trips");
    }

    #[test]
    fn test_plain_definition_touches_no_machinery() {
        let driver = Driver::new();
        let outcome = driver.drive(|| Ok(Spawned::value(41u32 + 1)));
        assert_eq!(value_of::<u32>(outcome), 42);
        assert_eq!(driver.ev.idles.get(), 0);
    }

    #[test]
    fn test_definition_failing_before_any_suspension() {
        let driver = Driver::new();
        let outcome = driver.drive(|| Err(Failure::raised(NotFound)));
        let failure = outcome.result().unwrap_err();
        assert!(failure.downcast_ref::<NotFound>().is_some());
    }

    #[test]
    fn test_routine_failure_after_idle() {
        let driver = Driver::new();
        let mut steps = 0;
        let outcome = driver.drive(move || {
            Ok(Spawned::routine(routine_fn(move |input| {
                input.into_result()?;
                steps += 1;
                if steps == 1 {
                    Ok(Step::idle())
                } else {
                    Err(Failure::raised(io::Error::other("late")))
                }
            })))
        });
        let failure = outcome.result().unwrap_err();
        assert_eq!(failure.downcast_ref::<io::Error>().unwrap().to_string(), "late");
    }

    #[test]
    fn test_yielding_garbage_is_a_protocol_violation() {
        let driver = Driver::new();
        let outcome = driver.drive(|| {
            Ok(Spawned::routine(routine_fn(|input| {
                input.into_result()?;
                Ok(Step::suspend("oops".to_string()))
            })))
        });
        assert!(outcome.result().unwrap_err().is_protocol_violation());
    }

    #[test]
    fn test_routine_can_recover_from_a_protocol_violation() {
        let driver = Driver::new();
        let mut steps = 0;
        let outcome = driver.drive(move || {
            Ok(Spawned::routine(routine_fn(move |input| {
                steps += 1;
                match input {
                    Resume::Failure(failure) if failure.is_protocol_violation() => {
                        Ok(Step::value("recovered"))
                    }
                    Resume::Failure(failure) => Err(failure),
                    Resume::Value(_) => Ok(Step::suspend(17u8)),
                }
            })))
        });
        assert_eq!(value_of::<&str>(outcome), "recovered");
    }

    #[test]
    fn test_operation_value_reaches_the_routine() {
        let driver = Driver::new();
        let ev = driver.ev.inner.clone();
        let mut steps = 0;
        let outcome = driver.drive(move || {
            Ok(Spawned::routine(routine_fn(move |input| {
                let value = input.into_result()?;
                steps += 1;
                Ok(if steps == 1 {
                    let op = launch(begin_on_idle(&ev, "payload".to_string()), |signal| {
                        Ok::<String, NotFound>(*signal.downcast::<String>().unwrap())
                    });
                    Step::suspend(op)
                } else {
                    Step::Complete(value)
                })
            })))
        });
        assert_eq!(value_of::<String>(outcome), "payload");
    }

    #[test]
    fn test_failing_finish_step_reaches_result() {
        let driver = Driver::new();
        let ev = driver.ev.inner.clone();
        let outcome = driver.drive(move || {
            Ok(Spawned::routine(routine_fn(move |input| {
                input.into_result()?;
                let op = launch(begin_on_idle(&ev, ()), |_signal| Err::<(), NotFound>(NotFound));
                Ok(Step::suspend(op))
            })))
        });
        let failure = outcome.result().unwrap_err();
        assert!(failure.downcast_ref::<NotFound>().is_some());
    }

    #[test]
    fn test_routine_handles_failing_operation() {
        let driver = Driver::new();
        let ev = driver.ev.inner.clone();
        let mut steps = 0;
        let outcome = driver.drive(move || {
            Ok(Spawned::routine(routine_fn(move |input| {
                steps += 1;
                match input {
                    Resume::Failure(failure) => {
                        assert!(failure.downcast_ref::<NotFound>().is_some());
                        Ok(Step::value("handled"))
                    }
                    Resume::Value(_) => {
                        assert_eq!(steps, 1);
                        let op =
                            launch(begin_on_idle(&ev, ()), |_signal| Err::<(), NotFound>(NotFound));
                        Ok(Step::suspend(op))
                    }
                }
            })))
        });
        assert_eq!(value_of::<&str>(outcome), "handled");
    }

    #[test]
    fn test_double_completion_resumes_once() {
        let driver = Driver::new();
        let slot: Rc<RefCell<Option<crate::op::PendingOp>>> = Rc::new(RefCell::new(None));
        let mut steps = 0;
        let outcome = {
            let slot_for_routine = slot.clone();
            let ev = driver.ev.inner.clone();
            spawn(
                &driver.ev,
                move || {
                    Ok(Spawned::routine(routine_fn(move |input| {
                        let value = input.into_result()?;
                        steps += 1;
                        Ok(if steps == 1 {
                            let op = launch(|_done: Completion| {}, |signal| {
                                Ok::<u8, NotFound>(*signal.downcast::<u8>().unwrap())
                            });
                            *slot_for_routine.borrow_mut() = Some(op.clone());
                            Step::suspend(op)
                        } else {
                            Step::Complete(value)
                        })
                    })))
                },
                Some(driver.on_done()),
            );
            // simulated library: completes the same token twice
            let op = slot.borrow_mut().take().unwrap();
            op.complete(Box::new(7u8));
            op.complete(Box::new(8u8));
            ev.run();
            assert_eq!(driver.fired.get(), 1);
            driver.outcome.borrow_mut().take().unwrap()
        };
        assert_eq!(value_of::<u8>(outcome), 7);
    }

    #[test]
    fn test_completion_ahead_of_suspension_still_delivers() {
        let driver = Driver::new();
        let mut steps = 0;
        let outcome = driver.drive(move || {
            Ok(Spawned::routine(routine_fn(move |input| {
                let value = input.into_result()?;
                steps += 1;
                Ok(if steps == 1 {
                    // the "library" completes synchronously inside begin,
                    // before the routine has suspended on the token
                    let op = launch(
                        |done: Completion| done(Box::new(9u16)),
                        |signal| Ok::<u16, NotFound>(*signal.downcast::<u16>().unwrap()),
                    );
                    Step::suspend(op)
                } else {
                    Step::Complete(value)
                })
            })))
        });
        assert_eq!(value_of::<u16>(outcome), 9);
    }

    #[test]
    fn test_default_on_done_discards_quietly() {
        let ev = Rc::new(LocalLoop::new());
        spawn(&ev, || Ok(Spawned::value("ignored")), None);
        spawn(&ev, || Ok(Spawned::done()), None);
        spawn(&ev, || Err(Failure::ProtocolViolation), None);
        ev.run();
    }
}
