//! Straight-line coroutines over a callback-driven event loop.
//!
//! Code that chains many asynchronous operations on a single-threaded
//! loop normally ends up as nested completion handlers. This crate lets
//! it be written as a sequential routine instead: the routine suspends on
//! the token of a two-phase (begin/finish) operation or on [`Idle`], and
//! a [`Runner`] resumes it with the produced value, or re-injects the
//! failure at the suspension point, each time a completion fires. The
//! eventual outcome reaches a caller-supplied callback exactly once, as
//! an [`Outcome`] with deferred failure access.
//!
//! Everything is single-threaded and cooperative. The wrapped
//! asynchronous library and the host loop are external collaborators;
//! the loop is consumed through the one-method [`EventLoop`] trait, and
//! [`LocalLoop`] is a small implementation of it for tests and simple
//! callers.
//!
//! ```
//! use std::rc::Rc;
//! use coloop::{routine_fn, spawn, LocalLoop, Spawned, Step};
//!
//! let ev = Rc::new(LocalLoop::new());
//!
//! let mut steps = 0;
//! let routine = routine_fn(move |input| {
//!     input.into_result()?;
//!     steps += 1;
//!     Ok(match steps {
//!         1 | 2 => Step::idle(),         // let the loop breathe, twice
//!         _ => Step::value("finished"),  // explicit return value
//!     })
//! });
//!
//! spawn(
//!     &ev,
//!     move || Ok(Spawned::routine(routine)),
//!     Some(Box::new(|outcome| {
//!         let value = outcome.result().unwrap().unwrap();
//!         assert_eq!(*value.downcast::<&str>().unwrap(), "finished");
//!     })),
//! );
//! ev.run();
//! ```

pub mod coroutine;
pub mod error;
pub mod event_loop;
pub mod op;
pub mod outcome;
pub mod scheduler;
pub mod spawn;

pub use coroutine::{routine_fn, Idle, Resume, Routine, RoutineFn, RoutineImpl, Step};
pub use error::{BoxError, Failure};
pub use event_loop::{EventLoop, IdleCallback, LocalLoop, SourceId};
pub use op::{launch, Completion, PendingOp, Signal};
pub use outcome::{Outcome, Value};
pub use scheduler::{OutcomeFn, Runner};
pub use spawn::{spawn, Spawned};
