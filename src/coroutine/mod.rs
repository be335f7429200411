//! This module contains the routine contract the scheduler drives:
//! [`Routine`], the [`Resume`]/[`Step`] exchange, and the [`Idle`] marker.

pub mod idle;
pub mod routine;

pub use idle::Idle;
pub use routine::{routine_fn, Resume, Routine, RoutineFn, RoutineImpl, Step};
