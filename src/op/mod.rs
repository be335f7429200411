//! This module contains the two-phase operation machinery: the
//! [`PendingOp`] token a routine suspends on and the [`launch`] helper
//! that starts an operation and produces one.

pub mod launch;
pub mod token;

pub use launch::{launch, Completion};
pub use token::{PendingOp, Signal};
