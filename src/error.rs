//! This module contains [`Failure`], the one failure currency of the crate.
//!
//! Every failure that travels through a suspension point is a `Failure`:
//! errors reported by finish steps, protocol violations detected by the
//! scheduler, and errors raised by routine code itself. The original error
//! value rides along boxed, so routine-local handling written against a
//! concrete error type can still observe it with [`Failure::downcast_ref`].

use std::error::Error as StdError;
use thiserror::Error;

/// A boxed error with its concrete type still reachable via downcast.
pub type BoxError = Box<dyn StdError + 'static>;

/// A failure captured at, or injected into, a suspension point.
#[derive(Debug, Error)]
pub enum Failure {
    /// The finish step of a pending operation reported an error.
    #[error("operation failed: {0}")]
    Operation(BoxError),

    /// The routine suspended on something that is neither a pending
    /// operation token nor [`Idle`](crate::coroutine::Idle).
    #[error("a routine may only suspend on a pending operation or Idle")]
    ProtocolViolation,

    /// An error raised by routine code itself.
    #[error("{0}")]
    Raised(BoxError),
}

impl Failure {
    /// Wraps an error raised by routine code.
    pub fn raised<E: StdError + 'static>(err: E) -> Self {
        Failure::Raised(Box::new(err))
    }

    /// Wraps an error reported by a finish step.
    pub fn operation<E: StdError + 'static>(err: E) -> Self {
        Failure::Operation(Box::new(err))
    }

    /// Returns the carried error as `E`, if that is its concrete type.
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            Failure::Operation(err) | Failure::Raised(err) => err.downcast_ref::<E>(),
            Failure::ProtocolViolation => None,
        }
    }

    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Failure::ProtocolViolation)
    }
}
