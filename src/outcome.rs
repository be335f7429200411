//! This module contains [`Outcome`], the container a finished coroutine
//! hands to its outcome callback.

use std::any::Any;

use crate::error::Failure;

/// A dynamically typed value produced by a finish step or returned by a
/// routine. Callers downcast it back to the concrete type they expect.
pub type Value = Box<dyn Any>;

/// The final result of one coroutine invocation: a success value (possibly
/// absent) or a captured failure, never both.
///
/// The failure is not surfaced until [`Outcome::result`] is called, so the
/// outcome callback decides where it propagates.
pub struct Outcome {
    inner: Result<Option<Value>, Failure>,
}

impl std::fmt::Debug for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            Ok(Some(_)) => f.write_str("Outcome(value)"),
            Ok(None) => f.write_str("Outcome(empty)"),
            Err(failure) => write!(f, "Outcome(failure: {failure})"),
        }
    }
}

impl Outcome {
    pub(crate) fn success(value: Option<Value>) -> Self {
        Self { inner: Ok(value) }
    }

    pub(crate) fn failure(failure: Failure) -> Self {
        Self { inner: Err(failure) }
    }

    /// Returns the routine's value, or surfaces the captured failure at
    /// this point.
    pub fn result(self) -> Result<Option<Value>, Failure> {
        self.inner
    }

    pub fn is_success(&self) -> bool {
        self.inner.is_ok()
    }
}
