//! This module contains [`Idle`], the suspension sentinel for yielding
//! control back to the host loop with no operation attached.

/// If a routine suspends on this, the scheduler parks it and resumes it at
/// the host loop's next idle opportunity, letting other scheduled work run.
///
/// Carries no data; the scheduler recognizes it by type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Idle;
