//! This module contains the [`Runner`], the scheduler that drives one
//! suspended routine to completion.

pub mod runner;

pub use runner::{OutcomeFn, Runner};
