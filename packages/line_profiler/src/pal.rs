//! Platform abstraction layer for line profiling.
//!
//! This module provides a platform abstraction over the clock, the filesystem queries used for
//! scope resolution and source annotation, and the thread's event-consumer slot. Production code
//! always uses the real platform; tests substitute a fake or a mock.

mod abstractions;
mod facade;
#[cfg(test)]
mod fake;
mod real;

pub(crate) use abstractions::*;
pub(crate) use facade::*;
#[cfg(test)]
pub(crate) use fake::*;
pub(crate) use real::*;
