#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Line-level wall-clock profiling of instrumented functions.
//!
//! This package records, for every executed line of the functions you instrument, how many
//! times the line ran and how much wall-clock time passed while it was the active line. Only
//! functions whose source files live under a project directory are measured, so instrumented
//! dependencies do not clutter the results.
//!
//! The core functionality includes:
//! - [`Profiler`] - Owns the collected statistics and activates profiling on the current thread
//! - [`probe!`] and [`probe_line!`] - Instrument a function and its lines
//! - [`StatsReport`] and [`TopLinesReport`] - Render the statistics as text tables
//! - [`port`] - The per-thread event slot that connects probes to a consumer
//!
//! This package is not meant for use in production, serving only as a development tool.
//!
//! # Simple usage
//!
//! ```
//! use line_profiler::{ReportOptions, probe, probe_line};
//!
//! fn slow_sum(values: &[u64]) -> u64 {
//!     let p = probe!();
//!     probe_line!(p);
//!     let mut sum = 0;
//!     probe_line!(p);
//!     for value in values {
//!         sum += value;
//!     }
//!     probe_line!(p);
//!     sum
//! }
//!
//! let mut profiler = line_profiler::profiler!();
//!
//! {
//!     let _active = profiler.enable().unwrap();
//!     slow_sum(&[1, 2, 3]);
//! }
//!
//! profiler.print_stats(ReportOptions::new());
//! ```
//!
//! # Attribution
//!
//! A line event closes the interval of the previous line: the time between two consecutive
//! events belongs to the line that was active before the later one, and a function's return
//! closes the interval of its last line. Time between entering a function and its first
//! `probe_line!` belongs to no line.
//!
//! # Threading
//!
//! Probes deliver events to a consumer slot that belongs to the current thread, so a profiler
//! only sees functions that run on the thread that enabled it. Only one profiler can be active
//! per thread at a time.

mod engine;
mod error;
mod event;
mod pal;
pub mod port;
mod probe;
mod profiler;
mod profiler_builder;
mod report;
mod scope;
mod stats;

pub use error::Error;
pub use event::{CallSite, TraceControl, TraceEvent};
pub use port::{EventConsumer, SharedConsumer};
#[doc(hidden)]
pub use probe::__type_name_of;
pub use probe::FunctionProbe;
pub use profiler::{ActiveProfile, Profiler};
pub use profiler_builder::ProfilerBuilder;
pub use report::{
    LineSortKey, ReportOptions, StatsReport, TopLinesOptions, TopLinesReport, TopSortKey,
};
pub use scope::ScopeFilter;
pub use stats::{FunctionKey, FunctionStats, LineStats, StatsStore};
