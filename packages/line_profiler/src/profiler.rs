//! The profiling session and its activation guard.

use std::cell::{Cell, Ref, RefCell};
use std::panic::Location;
use std::path::Path;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::engine::{EngineConsumer, TraceEngine};
use crate::error::Result;
use crate::pal::{Platform, PlatformFacade};
use crate::scope::SourceFile;
use crate::{
    Error, ProfilerBuilder, ReportOptions, ScopeFilter, SharedConsumer, StatsReport, StatsStore,
    TopLinesOptions, TopLinesReport,
};

thread_local! {
    // Set while an `ActiveProfile` exists on this thread.
    static PROFILER_ACTIVE: Cell<bool> = const { Cell::new(false) };
}

/// Collects line-level timing statistics for instrumented functions under a project directory.
///
/// A profiler is inert until [`enable()`](Self::enable) is called. While the returned
/// [`ActiveProfile`] guard lives, every [`probe!`](crate::probe)-instrumented function whose
/// source file lies under the project root contributes statistics. Statistics persist across
/// activations until [`clear()`](Self::clear) is called.
///
/// # Examples
///
/// ```
/// use line_profiler::{Profiler, ReportOptions, probe, probe_line};
///
/// fn busy() -> u64 {
///     let p = probe!();
///     probe_line!(p);
///     let mut total = 0;
///     probe_line!(p);
///     for i in 0..1000 {
///         total += i;
///     }
///     probe_line!(p);
///     total
/// }
///
/// let mut profiler = Profiler::with_project_root(env!("CARGO_MANIFEST_DIR"));
///
/// {
///     let _active = profiler.enable().unwrap();
///     busy();
/// }
///
/// println!("{}", profiler.stats_report(ReportOptions::new()));
/// ```
#[derive(Debug)]
pub struct Profiler {
    engine: Rc<RefCell<TraceEngine>>,
    scope: Rc<ScopeFilter>,
    platform: PlatformFacade,
}

impl Profiler {
    /// Creates a profiler whose project root is detected from the caller's source file.
    ///
    /// The root is the nearest ancestor of the caller's file that contains a `.git` directory,
    /// or the directory of the caller's file if there is none. Prefer the
    /// [`profiler!`](crate::profiler) macro, which can also locate files in nested workspace
    /// packages.
    #[expect(
        clippy::new_without_default,
        reason = "the project root depends on the caller's location, which Default cannot see"
    )]
    #[must_use]
    #[track_caller]
    pub fn new() -> Self {
        let caller = Location::caller();
        Self::detect(SourceFile::new(None, caller.file()), PlatformFacade::real())
    }

    /// Creates a profiler with an explicit project root.
    #[must_use]
    pub fn with_project_root(root: impl AsRef<Path>) -> Self {
        let platform = PlatformFacade::real();
        Self::with_scope(ScopeFilter::with_boundary(root.as_ref(), platform.clone()), platform)
    }

    /// Starts building a profiler with custom settings.
    ///
    /// # Examples
    ///
    /// ```
    /// use line_profiler::Profiler;
    ///
    /// let profiler = Profiler::builder()
    ///     .project_root(env!("CARGO_MANIFEST_DIR"))
    ///     .build();
    ///
    /// assert!(profiler.is_empty());
    /// ```
    #[must_use]
    pub fn builder() -> ProfilerBuilder {
        ProfilerBuilder::new()
    }

    #[doc(hidden)]
    #[must_use]
    pub fn __for_call_site(manifest_dir: Option<&'static str>, file: &'static str) -> Self {
        Self::detect(SourceFile::new(manifest_dir, file), PlatformFacade::real())
    }

    pub(crate) fn detect(caller: SourceFile, platform: PlatformFacade) -> Self {
        let scope = ScopeFilter::detect(caller, platform.clone());
        Self::with_scope(scope, platform)
    }

    pub(crate) fn with_scope(scope: ScopeFilter, platform: PlatformFacade) -> Self {
        let scope = Rc::new(scope);
        let engine = TraceEngine::new(Rc::clone(&scope), platform.clone());

        Self {
            engine: Rc::new(RefCell::new(engine)),
            scope,
            platform,
        }
    }

    /// Starts profiling on the current thread until the returned guard is dropped.
    ///
    /// The previously installed event consumer is saved and put back when the guard is dropped,
    /// including when the thread is unwinding from a panic.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyActive`] if any line profiler is already active on this thread.
    pub fn enable(&mut self) -> Result<ActiveProfile<'_>> {
        if PROFILER_ACTIVE.replace(true) {
            return Err(Error::AlreadyActive);
        }

        self.engine.borrow_mut().enable();

        let consumer: SharedConsumer = Rc::new(EngineConsumer::new(Rc::clone(&self.engine)));
        let previous = self.platform.install_consumer(Rc::clone(&consumer));

        debug!(
            project_root = ?self.scope.boundary(),
            had_previous_consumer = previous.is_some(),
            "line profiler enabled"
        );

        Ok(ActiveProfile {
            profiler: self,
            consumer,
            previous,
        })
    }

    /// Runs `f` with profiling enabled and returns its result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyActive`] without running `f` if any line profiler is already
    /// active on this thread.
    ///
    /// # Examples
    ///
    /// ```
    /// use line_profiler::Profiler;
    ///
    /// let mut profiler = Profiler::with_project_root(env!("CARGO_MANIFEST_DIR"));
    /// let answer = profiler.profile(|| 6 * 7).unwrap();
    ///
    /// assert_eq!(answer, 42);
    /// ```
    pub fn profile<R>(&mut self, f: impl FnOnce() -> R) -> Result<R> {
        let _active = self.enable()?;
        Ok(f())
    }

    /// The statistics collected so far.
    ///
    /// This is a live view, not a copy.
    #[must_use]
    pub fn stats(&self) -> Ref<'_, StatsStore> {
        Ref::map(self.engine.borrow(), TraceEngine::stats)
    }

    /// Discards all collected statistics.
    pub fn clear(&mut self) {
        self.engine.borrow_mut().clear();
    }

    /// Discards all collected statistics. Same as [`clear()`](Self::clear).
    pub fn reset(&mut self) {
        self.clear();
    }

    /// Whether no instrumented function has been entered since creation or the last clear.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stats().is_empty()
    }

    /// The directory that bounds which source files are profiled, or `None` if every file is.
    #[must_use]
    pub fn project_root(&self) -> Option<&Path> {
        self.scope.boundary()
    }

    /// The per-function report.
    #[must_use]
    pub fn stats_report(&self, options: ReportOptions) -> StatsReport<'_> {
        StatsReport::new(self.stats(), &self.scope, options)
    }

    /// The cross-function report of the slowest lines.
    #[must_use]
    pub fn top_lines_report(&self, options: TopLinesOptions) -> TopLinesReport<'_> {
        TopLinesReport::new(self.stats(), &self.scope, options)
    }

    /// Prints the per-function report to stdout.
    #[cfg_attr(test, mutants::skip)] // Too difficult to test stdout output reliably - manually tested.
    pub fn print_stats(&self, options: ReportOptions) {
        print!("{}", self.stats_report(options));
    }

    /// Prints the cross-function report of the slowest lines to stdout.
    #[cfg_attr(test, mutants::skip)] // Too difficult to test stdout output reliably - manually tested.
    pub fn print_global_top_stats(&self, options: TopLinesOptions) {
        print!("{}", self.top_lines_report(options));
    }
}

/// Keeps a [`Profiler`] active on the current thread.
///
/// Dropping the guard stops profiling and puts back the event consumer that was installed
/// before the profiler was enabled.
#[derive(Debug)]
#[must_use = "profiling stops when the guard is dropped"]
pub struct ActiveProfile<'a> {
    profiler: &'a mut Profiler,
    consumer: SharedConsumer,
    previous: Option<SharedConsumer>,
}

impl ActiveProfile<'_> {
    /// Stops profiling. Equivalent to dropping the guard.
    pub fn finish(self) {
        drop(self);
    }
}

impl Drop for ActiveProfile<'_> {
    fn drop(&mut self) {
        let profiler = &*self.profiler;

        let still_installed = profiler
            .platform
            .current_consumer()
            .is_some_and(|current| Rc::ptr_eq(&current, &self.consumer));

        if !still_installed {
            warn!("the event consumer was replaced while the line profiler was active");
        }

        profiler.platform.restore_consumer(self.previous.take());

        // The engine is only borrowed while handling an event, which cannot overlap with this.
        if let Ok(mut engine) = profiler.engine.try_borrow_mut() {
            engine.disable();

            debug!(
                panicking = std::thread::panicking(),
                functions = engine.stats().len(),
                "line profiler disabled"
            );
        }

        PROFILER_ACTIVE.set(false);
    }
}

/// Creates a [`Profiler`] whose project root is detected from the calling source file.
///
/// Unlike [`Profiler::new()`], this also knows the calling crate's manifest directory, so the
/// caller's file is found regardless of the directory the compiler was run from.
///
/// # Examples
///
/// ```
/// let profiler = line_profiler::profiler!();
/// assert!(profiler.project_root().is_some());
/// ```
#[macro_export]
macro_rules! profiler {
    () => {
        $crate::Profiler::__for_call_site(
            ::core::option_env!("CARGO_MANIFEST_DIR"),
            ::core::file!(),
        )
    };
}
