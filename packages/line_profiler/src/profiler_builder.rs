//! Builder for profilers with custom settings.

use std::panic::Location;
use std::path::PathBuf;

use crate::pal::PlatformFacade;
use crate::scope::SourceFile;
use crate::{Profiler, ScopeFilter};

/// Builds a [`Profiler`] with custom settings.
///
/// Obtained from [`Profiler::builder()`].
///
/// # Examples
///
/// ```
/// use line_profiler::Profiler;
///
/// // Without an explicit root, the root is detected from the caller's source file.
/// let detected = Profiler::builder().build();
///
/// let explicit = Profiler::builder()
///     .project_root(env!("CARGO_MANIFEST_DIR"))
///     .build();
///
/// # _ = detected;
/// assert!(explicit.project_root().is_some());
/// ```
#[derive(Debug)]
pub struct ProfilerBuilder {
    project_root: Option<PathBuf>,
    platform: PlatformFacade,
}

impl ProfilerBuilder {
    pub(crate) fn new() -> Self {
        Self {
            project_root: None,
            platform: PlatformFacade::real(),
        }
    }

    /// Only functions in source files under `root` are profiled.
    ///
    /// A root that does not exist is resolved against the current directory.
    #[must_use]
    pub fn project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    #[cfg(test)]
    #[must_use]
    pub(crate) fn platform(mut self, platform: PlatformFacade) -> Self {
        self.platform = platform;
        self
    }

    /// Creates the profiler.
    ///
    /// If no project root was set, it is detected from the caller's source file as in
    /// [`Profiler::new()`].
    #[must_use]
    #[track_caller]
    pub fn build(self) -> Profiler {
        match self.project_root {
            Some(root) => {
                let scope = ScopeFilter::with_boundary(&root, self.platform.clone());
                Profiler::with_scope(scope, self.platform)
            }
            None => {
                let caller = Location::caller();
                Profiler::detect(SourceFile::new(None, caller.file()), self.platform)
            }
        }
    }
}
