//! Platform abstraction trait definitions.

use std::fmt::Debug;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::SharedConsumer;

/// Provides the clock, filesystem and event-slot operations the profiler depends on.
///
/// This trait is automatically mocked by mockall in test builds, generating `MockPlatform`.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait Platform: Debug + 'static {
    /// Monotonic timestamp, measured from an arbitrary fixed origin.
    fn now(&self) -> Duration;

    /// Returns the current working directory.
    fn current_dir(&self) -> io::Result<PathBuf>;

    /// Returns `true` if the given path exists (file or directory).
    fn exists(&self, path: &Path) -> bool;

    /// Returns the canonical, absolute form of a path, resolving symbolic links.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    /// Reads a whole file as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Returns the event consumer currently installed for this thread, if any.
    fn current_consumer(&self) -> Option<SharedConsumer>;

    /// Installs `consumer` as the sole event consumer for this thread, returning the one it
    /// replaced.
    fn install_consumer(&self, consumer: SharedConsumer) -> Option<SharedConsumer>;

    /// Puts back a consumer previously returned by `install_consumer()`.
    fn restore_consumer(&self, previous: Option<SharedConsumer>);
}
