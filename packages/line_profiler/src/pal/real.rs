// Real platform implementation that delegates to std and to the thread's event slot.
//
// This is a trivial forwarder to system APIs and is excluded from coverage and mutation testing.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use crate::pal::Platform;
use crate::{SharedConsumer, port};

static CLOCK_ORIGIN: LazyLock<Instant> = LazyLock::new(Instant::now);

/// Real platform implementation that uses the operating system.
#[derive(Debug, Default)]
pub(crate) struct RealPlatform;

/// Static instance of the real platform for production use.
pub(crate) static REAL_PLATFORM: RealPlatform = RealPlatform;

// Trivial forwarder to system APIs - not worth testing.
#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg_attr(test, mutants::skip)]
impl Platform for RealPlatform {
    fn now(&self) -> Duration {
        CLOCK_ORIGIN.elapsed()
    }

    fn current_dir(&self) -> io::Result<PathBuf> {
        std::env::current_dir()
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        path.canonicalize()
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn current_consumer(&self) -> Option<SharedConsumer> {
        port::current_consumer()
    }

    fn install_consumer(&self, consumer: SharedConsumer) -> Option<SharedConsumer> {
        port::install(consumer)
    }

    fn restore_consumer(&self, previous: Option<SharedConsumer>) {
        port::restore(previous);
    }
}
