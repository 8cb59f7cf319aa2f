// Facade that dispatches to either the real platform or a test double.
//
// The facade pattern allows the same code to work with real, fake and mock implementations,
// with the test variants only available in test builds.

use std::io;
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::rc::Rc;
use std::time::Duration;

#[cfg(test)]
use crate::pal::{FakePlatform, MockPlatform};
use crate::pal::{Platform, REAL_PLATFORM, RealPlatform};
use crate::SharedConsumer;

/// Facade over platform operations, dispatching to the real implementation or a test double.
#[derive(Clone)]
pub(crate) enum PlatformFacade {
    Real(&'static RealPlatform),

    #[cfg(test)]
    Fake(FakePlatform),

    #[cfg(test)]
    Mock(Rc<MockPlatform>),
}

// Facade types are trivial pass-through layers - not worth testing.
#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg_attr(test, mutants::skip)]
impl PlatformFacade {
    pub(crate) const fn real() -> Self {
        Self::Real(&REAL_PLATFORM)
    }

    #[cfg(test)]
    pub(crate) fn fake(platform: FakePlatform) -> Self {
        Self::Fake(platform)
    }

    #[cfg(test)]
    pub(crate) fn from_mock(mock: MockPlatform) -> Self {
        Self::Mock(Rc::new(mock))
    }
}

// Debug implementations have no API contract to test.
#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg_attr(test, mutants::skip)]
impl std::fmt::Debug for PlatformFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Real(p) => p.fmt(f),
            #[cfg(test)]
            Self::Fake(p) => p.fmt(f),
            #[cfg(test)]
            Self::Mock(_) => f.debug_struct("PlatformFacade::Mock").finish(),
        }
    }
}

// Facade types are trivial pass-through layers - not worth testing.
#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg_attr(test, mutants::skip)]
impl Platform for PlatformFacade {
    fn now(&self) -> Duration {
        match self {
            Self::Real(p) => p.now(),
            #[cfg(test)]
            Self::Fake(p) => p.now(),
            #[cfg(test)]
            Self::Mock(p) => p.now(),
        }
    }

    fn current_dir(&self) -> io::Result<PathBuf> {
        match self {
            Self::Real(p) => p.current_dir(),
            #[cfg(test)]
            Self::Fake(p) => p.current_dir(),
            #[cfg(test)]
            Self::Mock(p) => p.current_dir(),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        match self {
            Self::Real(p) => p.exists(path),
            #[cfg(test)]
            Self::Fake(p) => p.exists(path),
            #[cfg(test)]
            Self::Mock(p) => p.exists(path),
        }
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        match self {
            Self::Real(p) => p.canonicalize(path),
            #[cfg(test)]
            Self::Fake(p) => p.canonicalize(path),
            #[cfg(test)]
            Self::Mock(p) => p.canonicalize(path),
        }
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        match self {
            Self::Real(p) => p.read_to_string(path),
            #[cfg(test)]
            Self::Fake(p) => p.read_to_string(path),
            #[cfg(test)]
            Self::Mock(p) => p.read_to_string(path),
        }
    }

    fn current_consumer(&self) -> Option<SharedConsumer> {
        match self {
            Self::Real(p) => p.current_consumer(),
            #[cfg(test)]
            Self::Fake(p) => p.current_consumer(),
            #[cfg(test)]
            Self::Mock(p) => p.current_consumer(),
        }
    }

    fn install_consumer(&self, consumer: SharedConsumer) -> Option<SharedConsumer> {
        match self {
            Self::Real(p) => p.install_consumer(consumer),
            #[cfg(test)]
            Self::Fake(p) => p.install_consumer(consumer),
            #[cfg(test)]
            Self::Mock(p) => p.install_consumer(consumer),
        }
    }

    fn restore_consumer(&self, previous: Option<SharedConsumer>) {
        match self {
            Self::Real(p) => p.restore_consumer(previous),
            #[cfg(test)]
            Self::Fake(p) => p.restore_consumer(previous),
            #[cfg(test)]
            Self::Mock(p) => p.restore_consumer(previous),
        }
    }
}

// Facade types are trivial pass-through layers - not worth testing.
#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg_attr(test, mutants::skip)]
impl Default for PlatformFacade {
    fn default() -> Self {
        Self::real()
    }
}
