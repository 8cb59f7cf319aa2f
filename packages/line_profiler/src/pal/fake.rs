//! Fake platform implementation for testing.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use crate::pal::Platform;
use crate::{SharedConsumer, port};

/// Internal state for the fake platform that can be shared between clones.
#[derive(Debug)]
struct FakePlatformState {
    now: Duration,
    current_dir: Option<PathBuf>,
    files: HashMap<PathBuf, Vec<u8>>,
    dirs: HashSet<PathBuf>,
}

/// Fake implementation of the platform abstraction for testing.
///
/// Time only moves when a test moves it and the filesystem is an in-memory set of absolute
/// paths, all of which are considered canonical. Multiple clones of the same `FakePlatform`
/// share the same state, allowing tests to advance the clock while a profiler holds a clone.
///
/// The event slot is not faked: consumers are installed into the real thread slot so that
/// probes in test code reach them.
#[derive(Clone, Debug)]
pub(crate) struct FakePlatform {
    state: Rc<RefCell<FakePlatformState>>,
}

impl FakePlatform {
    /// Creates a new fake platform at time zero with an empty filesystem rooted at `/`.
    pub(crate) fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(FakePlatformState {
                now: Duration::ZERO,
                current_dir: Some(PathBuf::from("/")),
                files: HashMap::new(),
                dirs: HashSet::from([PathBuf::from("/")]),
            })),
        }
    }

    /// Moves the clock forward by `by`.
    pub(crate) fn advance(&self, by: Duration) {
        let mut state = self.state.borrow_mut();
        state.now = state.now.saturating_add(by);
    }

    /// Sets the current directory, or makes it unavailable when `None`.
    pub(crate) fn set_current_dir(&self, dir: Option<&Path>) {
        self.state.borrow_mut().current_dir = dir.map(Path::to_path_buf);
    }

    /// Adds a directory and all of its ancestors.
    pub(crate) fn add_dir(&self, dir: impl AsRef<Path>) {
        let mut state = self.state.borrow_mut();
        for ancestor in dir.as_ref().ancestors() {
            state.dirs.insert(ancestor.to_path_buf());
        }
    }

    /// Adds a text file, creating its parent directories.
    pub(crate) fn add_file(&self, path: impl AsRef<Path>, contents: &str) {
        self.add_raw_file(path, contents.as_bytes());
    }

    /// Adds a file whose contents may not be valid UTF-8.
    pub(crate) fn add_raw_file(&self, path: impl AsRef<Path>, contents: &[u8]) {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }

        self.state
            .borrow_mut()
            .files
            .insert(path.to_path_buf(), contents.to_vec());
    }
}

impl Platform for FakePlatform {
    fn now(&self) -> Duration {
        self.state.borrow().now
    }

    fn current_dir(&self) -> io::Result<PathBuf> {
        self.state
            .borrow()
            .current_dir
            .clone()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no current directory"))
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.state.borrow();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        if path.is_absolute() && self.exists(path) {
            Ok(path.to_path_buf())
        } else {
            Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            ))
        }
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let state = self.state.borrow();
        let bytes = state
            .files
            .get(path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))?;

        String::from_utf8(bytes.clone())
            .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))
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

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn starts_at_time_zero() {
        let platform = FakePlatform::new();
        assert_eq!(platform.now(), Duration::ZERO);
    }

    #[test]
    fn shared_clock_between_clones() {
        let platform1 = FakePlatform::new();
        let platform2 = platform1.clone();

        platform1.advance(Duration::from_millis(100));
        assert_eq!(platform2.now(), Duration::from_millis(100));
    }

    #[test]
    fn added_file_creates_parent_dirs() {
        let platform = FakePlatform::new();
        platform.add_file("/work/proj/src/lib.rs", "fn main() {}\n");

        assert!(platform.exists(Path::new("/work/proj/src/lib.rs")));
        assert!(platform.exists(Path::new("/work/proj/src")));
        assert!(platform.exists(Path::new("/work")));
        assert!(!platform.exists(Path::new("/work/other")));
    }

    #[test]
    fn canonicalize_rejects_missing_and_relative_paths() {
        let platform = FakePlatform::new();
        platform.add_dir("/work/proj");

        assert_eq!(
            platform.canonicalize(Path::new("/work/proj")).unwrap(),
            PathBuf::from("/work/proj")
        );
        platform.canonicalize(Path::new("/work/missing")).unwrap_err();
        platform.canonicalize(Path::new("work/proj")).unwrap_err();
    }

    #[test]
    fn invalid_utf8_fails_to_read() {
        let platform = FakePlatform::new();
        platform.add_raw_file("/bad.rs", &[0xff, 0xfe, 0x00]);

        let error = platform.read_to_string(Path::new("/bad.rs")).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn missing_current_dir_is_error() {
        let platform = FakePlatform::new();
        platform.set_current_dir(None);

        platform.current_dir().unwrap_err();
    }
}
