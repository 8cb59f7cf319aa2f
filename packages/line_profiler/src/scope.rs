//! Project boundary detection and the scope predicate.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::pal::{Platform, PlatformFacade};

/// The version-control marker that identifies a repository root.
const REPO_MARKER: &str = ".git";

/// A source file as named at compile time, before resolution.
///
/// `file!()` yields a path relative to the directory the compiler ran in, which is either the
/// package root or the workspace root. Carrying the manifest directory along lets us find the
/// file on disk at runtime regardless of which it was.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct SourceFile {
    manifest_dir: Option<&'static str>,
    file: &'static str,
}

impl SourceFile {
    pub(crate) const fn new(manifest_dir: Option<&'static str>, file: &'static str) -> Self {
        Self { manifest_dir, file }
    }

    /// Finds the file on disk, returning its canonical path.
    ///
    /// Absolute paths are canonicalized as-is. Relative paths are tried against the manifest
    /// directory and its ancestors, then against the current directory and its ancestors.
    pub(crate) fn resolve(&self, platform: &impl Platform) -> Option<PathBuf> {
        let file = Path::new(self.file);

        if file.is_absolute() {
            return platform.canonicalize(file).ok();
        }

        let manifest_bases = self.manifest_dir.map(PathBuf::from);
        let current_dir = platform.current_dir().ok();

        manifest_bases
            .iter()
            .chain(current_dir.iter())
            .flat_map(|base| base.ancestors())
            .map(|base| base.join(file))
            .find(|candidate| platform.exists(candidate))
            .and_then(|candidate| platform.canonicalize(&candidate).ok())
    }
}

/// Returns the nearest ancestor of `start` (including `start` itself) that contains a `.git`
/// marker, or `None` if there is none up to the filesystem root.
pub(crate) fn find_repo_root(start: &Path, platform: &impl Platform) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|candidate| platform.exists(&candidate.join(REPO_MARKER)))
        .map(Path::to_path_buf)
}

/// Decides whether a source file lies under the project boundary.
///
/// The boundary is resolved to an absolute, symlink-free path once, when the filter is created.
/// A path is in scope when it is the boundary itself or nested under it, compared by whole path
/// components - `/work/proj2/x.rs` is not under `/work/proj`. Paths that cannot be resolved are
/// out of scope.
///
/// # Examples
///
/// ```
/// use line_profiler::ScopeFilter;
///
/// let dir = std::env::temp_dir();
/// let filter = ScopeFilter::new(&dir);
///
/// assert!(filter.is_in_scope(&dir));
/// assert!(!filter.is_in_scope("/definitely/not/a/real/path.rs"));
/// ```
#[derive(Debug)]
pub struct ScopeFilter {
    boundary: Option<PathBuf>,
    platform: PlatformFacade,
}

impl ScopeFilter {
    /// Creates a filter with the given boundary directory.
    ///
    /// A boundary that does not exist yet is made absolute against the current directory
    /// instead of being canonicalized.
    #[must_use]
    pub fn new(boundary: impl AsRef<Path>) -> Self {
        Self::with_boundary(boundary.as_ref(), PlatformFacade::real())
    }

    pub(crate) fn with_boundary(boundary: &Path, platform: PlatformFacade) -> Self {
        let boundary = platform
            .canonicalize(boundary)
            .ok()
            .or_else(|| absolutize(boundary, &platform));

        if boundary.is_none() {
            warn!("no project boundary could be determined; every file is in scope");
        }

        Self { boundary, platform }
    }

    /// Creates a filter whose boundary is detected from the caller's source file.
    ///
    /// The boundary is the nearest ancestor of the caller's file that holds a `.git` directory.
    /// Without one, the directory containing the caller's file is the boundary. If the caller's
    /// file cannot be found on disk, detection starts from the current directory.
    pub(crate) fn detect(caller: SourceFile, platform: PlatformFacade) -> Self {
        let start = caller
            .resolve(&platform)
            .and_then(|file| file.parent().map(Path::to_path_buf))
            .or_else(|| platform.current_dir().ok());

        let boundary = start.map(|start| find_repo_root(&start, &platform).unwrap_or(start));

        match boundary {
            Some(boundary) => Self::with_boundary(&boundary, platform),
            None => {
                warn!(
                    file = caller.file,
                    "caller location is unknown and there is no current directory; every file is in scope"
                );
                Self {
                    boundary: None,
                    platform,
                }
            }
        }
    }

    /// The resolved boundary directory, or `None` if the filter is unrestricted.
    #[must_use]
    pub fn boundary(&self) -> Option<&Path> {
        self.boundary.as_deref()
    }

    /// Whether `path` is equal to or nested under the boundary directory.
    ///
    /// Never fails: a path that cannot be resolved is simply not in scope.
    #[must_use]
    pub fn is_in_scope(&self, path: impl AsRef<Path>) -> bool {
        let Some(boundary) = &self.boundary else {
            return true;
        };

        self.platform
            .canonicalize(path.as_ref())
            .is_ok_and(|resolved| resolved.starts_with(boundary))
    }

    /// A short form of `path` for display: relative to the boundary when possible, otherwise
    /// the file name alone.
    #[must_use]
    pub fn display_path(&self, path: impl AsRef<Path>) -> String {
        let path = path.as_ref();

        let relative = self.boundary.as_ref().and_then(|boundary| {
            self.platform
                .canonicalize(path)
                .ok()
                .and_then(|resolved| resolved.strip_prefix(boundary).ok().map(Path::to_path_buf))
        });

        match relative {
            Some(relative) => relative.display().to_string(),
            None => path.file_name().map_or_else(
                || path.display().to_string(),
                |name| name.to_string_lossy().into_owned(),
            ),
        }
    }
}

fn absolutize(path: &Path, platform: &impl Platform) -> Option<PathBuf> {
    if path.is_absolute() {
        Some(path.to_path_buf())
    } else {
        platform.current_dir().ok().map(|dir| dir.join(path))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::io;

    use super::*;
    use crate::pal::{FakePlatform, MockPlatform};

    fn fake_with_project() -> FakePlatform {
        let platform = FakePlatform::new();
        platform.add_dir("/work/proj/.git");
        platform.add_file("/work/proj/src/lib.rs", "pub fn f() {}\n");
        platform.add_file("/work/proj2/src/lib.rs", "pub fn g() {}\n");
        platform.add_file("/work/vendor/dep/src/lib.rs", "pub fn h() {}\n");
        platform
    }

    #[test]
    fn nested_path_is_in_scope() {
        let platform = fake_with_project();
        let filter =
            ScopeFilter::with_boundary(Path::new("/work/proj"), PlatformFacade::fake(platform));

        assert!(filter.is_in_scope("/work/proj/src/lib.rs"));
        assert!(filter.is_in_scope("/work/proj"));
    }

    #[test]
    fn sibling_sharing_name_prefix_is_out_of_scope() {
        let platform = fake_with_project();
        let filter =
            ScopeFilter::with_boundary(Path::new("/work/proj"), PlatformFacade::fake(platform));

        assert!(!filter.is_in_scope("/work/proj2/src/lib.rs"));
        assert!(!filter.is_in_scope("/work/vendor/dep/src/lib.rs"));
    }

    #[test]
    fn unresolvable_path_is_out_of_scope() {
        let platform = fake_with_project();
        let filter =
            ScopeFilter::with_boundary(Path::new("/work/proj"), PlatformFacade::fake(platform));

        assert!(!filter.is_in_scope("/work/proj/src/missing.rs"));
    }

    #[test]
    fn canonicalize_failure_is_out_of_scope() {
        let mut mock = MockPlatform::new();
        mock.expect_canonicalize().returning(|path| {
            if path == Path::new("/work/proj") {
                Ok(path.to_path_buf())
            } else {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
            }
        });

        let filter =

            ScopeFilter::with_boundary(Path::new("/work/proj"), PlatformFacade::from_mock(mock));

        assert_eq!(filter.boundary(), Some(Path::new("/work/proj")));
        assert!(!filter.is_in_scope("/work/proj/src/lib.rs"));
    }

    #[test]
    fn missing_boundary_is_made_absolute() {
        let platform = FakePlatform::new();
        platform.set_current_dir(Some(Path::new("/home/me")));

        let filter =

            ScopeFilter::with_boundary(Path::new("not_yet"), PlatformFacade::fake(platform));

        assert_eq!(filter.boundary(), Some(Path::new("/home/me/not_yet")));
    }

    #[test]
    fn detects_repo_root_from_caller() {
        let platform = fake_with_project();
        platform.set_current_dir(Some(Path::new("/work/proj")));

        let filter = ScopeFilter::detect(
            SourceFile::new(None, "src/lib.rs"),
            PlatformFacade::fake(platform),
        );

        assert_eq!(filter.boundary(), Some(Path::new("/work/proj")));
    }

    #[test]
    fn detection_without_repo_falls_back_to_caller_directory() {
        let platform = FakePlatform::new();
        platform.add_file("/loose/scripts/run.rs", "fn main() {}\n");

        let filter = ScopeFilter::detect(
            SourceFile::new(Some("/loose/scripts"), "run.rs"),
            PlatformFacade::fake(platform),
        );

        assert_eq!(filter.boundary(), Some(Path::new("/loose/scripts")));
    }

    #[test]
    fn detection_without_caller_or_current_dir_is_unrestricted() {
        let platform = FakePlatform::new();
        platform.set_current_dir(None);
        platform.add_file("/anything/at/all.rs", "");

        let filter = ScopeFilter::detect(
            SourceFile::new(None, "nowhere.rs"),
            PlatformFacade::fake(platform),
        );

        assert_eq!(filter.boundary(), None);
        assert!(filter.is_in_scope("/anything/at/all.rs"));
    }

    #[test]
    fn relative_file_resolves_through_manifest_ancestors() {
        let platform = fake_with_project();

        // Workspace-relative path, as emitted for a package nested inside a workspace.
        let source = SourceFile::new(Some("/work/proj/packages/inner"), "src/lib.rs");

        assert_eq!(
            source.resolve(&platform),
            Some(PathBuf::from("/work/proj/src/lib.rs"))
        );
    }

    #[test]
    fn relative_file_resolves_through_current_dir() {
        let platform = fake_with_project();
        platform.set_current_dir(Some(Path::new("/work/proj2")));

        let source = SourceFile::new(None, "src/lib.rs");

        assert_eq!(
            source.resolve(&platform),
            Some(PathBuf::from("/work/proj2/src/lib.rs"))
        );
    }

    #[test]
    fn unknown_file_does_not_resolve() {
        let platform = fake_with_project();

        let source = SourceFile::new(Some("/work/proj"), "src/nope.rs");

        assert_eq!(source.resolve(&platform), None);
    }

    #[test]
    fn display_path_is_relative_inside_boundary() {
        let platform = fake_with_project();
        let filter =
            ScopeFilter::with_boundary(Path::new("/work/proj"), PlatformFacade::fake(platform));

        assert_eq!(filter.display_path("/work/proj/src/lib.rs"), "src/lib.rs");
        assert_eq!(filter.display_path("/work/proj2/src/lib.rs"), "lib.rs");
    }

    #[test]
    fn find_repo_root_includes_start() {
        let platform = fake_with_project();

        assert_eq!(
            find_repo_root(Path::new("/work/proj"), &platform),
            Some(PathBuf::from("/work/proj"))
        );
        assert_eq!(
            find_repo_root(Path::new("/work/proj/src"), &platform),
            Some(PathBuf::from("/work/proj"))
        );
        assert_eq!(find_repo_root(Path::new("/work/proj2/src"), &platform), None);
    }
}
