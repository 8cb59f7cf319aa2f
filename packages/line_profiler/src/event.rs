//! Execution events and the answers consumers give to them.

use crate::scope::SourceFile;

/// Describes the function that is being entered.
///
/// Instrumented code does not usually build this by hand - the [`probe!`](crate::probe) macro
/// fills it in from `file!()`, `line!()` and the enclosing function's name. Custom event sources
/// can construct it directly.
///
/// # Examples
///
/// ```
/// use line_profiler::CallSite;
///
/// let site = CallSite::new(None, "/srv/app/src/lib.rs", "app::parse", 42);
/// assert_eq!(site.function(), "app::parse");
/// assert_eq!(site.line(), 42);
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct CallSite {
    manifest_dir: Option<&'static str>,
    file: &'static str,
    function: &'static str,
    line: u32,
}

impl CallSite {
    /// Creates a call site description.
    ///
    /// `file` may be absolute or relative. Relative paths are resolved against `manifest_dir`
    /// and its ancestors first, then against the current directory and its ancestors.
    #[must_use]
    pub const fn new(
        manifest_dir: Option<&'static str>,
        file: &'static str,
        function: &'static str,
        line: u32,
    ) -> Self {
        Self {
            manifest_dir,
            file,
            function,
            line,
        }
    }

    /// The source file as recorded at the call site, before any resolution.
    #[must_use]
    pub fn file(&self) -> &'static str {
        self.file
    }

    /// The name of the function being entered.
    #[must_use]
    pub fn function(&self) -> &'static str {
        self.function
    }

    /// The line the function is defined at.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }

    pub(crate) fn source_file(&self) -> SourceFile {
        SourceFile::new(self.manifest_dir, self.file)
    }
}

/// A notification delivered to the installed consumer as instrumented code runs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum TraceEvent<'a> {
    /// A function is being entered.
    Call(&'a CallSite),

    /// The given line is about to execute in the most recently entered function.
    Line(u32),

    /// The most recently entered function is returning.
    Return,

    /// The most recently entered function is being unwound by a panic. A `Return` follows.
    Exception,
}

/// How the event source should proceed after a consumer has seen an event.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum TraceControl {
    /// Keep delivering events for the current function.
    Continue,

    /// Deliver no further events for this activation of the function that was just entered.
    SkipFunction,
}
