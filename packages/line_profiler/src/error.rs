use thiserror::Error;

/// Errors that can occur when activating a profiler or configuring its reports.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A line profiler is already active on this thread.
    ///
    /// Only one line profiler may own the thread's event slot at a time. Activating a second one
    /// would lose the consumer that the first one has to restore when it exits.
    #[error("a line profiler is already active on this thread")]
    AlreadyActive,

    /// The caller named a report sort order that does not exist.
    #[error("unknown sort key '{value}', expected one of: {expected}")]
    UnknownSortKey {
        /// The value that was provided.
        value: String,

        /// Human-readable list of the accepted values.
        expected: &'static str,
    },
}

/// A specialized `Result` type for line profiler operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
