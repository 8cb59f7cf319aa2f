//! Human-readable rendering of collected line statistics.

use std::borrow::Cow;
use std::cell::Ref;
use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::{Error, FunctionKey, FunctionStats, LineStats, ScopeFilter, StatsStore};

const FUNCTION_REPORT_WIDTH: usize = 100;
const TOP_LINES_REPORT_WIDTH: usize = 130;

const FUNCTION_EXCERPT_CHARS: usize = 50;
const TOP_LINES_EXCERPT_CHARS: usize = 40;
const LOCATION_CHARS: usize = 50;

const ELLIPSIS: &str = "...";

/// The order of lines within each function of a [`StatsReport`].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum LineSortKey {
    /// Descending by total time.
    #[default]
    Time,

    /// Descending by hit count.
    Hits,

    /// Ascending by line number.
    Line,
}

impl FromStr for LineSortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time" => Ok(Self::Time),
            "hits" => Ok(Self::Hits),
            "line" => Ok(Self::Line),
            _ => Err(Error::UnknownSortKey {
                value: s.to_owned(),
                expected: "time, hits, line",
            }),
        }
    }
}

impl fmt::Display for LineSortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Time => "time",
            Self::Hits => "hits",
            Self::Line => "line",
        })
    }
}

/// The order of lines in a [`TopLinesReport`].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum TopSortKey {
    /// Descending by total time.
    #[default]
    Time,

    /// Descending by hit count.
    Hits,
}

impl FromStr for TopSortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time" => Ok(Self::Time),
            "hits" => Ok(Self::Hits),
            _ => Err(Error::UnknownSortKey {
                value: s.to_owned(),
                expected: "time, hits",
            }),
        }
    }
}

impl fmt::Display for TopSortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Time => "time",
            Self::Hits => "hits",
        })
    }
}

/// Options for the per-function report.
///
/// # Examples
///
/// ```
/// use line_profiler::{LineSortKey, ReportOptions};
///
/// let options = ReportOptions::new()
///     .min_time_micros(10.0)
///     .max_lines(5)
///     .sort_by(LineSortKey::Line);
/// # _ = options;
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReportOptions {
    min_time_micros: f64,
    max_lines: Option<usize>,
    sort_by: LineSortKey,
}

impl ReportOptions {
    /// Options that show every line of every function, slowest first.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Omits lines whose total time is below this many microseconds.
    #[must_use]
    pub fn min_time_micros(mut self, value: f64) -> Self {
        self.min_time_micros = value;
        self
    }

    /// Shows at most this many lines per function, after sorting.
    #[must_use]
    pub fn max_lines(mut self, value: usize) -> Self {
        self.max_lines = Some(value);
        self
    }

    /// Sets the order of lines within each function.
    #[must_use]
    pub fn sort_by(mut self, value: LineSortKey) -> Self {
        self.sort_by = value;
        self
    }
}

/// Options for the cross-function report.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TopLinesOptions {
    top_n: usize,
    min_time_micros: f64,
    sort_by: TopSortKey,
}

impl TopLinesOptions {
    /// Options that show the ten slowest lines.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows at most this many lines.
    #[must_use]
    pub fn top_n(mut self, value: usize) -> Self {
        self.top_n = value;
        self
    }

    /// Omits lines whose total time is below this many microseconds.
    #[must_use]
    pub fn min_time_micros(mut self, value: f64) -> Self {
        self.min_time_micros = value;
        self
    }

    /// Sets the order of lines.
    #[must_use]
    pub fn sort_by(mut self, value: TopSortKey) -> Self {
        self.sort_by = value;
        self
    }
}

impl Default for TopLinesOptions {
    fn default() -> Self {
        Self {
            top_n: 10,
            min_time_micros: 0.0,
            sort_by: TopSortKey::Time,
        }
    }
}

/// Per-function table of line statistics.
///
/// Obtained from [`Profiler::stats_report()`](crate::Profiler::stats_report) and rendered via
/// `Display`. Functions appear in file, name and line order; functions outside the project
/// boundary or without any line data are left out.
#[derive(Debug)]
pub struct StatsReport<'a> {
    stats: Ref<'a, StatsStore>,
    scope: &'a ScopeFilter,
    options: ReportOptions,
}

impl<'a> StatsReport<'a> {
    pub(crate) fn new(
        stats: Ref<'a, StatsStore>,
        scope: &'a ScopeFilter,
        options: ReportOptions,
    ) -> Self {
        Self {
            stats,
            scope,
            options,
        }
    }

    fn selected_lines<'f>(&self, function: &'f FunctionStats) -> Vec<&'f LineStats> {
        let mut lines: Vec<_> = function
            .lines_by_number()
            .into_iter()
            .filter(|line| micros(line.total_time()) >= self.options.min_time_micros)
            .collect();

        match self.options.sort_by {
            LineSortKey::Time => lines.sort_by_key(|line| Reverse(line.total_time())),
            LineSortKey::Hits => lines.sort_by_key(|line| Reverse(line.hits())),
            LineSortKey::Line => {}
        }

        if let Some(max_lines) = self.options.max_lines {
            lines.truncate(max_lines);
        }

        lines
    }
}

impl fmt::Display for StatsReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.stats.is_empty() {
            return writeln!(f, "No profiling data collected.");
        }

        for (key, function) in self.stats.functions() {
            if function.line_count() == 0 || !self.scope.is_in_scope(key.file()) {
                continue;
            }

            writeln!(f, "{:=<FUNCTION_REPORT_WIDTH$}", "")?;
            writeln!(f, "File: {}", key.file().display())?;
            writeln!(f, "Function: {} at line {}", key.function_name(), key.first_line())?;
            writeln!(f, "Total time: {:.1} µs", micros(function.total_time()))?;
            writeln!(f, "{:=<FUNCTION_REPORT_WIDTH$}", "")?;
            writeln!(
                f,
                "{:<8} {:<10} {:<15} {:<15} {:<10} Line Content",
                "Line #", "Hits", "Time (µs)", "Per Hit (µs)", "% Time"
            )?;
            writeln!(f, "{:-<FUNCTION_REPORT_WIDTH$}", "")?;

            for line in self.selected_lines(function) {
                let source = function.source_line(line.line_number()).unwrap_or_default();

                writeln!(
                    f,
                    "{:<8} {:<10} {:<15.1} {:<15.1} {:<10.1} {}",
                    line.line_number(),
                    line.hits(),
                    micros(line.total_time()),
                    micros(line.average_time()),
                    percent_of(line.total_time(), function.total_time()),
                    excerpt(source, FUNCTION_EXCERPT_CHARS)
                )?;
            }

            writeln!(f)?;
        }

        Ok(())
    }
}

/// The slowest lines across all functions in one table.
///
/// Obtained from [`Profiler::top_lines_report()`](crate::Profiler::top_lines_report) and rendered
/// via `Display`. Each line is labelled with its file (relative to the project boundary) and
/// function; its percentage is relative to the total time of its own function.
#[derive(Debug)]
pub struct TopLinesReport<'a> {
    stats: Ref<'a, StatsStore>,
    scope: &'a ScopeFilter,
    options: TopLinesOptions,
}

struct TopLine<'a> {
    key: &'a FunctionKey,
    function: &'a FunctionStats,
    line: &'a LineStats,
}

impl<'a> TopLinesReport<'a> {
    pub(crate) fn new(
        stats: Ref<'a, StatsStore>,
        scope: &'a ScopeFilter,
        options: TopLinesOptions,
    ) -> Self {
        Self {
            stats,
            scope,
            options,
        }
    }

    fn ranked_lines(&self) -> Vec<TopLine<'_>> {
        let mut lines: Vec<_> = self
            .stats
            .functions()
            .into_iter()
            .filter(|(key, _)| self.scope.is_in_scope(key.file()))
            .flat_map(|(key, function)| {
                function
                    .lines_by_number()
                    .into_iter()
                    .map(move |line| TopLine { key, function, line })
            })
            .filter(|top| micros(top.line.total_time()) >= self.options.min_time_micros)
            .collect();

        match self.options.sort_by {
            TopSortKey::Time => lines.sort_by_key(|top| Reverse(top.line.total_time())),
            TopSortKey::Hits => lines.sort_by_key(|top| Reverse(top.line.hits())),
        }

        lines
    }
}

impl fmt::Display for TopLinesReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines = self.ranked_lines();

        if lines.is_empty() {
            return writeln!(f, "No profiling data above the threshold.");
        }

        writeln!(f, "{:=<TOP_LINES_REPORT_WIDTH$}", "")?;
        writeln!(
            f,
            "Top {} lines across all functions (sorted by {})",
            self.options.top_n, self.options.sort_by
        )?;
        writeln!(f, "{:=<TOP_LINES_REPORT_WIDTH$}", "")?;
        writeln!(
            f,
            "{:<50} {:<6} {:<10} {:<13} {:<14} {:<8} Line Content",
            "File::Function", "Line", "Hits", "Time (µs)", "Per Hit (µs)", "% Time"
        )?;
        writeln!(f, "{:-<TOP_LINES_REPORT_WIDTH$}", "")?;

        for top in lines.iter().take(self.options.top_n) {
            let location = format!(
                "{}::{}",
                self.scope.display_path(top.key.file()),
                top.key.function_name()
            );
            let source = top
                .function
                .source_line(top.line.line_number())
                .unwrap_or_default();

            writeln!(
                f,
                "{:<50} {:<6} {:<10} {:<13.1} {:<14.1} {:<8.1} {}",
                excerpt(&location, LOCATION_CHARS),
                top.line.line_number(),
                top.line.hits(),
                micros(top.line.total_time()),
                micros(top.line.average_time()),
                percent_of(top.line.total_time(), top.function.total_time()),
                excerpt(source, TOP_LINES_EXCERPT_CHARS)
            )?;
        }

        writeln!(f, "{:=<TOP_LINES_REPORT_WIDTH$}", "")?;
        writeln!(f)
    }
}

fn micros(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1_000_000.0
}

fn percent_of(part: Duration, whole: Duration) -> f64 {
    if whole.is_zero() {
        return 0.0;
    }

    part.as_secs_f64() / whole.as_secs_f64() * 100.0
}

/// Shortens `text` to at most `limit` characters, marking the cut with an ellipsis.
fn excerpt(text: &str, limit: usize) -> Cow<'_, str> {
    if text.chars().count() <= limit {
        return Cow::Borrowed(text);
    }

    let kept: String = text
        .chars()
        .take(limit.saturating_sub(ELLIPSIS.len()))
        .collect();

    Cow::Owned(kept + ELLIPSIS)
}
