//! Accumulated per-function, per-line statistics.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Statistics for a single source line within one function.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LineStats {
    line_number: u32,
    hits: u64,
    total_time: Duration,
}

impl LineStats {
    pub(crate) fn new(line_number: u32) -> Self {
        Self {
            line_number,
            hits: 0,
            total_time: Duration::ZERO,
        }
    }

    /// Closes one active interval of this line.
    pub(crate) fn record(&mut self, elapsed: Duration) {
        self.hits = self.hits.saturating_add(1);
        self.total_time = self.total_time.saturating_add(elapsed);
    }

    /// The 1-based line number.
    #[must_use]
    pub fn line_number(&self) -> u32 {
        self.line_number
    }

    /// How many times an active interval of this line was closed.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Total time attributed to this line.
    #[must_use]
    pub fn total_time(&self) -> Duration {
        self.total_time
    }

    /// Mean time per hit, or zero if the line has no hits.
    #[must_use]
    pub fn average_time(&self) -> Duration {
        if self.hits == 0 {
            return Duration::ZERO;
        }

        let nanos = self
            .total_time
            .as_nanos()
            .checked_div(u128::from(self.hits))
            .unwrap_or_default();

        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

/// Identifies one function definition: source file, function name and defining line.
///
/// The name alone is not enough - two functions with the same name can live in different files,
/// and closures or nested functions can share names within one file.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct FunctionKey {
    file: Arc<Path>,
    function_name: Arc<str>,
    first_line: u32,
}

impl FunctionKey {
    pub(crate) fn new(
        file: Arc<Path>,
        function_name: impl Into<Arc<str>>,
        first_line: u32,
    ) -> Self {
        Self {
            file,
            function_name: function_name.into(),
            first_line,
        }
    }

    /// The canonical path of the source file the function is defined in.
    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// The fully qualified function name.
    #[must_use]
    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    /// The line the function is defined at.
    #[must_use]
    pub fn first_line(&self) -> u32 {
        self.first_line
    }
}

impl fmt::Display for FunctionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}:{})",
            self.function_name,
            self.file.display(),
            self.first_line
        )
    }
}

/// The lines of a source file, loaded once for annotating reports.
#[derive(Debug, Default)]
pub(crate) struct SourceText {
    lines: Vec<String>,
}

impl SourceText {
    pub(crate) fn parse(text: &str) -> Self {
        Self {
            lines: text.lines().map(|line| line.trim_end().to_owned()).collect(),
        }
    }

    fn line(&self, line_number: u32) -> Option<&str> {
        let index = usize::try_from(line_number).ok()?.checked_sub(1)?;
        self.lines.get(index).map(String::as_str)
    }
}

/// Statistics for one function definition.
#[derive(Clone, Debug)]
pub struct FunctionStats {
    line_stats: HashMap<u32, LineStats>,
    source: Arc<SourceText>,
    total_time: Duration,
}

impl FunctionStats {
    pub(crate) fn new(source: Arc<SourceText>) -> Self {
        Self {
            line_stats: HashMap::new(),
            source,
            total_time: Duration::ZERO,
        }
    }

    /// Attributes one closed interval to `line_number`.
    pub(crate) fn record(&mut self, line_number: u32, elapsed: Duration) {
        self.line_stats
            .entry(line_number)
            .or_insert_with(|| LineStats::new(line_number))
            .record(elapsed);

        self.total_time = self.total_time.saturating_add(elapsed);
    }

    /// Statistics for one line, if it was observed.
    #[must_use]
    pub fn line(&self, line_number: u32) -> Option<&LineStats> {
        self.line_stats.get(&line_number)
    }

    /// Statistics for every observed line, in no particular order.
    pub fn lines(&self) -> impl Iterator<Item = &LineStats> {
        self.line_stats.values()
    }

    /// Statistics for every observed line, ordered by line number.
    #[must_use]
    pub fn lines_by_number(&self) -> Vec<&LineStats> {
        let mut lines: Vec<_> = self.line_stats.values().collect();
        lines.sort_by_key(|line| line.line_number);
        lines
    }

    /// Number of distinct lines observed.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_stats.len()
    }

    /// The source text of a line, if the source file could be read.
    #[must_use]
    pub fn source_line(&self, line_number: u32) -> Option<&str> {
        self.source.line(line_number)
    }

    /// Sum of the time attributed to all lines of this function.
    #[must_use]
    pub fn total_time(&self) -> Duration {
        self.total_time
    }
}

/// All statistics collected by a profiler, keyed by function.
///
/// Entries appear the first time an in-scope function is entered and stay until the profiler is
/// cleared.
#[derive(Debug, Default)]
pub struct StatsStore {
    functions: HashMap<FunctionKey, FunctionStats>,
}

impl StatsStore {
    pub(crate) fn contains(&self, key: &FunctionKey) -> bool {
        self.functions.contains_key(key)
    }

    pub(crate) fn insert(&mut self, key: FunctionKey, stats: FunctionStats) {
        self.functions.insert(key, stats);
    }

    pub(crate) fn get_mut(&mut self, key: &FunctionKey) -> Option<&mut FunctionStats> {
        self.functions.get_mut(key)
    }

    pub(crate) fn clear(&mut self) {
        self.functions.clear();
    }

    /// Statistics for one function, if it was entered.
    #[must_use]
    pub fn get(&self, key: &FunctionKey) -> Option<&FunctionStats> {
        self.functions.get(key)
    }

    /// Every function and its statistics, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&FunctionKey, &FunctionStats)> {
        self.functions.iter()
    }

    /// Every function and its statistics, ordered by file, name and defining line.
    #[must_use]
    pub fn functions(&self) -> Vec<(&FunctionKey, &FunctionStats)> {
        let mut functions: Vec<_> = self.functions.iter().collect();
        functions.sort_by(|(a, _), (b, _)| a.cmp(b));
        functions
    }

    /// Functions whose name ends with `suffix`, ordered as in [`functions()`](Self::functions).
    ///
    /// Function names are fully qualified, so matching on a suffix such as `"::parse"` is the
    /// usual way to pick out a function.
    #[must_use]
    pub fn find(&self, suffix: &str) -> Vec<(&FunctionKey, &FunctionStats)> {
        self.functions()
            .into_iter()
            .filter(|(key, _)| key.function_name.ends_with(suffix))
            .collect()
    }

    /// Number of functions with statistics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Whether no function has been entered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl<'a> IntoIterator for &'a StatsStore {
    type Item = (&'a FunctionKey, &'a FunctionStats);
    type IntoIter = std::collections::hash_map::Iter<'a, FunctionKey, FunctionStats>;

    fn into_iter(self) -> Self::IntoIter {
        self.functions.iter()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn key(name: &str, first_line: u32) -> FunctionKey {
        FunctionKey::new(Arc::from(PathBuf::from("/p/src/lib.rs")), name, first_line)
    }

    #[test]
    fn average_of_zero_hits_is_zero() {
        let line = LineStats::new(3);
        assert_eq!(line.hits(), 0);
        assert_eq!(line.average_time(), Duration::ZERO);
    }

    #[test]
    fn average_times_hits_matches_total() {
        let mut line = LineStats::new(3);
        line.record(Duration::from_nanos(1_000));
        line.record(Duration::from_nanos(2_000));
        line.record(Duration::from_nanos(4_000));

        assert_eq!(line.hits(), 3);
        assert_eq!(line.total_time(), Duration::from_nanos(7_000));

        // Truncating division loses at most one nanosecond per hit.
        let reconstructed = line.average_time() * 3;
        let error = line.total_time().saturating_sub(reconstructed);
        assert!(error < Duration::from_nanos(3));
    }

    #[test]
    fn function_total_is_sum_of_lines() {
        let mut function = FunctionStats::new(Arc::default());
        function.record(10, Duration::from_micros(5));
        function.record(11, Duration::from_micros(7));
        function.record(10, Duration::from_micros(1));

        let sum: Duration = function.lines().map(LineStats::total_time).sum();
        assert_eq!(function.total_time(), sum);
        assert_eq!(function.line(10).unwrap().hits(), 2);
        assert_eq!(function.line_count(), 2);
    }

    #[test]
    fn lines_by_number_is_sorted() {
        let mut function = FunctionStats::new(Arc::default());
        function.record(30, Duration::ZERO);
        function.record(10, Duration::ZERO);
        function.record(20, Duration::ZERO);

        let numbers: Vec<_> = function
            .lines_by_number()
            .into_iter()
            .map(LineStats::line_number)
            .collect();
        assert_eq!(numbers, vec![10, 20, 30]);
    }

    #[test]
    fn source_lines_are_one_based_and_trimmed() {
        let source = Arc::new(SourceText::parse("fn a() {   \n    work();\n}\n"));
        let function = FunctionStats::new(source);

        assert_eq!(function.source_line(1), Some("fn a() {"));
        assert_eq!(function.source_line(2), Some("    work();"));
        assert_eq!(function.source_line(0), None);
        assert_eq!(function.source_line(4), None);
    }

    #[test]
    fn same_name_different_line_are_distinct_keys() {
        let mut store = StatsStore::default();
        store.insert(key("crate::f", 1), FunctionStats::new(Arc::default()));
        store.insert(key("crate::f", 20), FunctionStats::new(Arc::default()));

        assert_eq!(store.len(), 2);
        assert_eq!(store.find("::f").len(), 2);
    }

    #[test]
    fn functions_are_ordered_by_key() {
        let mut store = StatsStore::default();
        store.insert(key("crate::b", 5), FunctionStats::new(Arc::default()));
        store.insert(key("crate::a", 9), FunctionStats::new(Arc::default()));
        store.insert(key("crate::a", 2), FunctionStats::new(Arc::default()));

        let order: Vec<_> = store
            .functions()
            .into_iter()
            .map(|(key, _)| (key.function_name().to_owned(), key.first_line()))
            .collect();

        assert_eq!(
            order,
            vec![
                ("crate::a".to_owned(), 2),
                ("crate::a".to_owned(), 9),
                ("crate::b".to_owned(), 5),
            ]
        );
    }

    #[test]
    fn clear_empties_store() {
        let mut store = StatsStore::default();
        store.insert(key("crate::f", 1), FunctionStats::new(Arc::default()));

        store.clear();
        assert!(store.is_empty());

        store.clear();
        assert!(store.is_empty());
    }
}
