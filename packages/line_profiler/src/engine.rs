//! The trace state machine that turns execution events into line statistics.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace};

use crate::pal::{Platform, PlatformFacade};
use crate::scope::SourceFile;
use crate::stats::{FunctionKey, FunctionStats, SourceText};
use crate::{CallSite, EventConsumer, ScopeFilter, StatsStore, TraceControl, TraceEvent};

/// Consumes execution events and accumulates per-line statistics.
///
/// Time between two consecutive events is attributed to the line that was active before the
/// later event: a `Line` event closes the interval of the previous line, and a `Return` event
/// closes the interval of the last line. The interval between entering a function and its first
/// line belongs to no line.
///
/// The cursor is flat: entering a function replaces the current one and returning clears it, so
/// once a nested in-scope call returns, the caller's remaining lines are not attributed until the
/// caller is entered again.
#[derive(Debug)]
pub(crate) struct TraceEngine {
    enabled: bool,
    stats: StatsStore,
    scope: Rc<ScopeFilter>,
    platform: PlatformFacade,

    last_timestamp: Duration,
    last_line: Option<u32>,
    current_function: Option<FunctionKey>,

    resolved_files: HashMap<SourceFile, Option<Arc<Path>>>,
    sources: HashMap<Arc<Path>, Arc<SourceText>>,
}

impl TraceEngine {
    pub(crate) fn new(scope: Rc<ScopeFilter>, platform: PlatformFacade) -> Self {
        Self {
            enabled: false,
            stats: StatsStore::default(),
            scope,
            platform,
            last_timestamp: Duration::ZERO,
            last_line: None,
            current_function: None,
            resolved_files: HashMap::new(),
            sources: HashMap::new(),
        }
    }

    /// Starts accepting events with an empty cursor.
    pub(crate) fn enable(&mut self) {
        self.enabled = true;
        self.last_timestamp = self.platform.now();
        self.last_line = None;
        self.current_function = None;
    }

    pub(crate) fn disable(&mut self) {
        self.enabled = false;
    }

    pub(crate) fn stats(&self) -> &StatsStore {
        &self.stats
    }

    /// Drops all statistics, the cached file lookups and sources, and resets the cursor.
    pub(crate) fn clear(&mut self) {
        self.stats.clear();
        self.resolved_files.clear();
        self.sources.clear();
        self.last_timestamp = Duration::ZERO;
        self.last_line = None;
        self.current_function = None;
    }

    pub(crate) fn handle(&mut self, event: &TraceEvent<'_>) -> TraceControl {
        if !self.enabled {
            return TraceControl::SkipFunction;
        }

        let now = self.platform.now();

        match event {
            TraceEvent::Call(site) => self.on_call(site, now),
            TraceEvent::Line(line) => {
                self.close_interval(now);
                self.last_line = Some(*line);
                self.last_timestamp = now;
                TraceControl::Continue
            }
            TraceEvent::Return => {
                self.close_interval(now);
                self.current_function = None;
                self.last_line = None;
                TraceControl::Continue
            }
            TraceEvent::Exception => TraceControl::Continue,
        }
    }

    fn on_call(&mut self, site: &CallSite, now: Duration) -> TraceControl {
        let Some(file) = self.resolve(site.source_file()) else {
            trace!(file = site.file(), function = site.function(), "call site not found on disk");
            return TraceControl::SkipFunction;
        };

        if !self.scope.is_in_scope(&file) {
            trace!(file = %file.display(), function = site.function(), "call out of scope");
            return TraceControl::SkipFunction;
        }

        let key = FunctionKey::new(file, site.function(), site.line());

        if !self.stats.contains(&key) {
            debug!(function = %key, "first call into function");
            let source = self.load_source(key.file());
            self.stats.insert(key.clone(), FunctionStats::new(source));
        }

        self.current_function = Some(key);
        self.last_line = None;
        self.last_timestamp = now;

        TraceControl::Continue
    }

    /// Attributes the time since the previous event to the previous line, if there is one.
    fn close_interval(&mut self, now: Duration) {
        let (Some(key), Some(line)) = (&self.current_function, self.last_line) else {
            return;
        };

        let elapsed = now.saturating_sub(self.last_timestamp);

        if let Some(function) = self.stats.get_mut(key) {
            function.record(line, elapsed);
        }
    }

    fn resolve(&mut self, source: SourceFile) -> Option<Arc<Path>> {
        let platform = &self.platform;

        self.resolved_files
            .entry(source)
            .or_insert_with(|| source.resolve(platform).map(Arc::from))
            .clone()
    }

    /// Loads the source text of `file`, or an empty text if it cannot be read as UTF-8.
    fn load_source(&mut self, file: &Path) -> Arc<SourceText> {
        if let Some(source) = self.sources.get(file) {
            return Arc::clone(source);
        }

        let source = match self.platform.read_to_string(file) {
            Ok(text) => Arc::new(SourceText::parse(&text)),
            Err(error) => {
                debug!(file = %file.display(), %error, "source not available for annotation");
                Arc::default()
            }
        };

        self.sources.insert(Arc::from(file), Arc::clone(&source));
        source
    }
}

/// The engine as installed in the event slot.
#[derive(Debug)]
pub(crate) struct EngineConsumer {
    engine: Rc<RefCell<TraceEngine>>,
}

impl EngineConsumer {
    pub(crate) fn new(engine: Rc<RefCell<TraceEngine>>) -> Self {
        Self { engine }
    }
}

impl EventConsumer for EngineConsumer {
    fn on_event(&self, event: &TraceEvent<'_>) -> TraceControl {
        // A re-entrant event cannot be handled without corrupting the cursor, so it is dropped.
        // A dropped call also leaves its probe inert.
        match self.engine.try_borrow_mut() {
            Ok(mut engine) => engine.handle(event),
            Err(_) if matches!(event, TraceEvent::Call(_)) => TraceControl::SkipFunction,
            Err(_) => TraceControl::Continue,
        }
    }
}
