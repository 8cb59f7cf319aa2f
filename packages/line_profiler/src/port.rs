//! The thread's event-consumer slot.
//!
//! Each thread has exactly one slot. Whatever consumer occupies it receives every event that
//! probes on that thread emit. Installing a consumer hands back the previous occupant so that the
//! caller can put it back later, which lets independent consumers (a line profiler, a debugger
//! hook, a test recorder) take turns without knowing about each other.
//!
//! # Examples
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use line_profiler::{EventConsumer, TraceControl, TraceEvent, port};
//!
//! #[derive(Debug, Default)]
//! struct LineCounter {
//!     lines: Cell<u32>,
//! }
//!
//! impl EventConsumer for LineCounter {
//!     fn on_event(&self, event: &TraceEvent<'_>) -> TraceControl {
//!         if matches!(event, TraceEvent::Line(_)) {
//!             self.lines.set(self.lines.get() + 1);
//!         }
//!         TraceControl::Continue
//!     }
//! }
//!
//! let counter = Rc::new(LineCounter::default());
//! let previous = port::install(Rc::<LineCounter>::clone(&counter));
//!
//! port::dispatch(&TraceEvent::Line(10));
//! port::dispatch(&TraceEvent::Line(11));
//!
//! port::restore(previous);
//! assert_eq!(counter.lines.get(), 2);
//! ```

use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

use crate::{TraceControl, TraceEvent};

/// Receives execution events from the thread's event slot.
///
/// Consumers are shared (`Rc`) and called through `&self`, so any state they keep must use
/// interior mutability. A consumer must not panic: it runs inline in the instrumented code.
pub trait EventConsumer: Debug {
    /// Handles one event and tells the event source how to proceed.
    fn on_event(&self, event: &TraceEvent<'_>) -> TraceControl;
}

/// A consumer as held by the event slot.
pub type SharedConsumer = Rc<dyn EventConsumer>;

thread_local! {
    static SLOT: RefCell<Option<SharedConsumer>> = const { RefCell::new(None) };
}

/// Returns the consumer currently installed on this thread, if any.
#[must_use]
pub fn current_consumer() -> Option<SharedConsumer> {
    SLOT.try_with(|slot| slot.borrow().clone()).ok().flatten()
}

/// Installs `consumer` as the sole consumer for this thread and returns the one it replaced.
///
/// Keep the returned value and pass it to [`restore()`] when done.
#[must_use = "the previous consumer must be passed back to restore()"]
pub fn install(consumer: SharedConsumer) -> Option<SharedConsumer> {
    SLOT.try_with(|slot| slot.borrow_mut().replace(consumer))
        .ok()
        .flatten()
}

/// Puts back a consumer previously returned by [`install()`], or empties the slot for `None`.
pub fn restore(previous: Option<SharedConsumer>) {
    // During thread teardown the slot may already be gone, in which case there is nothing to
    // restore into.
    _ = SLOT.try_with(|slot| {
        *slot.borrow_mut() = previous;
    });
}

/// Delivers an event to the consumer installed on this thread.
///
/// Returns [`TraceControl::SkipFunction`] when no consumer is installed, as nobody wants to hear
/// about the function that is being entered.
pub fn dispatch(event: &TraceEvent<'_>) -> TraceControl {
    // The slot borrow is released before the consumer runs, so consumers are free to install or
    // restore consumers themselves.
    match current_consumer() {
        Some(consumer) => consumer.on_event(event),
        None => TraceControl::SkipFunction,
    }
}
