//! Probes that instrumented code uses to emit execution events.

use std::marker::PhantomData;

use crate::{CallSite, TraceControl, TraceEvent, port};

/// Marks one activation of an instrumented function.
///
/// Created by [`probe!`](crate::probe) at the top of the function body. Creating it emits a
/// `Call` event, [`line()`](Self::line) emits `Line` events, and dropping it emits `Return`
/// (preceded by `Exception` if the thread is panicking).
///
/// If the installed consumer answers the `Call` event with [`TraceControl::SkipFunction`] - or
/// no consumer is installed - the probe is inert for the rest of the activation and emits
/// nothing more.
///
/// # Examples
///
/// ```
/// use line_profiler::{probe, probe_line};
///
/// fn checksum(data: &[u8]) -> u32 {
///     let p = probe!();
///     probe_line!(p);
///     let mut sum = 0_u32;
///     probe_line!(p);
///     for byte in data {
///         sum = sum.wrapping_add(u32::from(*byte));
///     }
///     sum
/// }
///
/// assert_eq!(checksum(b"abc"), 294);
/// ```
#[derive(Debug)]
#[must_use = "the function is traced until the probe is dropped"]
pub struct FunctionProbe {
    traced: bool,

    _single_threaded: PhantomData<*const ()>,
}

impl FunctionProbe {
    /// Announces entry into the function described by `site`.
    pub fn enter(site: &CallSite) -> Self {
        let traced = port::dispatch(&TraceEvent::Call(site)) == TraceControl::Continue;

        Self {
            traced,
            _single_threaded: PhantomData,
        }
    }

    /// Announces that `line` is about to execute.
    pub fn line(&self, line: u32) {
        if self.traced {
            port::dispatch(&TraceEvent::Line(line));
        }
    }

    /// Whether the consumer asked to receive events for this activation.
    #[must_use]
    pub fn is_traced(&self) -> bool {
        self.traced
    }
}

impl Drop for FunctionProbe {
    fn drop(&mut self) {
        if !self.traced {
            return;
        }

        if std::thread::panicking() {
            port::dispatch(&TraceEvent::Exception);
        }

        port::dispatch(&TraceEvent::Return);
    }
}

#[doc(hidden)]
#[must_use]
pub fn __type_name_of<T>(_: T) -> &'static str {
    std::any::type_name::<T>()
}

/// Expands to the fully qualified name of the enclosing function, as a `&'static str`.
///
/// # Examples
///
/// ```
/// mod parser {
///     pub fn parse() -> &'static str {
///         line_profiler::function_name!()
///     }
/// }
///
/// assert!(parser::parse().ends_with("parser::parse"));
/// ```
#[macro_export]
macro_rules! function_name {
    () => {{
        fn __here() {}
        let name = $crate::__type_name_of(__here);
        match name.strip_suffix("::__here") {
            Some(name) => name,
            None => name,
        }
    }};
}

/// Instruments the enclosing function, returning its [`FunctionProbe`](crate::FunctionProbe).
///
/// Place it first in the function body and bind the result to a named variable - binding to `_`
/// drops the probe at once. The line the macro is written on is reported as the function's
/// defining line.
#[macro_export]
macro_rules! probe {
    () => {
        $crate::FunctionProbe::enter(&$crate::CallSite::new(
            ::core::option_env!("CARGO_MANIFEST_DIR"),
            ::core::file!(),
            $crate::function_name!(),
            ::core::line!(),
        ))
    };
}

/// Announces that the statement after this macro is about to run.
///
/// Takes the [`FunctionProbe`](crate::FunctionProbe) returned by [`probe!`](crate::probe).
#[macro_export]
macro_rules! probe_line {
    ($probe:expr) => {
        $probe.line(::core::line!())
    };
}
