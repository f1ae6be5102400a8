use std::backtrace::Backtrace;
use std::fmt;
use std::panic::Location;

/// Where a completion signal was completed.
///
/// Only recorded in debug builds (`cfg(debug_assertions)`), to help trace a fault back to the
/// code that introduced it. Captured by the first successful
/// [`try_complete()`][crate::CompletionSignal::try_complete] of each cycle and forgotten on reset.
///
/// The backtrace is only populated if `RUST_BACKTRACE=1` or `RUST_LIB_BACKTRACE=1` is set.
#[derive(Debug)]
pub struct CompletionOrigin {
    location: &'static Location<'static>,
    backtrace: Backtrace,
}

impl CompletionOrigin {
    /// Captures the location of the caller (propagated through `#[track_caller]` frames).
    #[track_caller]
    pub(crate) fn capture() -> Self {
        Self {
            location: Location::caller(),
            backtrace: Backtrace::capture(),
        }
    }

    /// The source location of the call that completed the signal.
    #[must_use]
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// The backtrace of the call that completed the signal, if backtrace capture is enabled.
    #[must_use]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

impl fmt::Display for CompletionOrigin {
    #[cfg_attr(test, mutants::skip)] // No API contract for the message.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "completed at {}", self.location)
    }
}
