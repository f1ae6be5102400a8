#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! A re-armable one-shot completion signal for the endpoints of duplex data channels.
//!
//! A channel endpoint (the reading or writing half of a pipe) embeds a [`CompletionSignal`] to
//! record that it has finished, either gracefully or due to a fault, and to notify the observers
//! that subscribed to its completion. The signal is designed to live inside pooled endpoint
//! objects: once a cycle is over, [`CompletionSignal::reset()`] re-arms it for reuse without
//! giving up the memory allocated for callbacks.
//!
//! The signal does no locking, blocking or I/O. The owning endpoint provides exclusive access
//! for the mutating operations and invokes the callbacks after it has released that exclusive
//! access, so callbacks are free to call back into the endpoint.
//!
//! # Lifecycle
//!
//! 1. Observers subscribe via [`CompletionSignal::attach_callback()`].
//! 2. The endpoint finishes or faults and calls [`CompletionSignal::try_complete()`]. Only the
//!    first completion per cycle is recorded.
//! 3. If `try_complete()` returned `true`, the endpoint calls
//!    [`CompletionSignal::invoke_callbacks()`] once it has released exclusive access.
//! 4. Read and write operations on the endpoint call
//!    [`CompletionSignal::is_completed_or_err()`] to fail fast with the stored fault.
//! 5. When the endpoint returns to its pool, [`CompletionSignal::reset()`] starts a new cycle.
//!
//! # Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use pipe_completion::CompletionSignal;
//!
//! let completions = Rc::new(Cell::new(0));
//! let mut signal = CompletionSignal::<String, Rc<Cell<usize>>>::new();
//!
//! signal
//!     .attach_callback(
//!         |error, completions| {
//!             assert!(error.is_none());
//!             completions.set(completions.get() + 1);
//!         },
//!         Rc::clone(&completions),
//!     )
//!     .unwrap();
//!
//! if signal.try_complete(None) {
//!     signal.invoke_callbacks();
//! }
//!
//! assert_eq!(completions.get(), 1);
//! assert_eq!(signal.is_completed_or_err(), Ok(true));
//!
//! // Return the endpoint to the pool.
//! signal.reset();
//! assert_eq!(signal.is_completed_or_err(), Ok(false));
//! ```
//!
//! # Diagnostics
//!
//! In debug builds, the signal remembers where it was completed, which is visible via
//! [`CompletionSignal::inspect_completion_origin()`] and in the `Debug` output. Set
//! `RUST_BACKTRACE=1` to also capture a backtrace of the completing call.
//!
//! Operations are logged via `tracing` at `trace` level, with panics in callbacks logged at
//! `error` level.

mod callbacks;
mod error;
#[cfg(debug_assertions)]
mod origin;
mod signal;
mod state;

pub use callbacks::*;
pub use error::*;
#[cfg(debug_assertions)]
pub use origin::*;
pub use signal::*;
pub use state::*;
