use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, trace};

#[cfg(debug_assertions)]
use crate::CompletionOrigin;
use crate::{CallbackList, CompletionCallback, CompletionState, Error, Result};

/// Records that a channel endpoint has finished and notifies the observers of that endpoint.
///
/// The signal completes at most once per cycle, either gracefully or with an error of type `E`.
/// Observers are attached before completion as a [`CompletionCallback`] plus an opaque state
/// value of type `S` and are invoked in attachment order.
///
/// After the owner is done with a cycle, [`reset()`][Self::reset] re-arms the signal so the
/// owning endpoint can be returned to an object pool and reused.
///
/// # Calling contract
///
/// The signal does no synchronization of its own. The owner is expected to guard it with the
/// same exclusive access (a lock, a `RefCell`, plain ownership) that guards the rest of the
/// endpoint:
///
/// * [`try_complete()`][Self::try_complete], [`attach_callback()`][Self::attach_callback] and
///   [`reset()`][Self::reset] take `&mut self` and so require exclusive access.
/// * [`invoke_callbacks()`][Self::invoke_callbacks] takes `&self` and is meant to be called after
///   the owner has released exclusive access, under a shared borrow at most. Callbacks may
///   re-enter the owner, including taking further shared borrows of the signal.
///
/// `try_complete()` never invokes callbacks itself. It returns `true` if any are registered, at
/// which point the caller is obligated to call `invoke_callbacks()` exactly once.
///
/// # Example
///
/// ```rust
/// use pipe_completion::CompletionSignal;
///
/// let mut signal = CompletionSignal::<String, &str>::new();
///
/// signal
///     .attach_callback(|error, name| println!("{name} observed {error:?}"), "reader")
///     .unwrap();
///
/// // While holding exclusive access to the endpoint.
/// let must_invoke = signal.try_complete(Some("connection reset".to_string()));
///
/// // After releasing exclusive access.
/// if must_invoke {
///     signal.invoke_callbacks();
/// }
///
/// assert_eq!(
///     signal.is_completed_or_err(),
///     Err(&"connection reset".to_string())
/// );
/// ```
pub struct CompletionSignal<E, S> {
    state: CompletionState<E>,

    callbacks: CallbackList<E, S>,

    // In debug builds, we save where the current cycle was completed, to help trace faults back
    // to their origin. Cleared on reset.
    #[cfg(debug_assertions)]
    origin: Option<CompletionOrigin>,
}

impl<E, S> CompletionSignal<E, S> {
    /// Creates a signal in the not-completed state with no callbacks attached.
    ///
    /// No memory is allocated until the first callback is attached.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: CompletionState::NotCompleted,
            callbacks: CallbackList::new(),
            #[cfg(debug_assertions)]
            origin: None,
        }
    }

    /// Completes the signal, gracefully if `error` is `None` or with the given error otherwise.
    ///
    /// Only the first completion of a cycle is recorded. If the signal has already completed,
    /// the stored outcome is left untouched and the supplied error is dropped.
    ///
    /// Returns whether any callbacks are attached. If this returns `true`, the caller must call
    /// [`invoke_callbacks()`][Self::invoke_callbacks] once it has released exclusive access to
    /// the owning endpoint. This method never invokes callbacks itself.
    #[must_use = "if callbacks are pending, the caller must invoke them"]
    #[track_caller]
    pub fn try_complete(&mut self, error: Option<E>) -> bool {
        if self.state.is_completed() {
            debug!(
                faulted = error.is_some(),
                "ignoring completion of an already completed signal"
            );

            return !self.callbacks.is_empty();
        }

        let faulted = error.is_some();
        self.state = error.map_or(
            CompletionState::CompletedOk,
            CompletionState::CompletedWithError,
        );

        #[cfg(debug_assertions)]
        {
            self.origin = Some(CompletionOrigin::capture());
        }

        trace!(
            faulted,
            callback_count = self.callbacks.len(),
            "completion signal completed"
        );

        !self.callbacks.is_empty()
    }

    /// Attaches a callback to be invoked with `state` when the signal completes.
    ///
    /// Callbacks are invoked in the order they were attached.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyCompleted`] if the signal has already completed in the current
    /// cycle. The state value is dropped in that case.
    pub fn attach_callback(&mut self, callback: CompletionCallback<E, S>, state: S) -> Result<()> {
        if self.state.is_completed() {
            return Err(Error::AlreadyCompleted);
        }

        self.callbacks.push(callback, state);

        trace!(
            callback_count = self.callbacks.len(),
            "completion callback attached"
        );

        Ok(())
    }

    /// Checks whether the signal has completed, surfacing the fault if it completed with one.
    ///
    /// Returns `Ok(false)` if not completed and `Ok(true)` if completed gracefully. Checking does
    /// not consume the outcome, so every check until the next reset observes the same result.
    ///
    /// # Errors
    ///
    /// Returns the stored error, unmodified, if the signal completed with a fault.
    pub fn is_completed_or_err(&self) -> Result<bool, &E> {
        match &self.state {
            CompletionState::NotCompleted => Ok(false),
            CompletionState::CompletedOk => Ok(true),
            CompletionState::CompletedWithError(error) => Err(error),
        }
    }

    /// Invokes every attached callback in attachment order, passing the stored error (if any)
    /// and the state value each callback was attached with.
    ///
    /// The callback list is not consumed. Calling this more than once per cycle invokes every
    /// callback again, so the owner must make sure it is called once per completion.
    ///
    /// # Panics
    ///
    /// If a callback panics, the remaining callbacks are still invoked, after which the first
    /// panic is resumed.
    ///
    /// In debug builds, panics if the signal has not completed. Invoking callbacks before
    /// completion is a bug in the owner. Release builds invoke nothing in that case.
    pub fn invoke_callbacks(&self) {
        debug_assert!(
            self.state.is_completed(),
            "completion callbacks invoked before the signal completed"
        );

        if !self.state.is_completed() {
            return;
        }

        let error = self.state.error();

        trace!(
            faulted = error.is_some(),
            callback_count = self.callbacks.len(),
            "invoking completion callbacks"
        );

        let mut first_panic = None;

        for (index, entry) in self.callbacks.iter().enumerate() {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| entry.invoke(error))) {
                error!(
                    callback_index = index,
                    "completion callback panicked; invoking the remaining callbacks before resuming the panic"
                );

                if first_panic.is_none() {
                    first_panic = Some(payload);
                }
            }
        }

        if let Some(payload) = first_panic {
            panic::resume_unwind(payload);
        }
    }

    /// Re-arms a completed signal for a new cycle.
    ///
    /// All attached callbacks are dropped together with their state values (whether or not they
    /// were invoked) and the signal returns to the not-completed state. The memory allocated
    /// for callbacks is retained for reuse in the next cycle.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if the signal has not completed.
    pub fn reset(&mut self) {
        debug_assert!(
            self.state.is_completed(),
            "reset of a completion signal that has not completed"
        );

        self.callbacks.clear();
        self.state = CompletionState::NotCompleted;

        #[cfg(debug_assertions)]
        {
            self.origin = None;
        }

        trace!("completion signal reset");
    }

    /// Whether the signal has completed in the current cycle, gracefully or not.
    #[must_use]
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.state.is_completed()
    }

    /// The outcome recorded in the current cycle.
    #[must_use]
    #[inline]
    pub fn state(&self) -> &CompletionState<E> {
        &self.state
    }

    /// The number of callbacks attached in the current cycle.
    #[must_use]
    #[inline]
    pub fn callback_count(&self) -> usize {
        self.callbacks.len()
    }

    /// The number of callbacks that can be attached without allocating.
    #[must_use]
    #[inline]
    pub fn callback_capacity(&self) -> usize {
        self.callbacks.capacity()
    }

    /// Uses the provided closure to inspect where the signal was completed in the current cycle.
    ///
    /// This method is only available in debug builds (`cfg(debug_assertions)`).
    /// For the backtrace to be populated, `RUST_BACKTRACE=1` or `RUST_LIB_BACKTRACE=1` must be set.
    ///
    /// The closure receives `None` if the signal has not completed.
    #[cfg(debug_assertions)]
    pub fn inspect_completion_origin(&self, f: impl FnOnce(Option<&CompletionOrigin>)) {
        f(self.origin.as_ref());
    }
}

impl<E, S> Default for CompletionSignal<E, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, S> fmt::Display for CompletionSignal<E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "is_completed: {}", self.state.is_completed())
    }
}

impl<E, S> fmt::Debug for CompletionSignal<E, S>
where
    E: fmt::Debug,
{
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("CompletionSignal");

        debug.field("state", &self.state);
        debug.field("callbacks", &self.callbacks);

        #[cfg(debug_assertions)]
        {
            debug.field("origin", &self.origin);
        }

        debug.finish()
    }
}
