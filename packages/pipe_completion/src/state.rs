/// The outcome recorded by a [`CompletionSignal`][crate::CompletionSignal].
///
/// A signal starts in [`NotCompleted`][Self::NotCompleted] and transitions exactly once per cycle
/// into one of the two completed variants. Only a reset of the signal returns it to the initial
/// state.
#[expect(
    clippy::exhaustive_enums,
    reason = "the three states are the complete completion model and will never grow"
)]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum CompletionState<E> {
    /// The endpoint has not finished yet.
    #[default]
    NotCompleted,

    /// The endpoint finished gracefully.
    CompletedOk,

    /// The endpoint finished due to a fault. The error is replayed to every observer.
    CompletedWithError(E),
}

impl<E> CompletionState<E> {
    /// Whether the endpoint has finished, gracefully or not.
    #[must_use]
    #[inline]
    pub fn is_completed(&self) -> bool {
        !matches!(self, Self::NotCompleted)
    }

    /// Whether the endpoint finished due to a fault.
    #[must_use]
    #[inline]
    pub fn is_faulted(&self) -> bool {
        matches!(self, Self::CompletedWithError(_))
    }

    /// The error the endpoint faulted with, if any.
    #[must_use]
    #[inline]
    pub fn error(&self) -> Option<&E> {
        match self {
            Self::CompletedWithError(error) => Some(error),
            Self::NotCompleted | Self::CompletedOk => None,
        }
    }
}
