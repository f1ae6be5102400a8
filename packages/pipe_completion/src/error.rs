use thiserror::Error;

/// Errors that can occur when operating a completion signal.
#[derive(Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The caller tried to attach a callback to a signal that has already completed.
    ///
    /// Observers can only subscribe before completion. A caller that races with completion
    /// should check [`CompletionSignal::is_completed_or_err()`][crate::CompletionSignal::is_completed_or_err]
    /// and react to the outcome directly instead of subscribing.
    #[error("cannot attach a callback to a completion signal that has already completed")]
    AlreadyCompleted,
}

/// A specialized `Result` type for completion signal operations, returning the crate's
/// [`Error`] type as the error value unless another error type is named.
pub(crate) type Result<T, E = Error> = std::result::Result<T, E>;
