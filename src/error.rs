//! Error types used by the timer, its task handles and the dispatch engine.
//!
//! This module defines the failure taxonomy surfaced to callers:
//!
//! - [`TaskStateError`]: a handle was queried in the wrong phase, or the waiter was interrupted.
//! - [`TaskFailure`]: what the user action produced instead of a value (its own error or a panic).
//! - [`WrappedError`]: transport envelope around a [`TaskFailure`] across the engine boundary.
//! - [`WaitError`]: everything [`TaskHandle::wait`](crate::TaskHandle::wait) can report.
//! - [`DispatchError`]: composed error of a dispatch token's blocking `get`.
//! - [`RuntimeError`]: errors raised while constructing the timer itself.
//!
//! All types provide `as_label` for logging/metrics.

use std::any::Any;
use std::borrow::Cow;
use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// # Errors produced while building a [`Timer`](crate::Timer).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// No tokio runtime was supplied and none is running on the current thread.
    #[error("no tokio runtime available; call from within a runtime or use `with_runtime`")]
    NoRuntime,
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use timervisor::RuntimeError;
    ///
    /// assert_eq!(RuntimeError::NoRuntime.as_label(), "runtime_missing");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::NoRuntime => "runtime_missing",
        }
    }
}

/// # A handle was queried in a phase where the requested datum is unavailable.
///
/// Raised by [`TaskHandle::result`](crate::TaskHandle::result) and
/// [`TaskHandle::exception`](crate::TaskHandle::exception) in the wrong phase, and by
/// [`TaskHandle::wait`](crate::TaskHandle::wait) when the task was cancelled or the
/// waiter was interrupted.
///
/// # Example
/// ```
/// use timervisor::TaskStateError;
///
/// let err = TaskStateError::new("task was cancelled");
/// assert_eq!(err.message(), "task was cancelled");
/// assert_eq!(err.to_string(), "task was cancelled");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TaskStateError {
    message: Cow<'static, str>,
}

impl TaskStateError {
    pub(crate) const CANCELLED: &'static str = "task was cancelled";
    pub(crate) const INTERRUPTED: &'static str = "task was interrupted";
    pub(crate) const NOT_COMPLETED: &'static str = "task has not completed";
    pub(crate) const COMPLETED_WITH_ERROR: &'static str = "task completed with an error";
    pub(crate) const COMPLETED_WITH_RESULT: &'static str = "task completed with a result";

    /// Creates a state error with a human-readable message.
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        "task_state"
    }
}

/// # What a task produced instead of a value.
///
/// Returned by [`TaskHandle::exception`](crate::TaskHandle::exception). Both variants are
/// reference counted, so cloning never clones the user error itself and every observer sees
/// the same allocation.
#[derive(Error, Debug)]
pub enum TaskFailure<E> {
    /// The action returned `Err(e)`.
    #[error("{0}")]
    Error(Arc<E>),

    /// The action panicked; carries the panic message.
    #[error("task panicked: {0}")]
    Panic(Arc<str>),
}

impl<E> Clone for TaskFailure<E> {
    fn clone(&self) -> Self {
        match self {
            TaskFailure::Error(e) => TaskFailure::Error(Arc::clone(e)),
            TaskFailure::Panic(msg) => TaskFailure::Panic(Arc::clone(msg)),
        }
    }
}

impl<E> TaskFailure<E> {
    /// Returns the user error, if the action returned one.
    pub fn error(&self) -> Option<&E> {
        match self {
            TaskFailure::Error(e) => Some(e),
            TaskFailure::Panic(_) => None,
        }
    }

    /// Returns the panic message, if the action panicked.
    pub fn panic_message(&self) -> Option<&str> {
        match self {
            TaskFailure::Error(_) => None,
            TaskFailure::Panic(msg) => Some(msg),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskFailure::Error(_) => "task_error",
            TaskFailure::Panic(_) => "task_panic",
        }
    }
}

/// # Envelope transporting a task failure across the dispatch boundary.
///
/// The supervisor closure returns every failure inside this wrapper so the engine records a
/// single uniform failure type. [`TaskHandle::wait`](crate::TaskHandle::wait) strips it again,
/// except when the action itself failed with a [`TaskStateError`]; then the envelope is kept
/// so callers can tell it apart from a state error reported by `wait` itself.
#[derive(Error, Debug)]
#[error("wrapped task failure: {cause}")]
pub struct WrappedError<E> {
    cause: TaskFailure<E>,
}

impl<E> Clone for WrappedError<E> {
    fn clone(&self) -> Self {
        Self {
            cause: self.cause.clone(),
        }
    }
}

impl<E> WrappedError<E> {
    /// Wraps a failure.
    pub fn new(cause: TaskFailure<E>) -> Self {
        Self { cause }
    }

    /// Returns the wrapped failure.
    pub fn cause(&self) -> &TaskFailure<E> {
        &self.cause
    }

    /// Unwraps the failure.
    pub fn into_cause(self) -> TaskFailure<E> {
        self.cause
    }
}

/// # Errors reported by [`TaskHandle::wait`](crate::TaskHandle::wait).
#[derive(Error, Debug)]
pub enum WaitError<E> {
    /// The action returned its declared error.
    #[error("task failed: {0}")]
    Failed(Arc<E>),

    /// The action panicked. Surfaced as-is, outside the declared error channel.
    #[error("task panicked: {0}")]
    Panicked(Arc<str>),

    /// The action itself failed with a [`TaskStateError`]; the envelope is preserved.
    ///
    /// Recognized when `E` is `TaskStateError`, or `Box<dyn Error + Send + Sync>` with a
    /// `TaskStateError` anywhere in its `source()` chain. Other error containers (for example
    /// `anyhow::Error`) are opaque here and surface as [`WaitError::Failed`].
    #[error(transparent)]
    Wrapped(WrappedError<E>),

    /// The task was cancelled or the waiter was interrupted.
    #[error(transparent)]
    State(#[from] TaskStateError),
}

impl<E> Clone for WaitError<E> {
    fn clone(&self) -> Self {
        match self {
            WaitError::Failed(e) => WaitError::Failed(Arc::clone(e)),
            WaitError::Panicked(msg) => WaitError::Panicked(Arc::clone(msg)),
            WaitError::Wrapped(w) => WaitError::Wrapped(w.clone()),
            WaitError::State(s) => WaitError::State(s.clone()),
        }
    }
}

impl<E> WaitError<E> {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use timervisor::{TaskStateError, WaitError};
    ///
    /// let err: WaitError<std::io::Error> = TaskStateError::new("task was cancelled").into();
    /// assert_eq!(err.as_label(), "task_state");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            WaitError::Failed(_) => "task_failed",
            WaitError::Panicked(_) => "task_panicked",
            WaitError::Wrapped(_) => "task_wrapped",
            WaitError::State(_) => "task_state",
        }
    }

    /// Returns the state error, if `wait` itself reported one.
    pub fn as_state(&self) -> Option<&TaskStateError> {
        match self {
            WaitError::State(s) => Some(s),
            _ => None,
        }
    }

    /// Maps the composed engine error into what `wait` reports.
    pub(crate) fn from_dispatch(err: DispatchError<WrappedError<E>>) -> Self
    where
        E: 'static,
    {
        match err {
            DispatchError::Interrupted => {
                WaitError::State(TaskStateError::new(TaskStateError::INTERRUPTED))
            }
            DispatchError::Cancelled => {
                WaitError::State(TaskStateError::new(TaskStateError::CANCELLED))
            }
            DispatchError::Failed(wrapped) => match wrapped.cause() {
                TaskFailure::Error(e) if is_state_error(e.as_ref()) => WaitError::Wrapped(wrapped),
                TaskFailure::Error(e) => WaitError::Failed(Arc::clone(e)),
                TaskFailure::Panic(msg) => WaitError::Panicked(Arc::clone(msg)),
            },
        }
    }
}

/// # Composed error of a dispatch token's `get`.
#[derive(Error, Debug, Clone)]
pub enum DispatchError<F> {
    /// The waiter was interrupted before the job finished.
    #[error("wait interrupted")]
    Interrupted,

    /// The job was cancelled before it started.
    #[error("job cancelled")]
    Cancelled,

    /// The job finished with a failure.
    #[error("job failed: {0}")]
    Failed(F),
}

impl<F> DispatchError<F> {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::Interrupted => "dispatch_interrupted",
            DispatchError::Cancelled => "dispatch_cancelled",
            DispatchError::Failed(_) => "dispatch_failed",
        }
    }
}

/// Reports whether a user error is (or boxes) a [`TaskStateError`].
pub(crate) fn is_state_error<E: 'static>(e: &E) -> bool {
    let any = e as &dyn Any;
    if any.is::<TaskStateError>() {
        return true;
    }
    if let Some(boxed) = any.downcast_ref::<Box<dyn StdError + Send + Sync>>() {
        let root: &(dyn StdError + 'static) = boxed.as_ref();
        return std::iter::successors(Some(root), |err: &&(dyn StdError + 'static)| (*err).source())
            .any(|err| err.is::<TaskStateError>());
    }
    false
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
