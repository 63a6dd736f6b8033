//! # Task handle: the caller-facing view of one scheduled task.
//!
//! A [`TaskHandle`] owns the dispatch token returned by the engine and shares the progress
//! [`Marker`] with the supervisor closure. Everything it reports is derived from those two.
//!
//! ## Status reconciliation
//! ```text
//! token.is_done?
//!   yes ─► marker == Pending && token.is_cancelled ─► Cancelled
//!          otherwise                                ─► marker (Success | Failed)
//!   no  ─► marker == Pending                        ─► Pending
//!          otherwise                                ─► Running
//! ```
//!
//! The engine flips `is_done` only after the supervisor closure exited, while the marker is
//! written inside it. A marker that already says `Success`/`Failed` on a token that is not done
//! yet is reported as `Running`, so `status() == Success` always implies `result()` succeeds.
//!
//! ## Rules
//! - `cancel`, `status`, `result`, `exception` never block.
//! - `wait` is idempotent: the action runs at most once, every call sees the same outcome.
//! - Dropping a handle does not cancel the task.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::dispatch::DispatchToken;
use crate::error::{TaskFailure, TaskStateError, WaitError, WrappedError};
use crate::events::{Bus, Event, EventKind};
use crate::tasks::id::TaskId;
use crate::tasks::status::{Marker, Progress, TaskStatus};

/// Handle to a task scheduled with [`Timer::run_after`](crate::Timer::run_after).
///
/// `R` is the action's value type (`()` for unit actions), `E` its declared error type.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use timervisor::{TaskStatus, Timer};
///
/// #[tokio::main(flavor = "multi_thread")]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let timer = Timer::new()?;
///     let handle = timer.run_after(|| Ok::<_, std::io::Error>(42), Duration::from_millis(10));
///
///     assert_eq!(handle.wait().await?, 42);
///     assert_eq!(handle.status(), TaskStatus::Success);
///     assert_eq!(handle.result()?, 42);
///     assert!(handle.exception().is_err());
///     Ok(())
/// }
/// ```
pub struct TaskHandle<R, E>
where
    R: Send + 'static,
    E: Send + Sync + 'static,
{
    id: TaskId,
    token: Box<dyn DispatchToken<R, WrappedError<E>>>,
    marker: Arc<Marker>,
    bus: Bus,
}

impl<R, E> TaskHandle<R, E>
where
    R: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    pub(crate) fn new(
        id: TaskId,
        token: Box<dyn DispatchToken<R, WrappedError<E>>>,
        marker: Arc<Marker>,
        bus: Bus,
    ) -> Self {
        Self {
            id,
            token,
            marker,
            bus,
        }
    }

    /// Returns the task id.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Cancels the task if it has not started yet.
    ///
    /// Returns `true` iff the engine acknowledged the cancellation before the action began;
    /// the action is then guaranteed never to run. A running task is never interrupted.
    /// Subsequent calls return `false`.
    pub fn cancel(&self) -> bool {
        let cancelled = self.token.cancel(false);
        if cancelled {
            self.bus
                .publish(Event::new(EventKind::TaskCancelled).with_task(self.id));
        }
        cancelled
    }

    /// Waits for the task to finish and returns its value.
    ///
    /// ### Errors
    /// - [`WaitError::Failed`] the action returned its declared error (same `Arc` for every call);
    /// - [`WaitError::Panicked`] the action panicked;
    /// - [`WaitError::Wrapped`] the action itself failed with a [`TaskStateError`];
    /// - [`WaitError::State`] `"task was cancelled"`.
    pub async fn wait(&self) -> Result<R, WaitError<E>> {
        self.wait_interruptible(&CancellationToken::new()).await
    }

    /// Like [`wait`](Self::wait), but gives up when `interrupt` fires first.
    ///
    /// An interrupted wait returns [`WaitError::State`] with `"task was interrupted"`. The
    /// token stays cancelled, so callers upstream still observe the interruption. If the task is
    /// already finished its outcome wins over a pending interrupt.
    pub async fn wait_interruptible(
        &self,
        interrupt: &CancellationToken,
    ) -> Result<R, WaitError<E>> {
        self.token
            .get(interrupt)
            .await
            .map_err(WaitError::from_dispatch)
    }

    /// Blocks the current thread until the task finishes. See [`wait`](Self::wait).
    ///
    /// Must not be called from within an async context.
    pub fn wait_blocking(&self) -> Result<R, WaitError<E>> {
        futures::executor::block_on(self.wait())
    }

    /// Returns the current lifecycle status.
    pub fn status(&self) -> TaskStatus {
        if self.token.is_done() {
            let progress = self.marker.load();
            if progress == Progress::Pending && self.token.is_cancelled() {
                return TaskStatus::Cancelled;
            }
            // the closure has exited, so the marker holds Success or Failed
            progress.into()
        } else {
            match self.marker.load() {
                Progress::Pending => TaskStatus::Pending,
                _ => TaskStatus::Running,
            }
        }
    }

    /// Returns the value of a successful task without waiting.
    ///
    /// Fails with a [`TaskStateError`] carrying the engine's reason when the task has not
    /// completed, was cancelled or failed.
    pub fn result(&self) -> Result<R, TaskStateError> {
        self.token.result_now()
    }

    /// Returns the failure of a failed task without waiting, envelope stripped.
    ///
    /// Fails with a [`TaskStateError`] when the task has not completed, was cancelled or
    /// succeeded.
    pub fn exception(&self) -> Result<TaskFailure<E>, TaskStateError> {
        self.token.exception_now().map(WrappedError::into_cause)
    }
}

impl<R, E> fmt::Debug for TaskHandle<R, E>
where
    R: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("status", &self.status())
            .finish()
    }
}
