use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{DispatchError, TaskStateError};

/// A boxed one-shot job: produces a value or a failure.
pub type Job<T, F> = Box<dyn FnOnce() -> Result<T, F> + Send + 'static>;

/// # Delayed-dispatch engine.
///
/// Accepts a job and a delay, returns immediately with a token. The engine owns the threads
/// the job runs on; it must never run the job on the calling thread.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use timervisor::{Dispatch, TokioDispatcher};
///
/// #[tokio::main(flavor = "multi_thread")]
/// async fn main() {
///     let engine = TokioDispatcher::current().expect("inside a runtime");
///     let token = engine.schedule::<u32, String>(Box::new(|| Ok(7)), Duration::ZERO);
///     let value = token.get(&Default::default()).await;
///     assert!(matches!(value, Ok(7)));
/// }
/// ```
pub trait Dispatch: Send + Sync + 'static {
    /// Schedules `job` to run once after `delay`.
    fn schedule<T, F>(&self, job: Job<T, F>, delay: Duration) -> Box<dyn DispatchToken<T, F>>
    where
        T: Clone + Send + Sync + 'static,
        F: Clone + Send + Sync + 'static;
}

/// # Cancellable observation surface of one scheduled job.
///
/// Implementations synchronize internally; every method may be called from any thread.
#[async_trait]
pub trait DispatchToken<T, F>: Send + Sync
where
    T: Send + 'static,
    F: Send + 'static,
{
    /// Cancels the job if it has not started yet.
    ///
    /// Returns `true` iff this call moved the job to cancelled. A job that already started is
    /// never stopped; `may_interrupt` is a hint engines are free to ignore.
    fn cancel(&self, may_interrupt: bool) -> bool;

    /// Returns `true` once the job exited (normally or with a failure) or was cancelled.
    fn is_done(&self) -> bool;

    /// Returns `true` once the job was cancelled.
    fn is_cancelled(&self) -> bool;

    /// Waits for the job and returns its outcome.
    ///
    /// Fails with [`DispatchError::Interrupted`] when `interrupt` fires before the job is done,
    /// [`DispatchError::Cancelled`] when it was cancelled, [`DispatchError::Failed`] with the
    /// job's failure otherwise. `interrupt` is only observed, never reset.
    async fn get(&self, interrupt: &CancellationToken) -> Result<T, DispatchError<F>>;

    /// Returns the value of a job that completed normally.
    fn result_now(&self) -> Result<T, TaskStateError>;

    /// Returns the failure of a job that completed with one.
    fn exception_now(&self) -> Result<F, TaskStateError>;
}
