//! # Tokio-backed delayed dispatch.
//!
//! [`TokioDispatcher`] spawns one lightweight tokio task per scheduled job. The task sleeps for
//! the delay, claims the job, and runs it either on tokio's blocking pool or inline.
//!
//! ## Job state machine
//! ```text
//! Scheduled ──begin()──► Running ──complete()──► Completed
//!     │                     │
//!     └──cancel()───────────┴──abandon()───────► Cancelled
//! ```
//!
//! - `begin` and `cancel` race with a compare-and-swap on `Scheduled`: exactly one wins.
//! - `abandon` only fires when a job ends without an outcome (runtime shutdown, engine bug).
//! - The outcome is written before the state flips to `Completed` (release), and waiters are
//!   woken through a `watch` channel after that.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::dispatch::token::{Dispatch, DispatchToken, Job};
use crate::error::{DispatchError, RuntimeError, TaskStateError};

const SCHEDULED: u8 = 0;
const RUNNING: u8 = 1;
const COMPLETED: u8 = 2;
const CANCELLED: u8 = 3;

/// Default dispatch engine over a tokio runtime.
///
/// Cheap to clone; clones share the runtime handle.
#[derive(Clone, Debug)]
pub struct TokioDispatcher {
    handle: Handle,
    blocking: bool,
}

impl TokioDispatcher {
    /// Creates an engine running jobs on `handle`.
    ///
    /// With `blocking = true` jobs run on the blocking pool (`spawn_blocking`), so actions may
    /// block or sleep freely. With `false` they run inline on an async worker thread.
    pub fn new(handle: Handle, blocking: bool) -> Self {
        Self { handle, blocking }
    }

    /// Creates a blocking-pool engine on the runtime of the current thread.
    pub fn current() -> Result<Self, RuntimeError> {
        let handle = Handle::try_current().map_err(|_| RuntimeError::NoRuntime)?;
        Ok(Self::new(handle, true))
    }
}

impl Dispatch for TokioDispatcher {
    fn schedule<T, F>(&self, job: Job<T, F>, delay: Duration) -> Box<dyn DispatchToken<T, F>>
    where
        T: Clone + Send + Sync + 'static,
        F: Clone + Send + Sync + 'static,
    {
        let shared = Arc::new(Shared::new());
        let slot = Arc::clone(&shared);
        let blocking = self.blocking;
        let spawner = self.handle.clone();
        // Armed before spawning: a future dropped unpolled still abandons the job.
        let guard = AbandonGuard::new(Arc::clone(&shared));

        self.handle.spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = slot.wake.cancelled() => {}
            }
            if !slot.begin() {
                guard.disarm();
                return;
            }

            if blocking {
                // Completion happens inside the blocking closure: once it runs, the outcome is
                // recorded even if this async task is dropped by a runtime shutdown.
                let _ = spawner.spawn_blocking(move || guard.finish(job()));
            } else {
                guard.finish(job());
            }
        });

        Box::new(TokioToken { shared })
    }
}

/// State shared between a token and its spawned job.
struct Shared<T, F> {
    state: AtomicU8,
    outcome: OnceLock<Result<T, F>>,
    done: watch::Sender<bool>,
    /// Wakes the sleeping job after a successful cancel.
    wake: CancellationToken,
}

impl<T, F> Shared<T, F> {
    fn new() -> Self {
        let (done, _rx) = watch::channel(false);
        Self {
            state: AtomicU8::new(SCHEDULED),
            outcome: OnceLock::new(),
            done,
            wake: CancellationToken::new(),
        }
    }

    #[inline]
    fn load(&self) -> u8 {
        self.state.load(Ordering::Acquire)
    }

    fn begin(&self) -> bool {
        self.state
            .compare_exchange(SCHEDULED, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn cancel(&self) -> bool {
        let won = self
            .state
            .compare_exchange(SCHEDULED, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won {
            self.wake.cancel();
            self.done.send_replace(true);
        }
        won
    }

    fn complete(&self, outcome: Result<T, F>) {
        let _ = self.outcome.set(outcome);
        self.state.store(COMPLETED, Ordering::Release);
        self.done.send_replace(true);
    }

    /// Marks a job that ended without recording an outcome as cancelled.
    fn abandon(&self) {
        let prev = self.state.load(Ordering::Acquire);
        if prev == SCHEDULED || prev == RUNNING {
            self.state.store(CANCELLED, Ordering::Release);
            self.done.send_replace(true);
            tracing::warn!(
                was_running = prev == RUNNING,
                "delayed job ended without an outcome; marking it cancelled"
            );
        }
    }
}

/// Abandons the job when dropped before `finish` or `disarm`.
struct AbandonGuard<T, F> {
    slot: Option<Arc<Shared<T, F>>>,
}

impl<T, F> AbandonGuard<T, F> {
    fn new(slot: Arc<Shared<T, F>>) -> Self {
        Self { slot: Some(slot) }
    }

    fn finish(mut self, outcome: Result<T, F>) {
        if let Some(slot) = self.slot.take() {
            slot.complete(outcome);
        }
    }

    fn disarm(mut self) {
        self.slot.take();
    }
}

impl<T, F> Drop for AbandonGuard<T, F> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            slot.abandon();
        }
    }
}

/// Token returned by [`TokioDispatcher::schedule`].
struct TokioToken<T, F> {
    shared: Arc<Shared<T, F>>,
}

impl<T, F> TokioToken<T, F>
where
    T: Clone,
    F: Clone,
{
    fn settled(&self) -> Result<T, DispatchError<F>> {
        match self.shared.outcome.get() {
            Some(Ok(v)) => Ok(v.clone()),
            Some(Err(f)) => Err(DispatchError::Failed(f.clone())),
            None => Err(DispatchError::Cancelled),
        }
    }
}

#[async_trait]
impl<T, F> DispatchToken<T, F> for TokioToken<T, F>
where
    T: Clone + Send + Sync + 'static,
    F: Clone + Send + Sync + 'static,
{
    fn cancel(&self, _may_interrupt: bool) -> bool {
        self.shared.cancel()
    }

    fn is_done(&self) -> bool {
        self.shared.load() >= COMPLETED
    }

    fn is_cancelled(&self) -> bool {
        self.shared.load() == CANCELLED
    }

    async fn get(&self, interrupt: &CancellationToken) -> Result<T, DispatchError<F>> {
        if !self.is_done() {
            let mut rx = self.shared.done.subscribe();
            let finished = async move {
                let _ = rx.wait_for(|done| *done).await;
            };
            tokio::select! {
                biased;
                _ = finished => {}
                _ = interrupt.cancelled() => return Err(DispatchError::Interrupted),
            }
        }
        self.settled()
    }

    fn result_now(&self) -> Result<T, TaskStateError> {
        match self.shared.load() {
            COMPLETED => match self.shared.outcome.get() {
                Some(Ok(v)) => Ok(v.clone()),
                _ => Err(TaskStateError::new(TaskStateError::COMPLETED_WITH_ERROR)),
            },
            CANCELLED => Err(TaskStateError::new(TaskStateError::CANCELLED)),
            _ => Err(TaskStateError::new(TaskStateError::NOT_COMPLETED)),
        }
    }

    fn exception_now(&self) -> Result<F, TaskStateError> {
        match self.shared.load() {
            COMPLETED => match self.shared.outcome.get() {
                Some(Err(f)) => Ok(f.clone()),
                _ => Err(TaskStateError::new(TaskStateError::COMPLETED_WITH_RESULT)),
            },
            CANCELLED => Err(TaskStateError::new(TaskStateError::CANCELLED)),
            _ => Err(TaskStateError::new(TaskStateError::NOT_COMPLETED)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize};

    fn engine() -> TokioDispatcher {
        TokioDispatcher::current().expect("runtime")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_job_runs_after_delay() {
        let token = engine().schedule::<u32, String>(Box::new(|| Ok(5)), Duration::from_millis(10));
        assert!(!token.is_done());

        let v = token.get(&CancellationToken::new()).await;
        assert!(matches!(v, Ok(5)));
        assert!(token.is_done());
        assert!(!token.is_cancelled());
        assert_eq!(token.result_now().ok(), Some(5));
        assert_eq!(
            token.exception_now().unwrap_err().message(),
            "task completed with a result"
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failure_is_recorded() {
        let token = engine().schedule::<u32, String>(
            Box::new(|| Err("nope".to_string())),
            Duration::ZERO,
        );
        match token.get(&CancellationToken::new()).await {
            Err(DispatchError::Failed(f)) => assert_eq!(f, "nope"),
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(token.exception_now().ok().as_deref(), Some("nope"));
        assert_eq!(
            token.result_now().unwrap_err().message(),
            "task completed with an error"
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_cancel_before_start_prevents_run() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let token = engine().schedule::<(), String>(
            Box::new(move || {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            }),
            Duration::from_secs(60),
        );

        assert!(token.cancel(false));
        assert!(!token.cancel(false), "second cancel must report false");
        assert!(token.is_done());
        assert!(token.is_cancelled());
        assert!(matches!(
            token.get(&CancellationToken::new()).await,
            Err(DispatchError::Cancelled)
        ));
        assert_eq!(token.result_now().unwrap_err().message(), "task was cancelled");
        assert_eq!(token.exception_now().unwrap_err().message(), "task was cancelled");

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_cancel_after_start_is_refused() {
        let token = engine().schedule::<u32, String>(
            Box::new(|| {
                std::thread::sleep(Duration::from_millis(100));
                Ok(9)
            }),
            Duration::ZERO,
        );
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(!token.cancel(false));
        assert!(!token.is_cancelled());
        assert!(matches!(token.get(&CancellationToken::new()).await, Ok(9)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_get_is_interruptible() {
        let token = engine().schedule::<u32, String>(Box::new(|| Ok(1)), Duration::from_secs(60));
        let interrupt = CancellationToken::new();
        interrupt.cancel();

        assert!(matches!(
            token.get(&interrupt).await,
            Err(DispatchError::Interrupted)
        ));
        assert!(interrupt.is_cancelled());
        assert!(!token.is_done());
        assert_eq!(token.result_now().unwrap_err().message(), "task has not completed");
        assert!(token.cancel(false));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_completed_wins_over_interrupt() {
        let token = engine().schedule::<u32, String>(Box::new(|| Ok(3)), Duration::ZERO);
        let _ = token.get(&CancellationToken::new()).await;

        let interrupt = CancellationToken::new();
        interrupt.cancel();
        assert!(matches!(token.get(&interrupt).await, Ok(3)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_inline_mode_runs_job() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let engine = TokioDispatcher::new(Handle::current(), false);
        let token = engine.schedule::<usize, String>(
            Box::new(move || Ok(c.fetch_add(1, Ordering::SeqCst) + 1)),
            Duration::from_millis(5),
        );

        assert!(matches!(token.get(&CancellationToken::new()).await, Ok(1)));
        assert!(matches!(token.get(&CancellationToken::new()).await, Ok(1)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    fn idle_runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("runtime")
    }

    #[test]
    fn test_unpolled_job_is_abandoned_on_runtime_drop() {
        let rt = idle_runtime();
        let engine = TokioDispatcher::new(rt.handle().clone(), true);
        let token = engine.schedule::<u32, String>(Box::new(|| Ok(1)), Duration::from_millis(50));
        assert!(!token.is_done());

        drop(rt);
        assert!(token.is_done());
        assert!(token.is_cancelled());
        assert!(matches!(
            futures::executor::block_on(token.get(&CancellationToken::new())),
            Err(DispatchError::Cancelled)
        ));
        assert!(!token.cancel(false));
    }

    #[test]
    fn test_sleeping_job_is_abandoned_on_runtime_drop() {
        let rt = idle_runtime();
        let engine = TokioDispatcher::new(rt.handle().clone(), true);
        let token = engine.schedule::<u32, String>(Box::new(|| Ok(1)), Duration::from_secs(60));
        rt.block_on(async { tokio::time::sleep(Duration::from_millis(10)).await });
        assert!(!token.is_done());

        drop(rt);
        assert!(token.is_cancelled());
        assert_eq!(token.result_now().unwrap_err().message(), "task was cancelled");
    }

    #[test]
    fn test_current_outside_runtime_fails() {
        assert!(matches!(
            TokioDispatcher::current(),
            Err(RuntimeError::NoRuntime)
        ));
    }
}
