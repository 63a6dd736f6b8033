//! # Timer: schedules actions after a delay and hands back task handles.
//!
//! The [`Timer`] owns the dispatch engine, the event [`Bus`] and, when subscribers were
//! configured, a listener that forwards bus events to a [`SubscriberSet`].
//!
//! ## High-level flow
//! ```text
//!   run_after(action, delay)
//!        │
//!        ├─ TaskId::next(), Marker(Pending)
//!        ├─ publish TaskScheduled
//!        ├─ supervise(action, marker, bus) ──► job
//!        ├─ dispatcher.schedule(job, delay) ──► token
//!        └─ TaskHandle(id, token, marker)
//!
//!   listener (only with subscribers):
//!     Bus.subscribe() ─► SubscriberSet::emit(&Event)   (fire-and-forget)
//! ```
//!
//! ## Rules
//! - `run_after` never blocks and never runs the action on the calling thread.
//! - Every task gets its own marker; handles never share state with each other.
//! - Dropping the timer does not cancel scheduled tasks; `shutdown` only stops event delivery.

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::builder::TimerBuilder;
use super::config::TimerConfig;
use super::runner::supervise;
use crate::dispatch::{Dispatch, Job, TokioDispatcher};
use crate::error::{RuntimeError, WrappedError};
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::SubscriberSet;
use crate::tasks::{Marker, TaskHandle, TaskId};

/// Delayed one-shot execution facade.
///
/// - Schedules actions through the dispatch engine `D`
/// - Publishes lifecycle events to its [`Bus`]
/// - Fans events out to subscribers configured on the [`TimerBuilder`]
///
/// # Example
/// ```
/// use std::time::Duration;
/// use timervisor::{TaskStatus, Timer};
///
/// #[tokio::main(flavor = "multi_thread")]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let timer = Timer::new()?;
///
///     let slow = timer.run_after(|| Ok::<_, std::io::Error>("late"), Duration::from_secs(3600));
///     assert!(slow.cancel());
///     assert_eq!(slow.status(), TaskStatus::Cancelled);
///
///     let fast = timer.run_after(|| Ok::<_, std::io::Error>("soon"), Duration::ZERO);
///     assert_eq!(fast.wait().await?, "soon");
///
///     timer.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct Timer<D: Dispatch = TokioDispatcher> {
    dispatcher: D,
    bus: Bus,
    listener: Option<Listener>,
}

impl Timer<TokioDispatcher> {
    /// Creates a timer with default configuration on the current tokio runtime.
    ///
    /// ### Errors
    /// [`RuntimeError::NoRuntime`] when called outside a runtime.
    pub fn new() -> Result<Self, RuntimeError> {
        TimerBuilder::new(TimerConfig::default()).build()
    }

    /// Returns a builder for a customized timer.
    pub fn builder(cfg: TimerConfig) -> TimerBuilder {
        TimerBuilder::new(cfg)
    }
}

impl<D: Dispatch> Timer<D> {
    pub(crate) fn new_internal(dispatcher: D, bus: Bus, listener: Option<Listener>) -> Self {
        Self {
            dispatcher,
            bus,
            listener,
        }
    }

    /// Schedules `action` to run once after `delay` and returns its handle.
    ///
    /// Returns immediately. `Duration::ZERO` runs the action as soon as a worker is free.
    /// For `(amount, unit)` pairs use [`TimeUnit::duration`](crate::TimeUnit::duration).
    ///
    /// A unit action is simply one returning `Ok(())`.
    ///
    /// # Example
    /// ```
    /// use timervisor::{TimeUnit, Timer};
    ///
    /// #[tokio::main(flavor = "multi_thread")]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let timer = Timer::new()?;
    ///
    ///     let ping = timer.run_after(
    ///         || Ok::<_, std::io::Error>("pong"),
    ///         TimeUnit::Milliseconds.duration(20),
    ///     );
    ///     let flush = timer.run_after(|| Ok::<(), std::io::Error>(()), TimeUnit::Seconds.duration(0));
    ///
    ///     assert_eq!(ping.wait().await?, "pong");
    ///     flush.wait().await?;
    ///     Ok(())
    /// }
    /// ```
    pub fn run_after<R, E, F>(&self, action: F, delay: Duration) -> TaskHandle<R, E>
    where
        F: FnOnce() -> Result<R, E> + Send + 'static,
        R: Clone + Send + Sync + 'static,
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        let id = TaskId::next();
        let marker = Arc::new(Marker::new());
        let job: Job<R, WrappedError<E>> = Box::new(supervise(
            action,
            Arc::clone(&marker),
            self.bus.clone(),
            id,
        ));

        self.bus.publish(
            Event::new(EventKind::TaskScheduled)
                .with_task(id)
                .with_delay(delay),
        );
        let token = self.dispatcher.schedule(job, delay);
        TaskHandle::new(id, token, marker, self.bus.clone())
    }

    /// Schedules an infallible unit action. See [`run_after`](Self::run_after).
    pub fn execute_after<F>(&self, action: F, delay: Duration) -> TaskHandle<(), Infallible>
    where
        F: FnOnce() + Send + 'static,
    {
        self.run_after(
            move || {
                action();
                Ok::<(), Infallible>(())
            },
            delay,
        )
    }

    /// Returns the timer's event bus.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Subscribes to lifecycle events directly, bypassing the subscriber set.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Stops event delivery and waits for subscribers to process what was already published.
    ///
    /// Scheduled tasks are not affected: they still run and their handles keep working.
    pub async fn shutdown(self) {
        if let Some(listener) = self.listener {
            listener.shutdown().await;
        }
    }
}

impl<D: Dispatch> fmt::Debug for Timer<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("subscribers", &self.listener.is_some())
            .finish_non_exhaustive()
    }
}

/// Forwards bus events to the subscriber set until stopped.
pub(crate) struct Listener {
    stop: CancellationToken,
    task: JoinHandle<()>,
    subs: Arc<SubscriberSet>,
}

impl Listener {
    pub(crate) fn spawn(bus: &Bus, subs: SubscriberSet, runtime: &Handle) -> Self {
        let mut rx = bus.subscribe();
        let subs = Arc::new(subs);
        let set = Arc::clone(&subs);
        let stop = CancellationToken::new();
        let token = stop.clone();

        let task = runtime.spawn(async move {
            loop {
                tokio::select! {
                    ev = rx.recv() => match ev {
                        Ok(ev) => set.emit(&ev),
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "event listener lagged; oldest events dropped");
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = token.cancelled() => {
                        while let Ok(ev) = rx.try_recv() {
                            set.emit(&ev);
                        }
                        break;
                    }
                }
            }
        });

        Self { stop, task, subs }
    }

    async fn shutdown(self) {
        self.stop.cancel();
        let _ = self.task.await;

        match Arc::try_unwrap(self.subs) {
            Ok(set) => set.shutdown().await,
            Err(_) => tracing::warn!("subscriber set still shared; workers left running"),
        }
    }
}
