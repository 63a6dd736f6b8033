//! # timervisor
//!
//! **Timervisor** is a small delayed-execution library for Rust.
//!
//! A caller submits a one-shot action together with a delay and receives a [`TaskHandle`].
//! The handle can cancel the task before it starts, await its completion, and report a
//! race-free lifecycle [`TaskStatus`] or the outcome without blocking.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   run_after(action, delay)
//!            │
//!            ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Timer (facade)                                                   │
//! │  - wraps action in a supervisor closure (marker + events)         │
//! │  - Dispatch engine (TokioDispatcher by default)                   │
//! │  - Bus (broadcast events)                                         │
//! └──────┬───────────────────────────────────────────────┬────────────┘
//!        │ schedule(job, delay)                          │
//!        ▼                                               │
//!  ┌──────────────┐    job runs after delay              │
//!  │ DispatchToken│◄──── marker: Pending → Running ──┐   │
//!  │ (done/cancel)│           → Success | Failed     │   │
//!  └──────┬───────┘                                  │   │
//!         │              ┌──────────────┐            │   │
//!         └─────────────►│  TaskHandle  │◄───────────┘   │
//!                        │ status/wait  │   (marker)     │
//!                        └──────────────┘                │
//!                                                        ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │                 (capacity: TimerConfig::bus_capacity)             │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │    timer listener      │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                            (per-sub queues)
//!                         ┌─────────┼─────────┐
//!                         ▼         ▼         ▼
//!                      worker1   worker2   workerN
//! ```
//!
//! ### Lifecycle
//! ```text
//! run_after ──► publish TaskScheduled ──► engine sleeps(delay)
//!
//!   ├─ cancel() wins the race    ──► token Cancelled, action never runs
//!   │                                publish TaskCancelled
//!   │
//!   └─ engine begins the job     ──► cancel() returns false from now on
//!          ├─► marker = Running, publish TaskStarting
//!          ├─► action()
//!          │     ├─ Ok(v)  ──► marker = Success, publish TaskSucceeded
//!          │     ├─ Err(e) ──► marker = Failed,  publish TaskFailed
//!          │     └─ panic  ──► marker = Failed,  publish TaskFailed
//!          └─► engine records outcome, token done, waiters woken
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                        |
//! |-------------------|---------------------------------------------------------------|-------------------------------------------|
//! | **Scheduling**    | Run an action once after a delay.                             | [`Timer`], [`TimeUnit`]                   |
//! | **Handles**       | Cancel, await and inspect one task.                           | [`TaskHandle`], [`TaskStatus`]            |
//! | **Dispatch**      | Plug in another delayed-execution engine.                     | [`Dispatch`], [`DispatchToken`]           |
//! | **Subscriber API**| Hook into task lifecycle events.                              | [`Subscribe`], [`Event`]                  |
//! | **Errors**        | Typed errors for waiting, wrong-phase queries and failures.   | [`WaitError`], [`TaskStateError`]         |
//! | **Configuration** | Centralize timer settings.                                    | [`TimerConfig`], [`TimerBuilder`]         |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] that renders events through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use timervisor::{TaskStatus, Timer, TimerConfig, WaitError};
//!
//! #[tokio::main(flavor = "multi_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn timervisor::Subscribe>> = vec![Arc::new(timervisor::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn timervisor::Subscribe>> = Vec::new();
//!
//!     let timer = Timer::builder(TimerConfig::default())
//!         .with_subscribers(subs)
//!         .build()?;
//!
//!     let ok = timer.run_after(|| Ok::<_, std::io::Error>(42), Duration::from_millis(10));
//!     assert_eq!(ok.wait().await?, 42);
//!
//!     let failing = timer.run_after(
//!         || Err::<u32, _>(std::io::Error::other("boom")),
//!         Duration::from_millis(10),
//!     );
//!     match failing.wait().await {
//!         Err(WaitError::Failed(e)) => assert_eq!(e.to_string(), "boom"),
//!         other => panic!("unexpected: {other:?}"),
//!     }
//!     assert_eq!(failing.status(), TaskStatus::Failed);
//!
//!     timer.shutdown().await;
//!     Ok(())
//! }
//! ```
mod core;
mod dispatch;
mod error;
mod events;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use core::{Timer, TimerBuilder, TimerConfig};
pub use dispatch::{Dispatch, DispatchToken, Job, TokioDispatcher};
pub use error::{DispatchError, RuntimeError, TaskFailure, TaskStateError, WaitError, WrappedError};
pub use events::{Bus, Event, EventKind};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{TaskHandle, TaskId, TaskStatus, TimeUnit};

// Optional: expose a simple built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
