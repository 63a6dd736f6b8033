//! # Supervisor closure: runs one action and records its progress.
//!
//! [`supervise`] wraps a user action into the job handed to the dispatch engine. The job moves
//! the task's [`Marker`] through `Pending → Running → Success | Failed` and publishes lifecycle
//! events to [`Bus`].
//!
//! ## Event flow
//!
//! ```text
//! Success:
//!   marker=Running → publish TaskStarting → action() → Ok(v)
//!                  → marker=Success → publish TaskSucceeded → Ok(v)
//!
//! Failure:
//!   marker=Running → publish TaskStarting → action() → Err(e)
//!                  → marker=Failed → publish TaskFailed → Err(Wrapped(Error(e)))
//!
//! Panic:
//!   marker=Running → publish TaskStarting → action() panics
//!                  → marker=Failed → publish TaskFailed → Err(Wrapped(Panic(msg)))
//! ```
//!
//! ## Rules
//! - The terminal marker write happens **before** the job returns, so it is visible to anyone
//!   who observed the engine's `is_done`.
//! - Always publishes **exactly one** terminal event: `TaskSucceeded` or `TaskFailed`.
//! - A panic never escapes the job; the engine only ever sees `Ok` or `Err(WrappedError)`.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::error::{TaskFailure, WrappedError, panic_message};
use crate::events::{Bus, Event, EventKind};
use crate::tasks::{Marker, Progress, TaskId};

/// Builds the job that runs `action` under supervision.
pub(crate) fn supervise<R, E, F>(
    action: F,
    marker: Arc<Marker>,
    bus: Bus,
    id: TaskId,
) -> impl FnOnce() -> Result<R, WrappedError<E>> + Send + 'static
where
    F: FnOnce() -> Result<R, E> + Send + 'static,
    R: Send + 'static,
    E: fmt::Display + Send + Sync + 'static,
{
    move || {
        marker.store(Progress::Running);
        bus.publish(Event::new(EventKind::TaskStarting).with_task(id));

        match catch_unwind(AssertUnwindSafe(action)) {
            Ok(Ok(value)) => {
                marker.store(Progress::Success);
                bus.publish(Event::new(EventKind::TaskSucceeded).with_task(id));
                Ok(value)
            }
            Ok(Err(e)) => {
                marker.store(Progress::Failed);
                publish_failed(&bus, id, e.to_string());
                Err(WrappedError::new(TaskFailure::Error(Arc::new(e))))
            }
            Err(payload) => {
                let msg = panic_message(&*payload);
                marker.store(Progress::Failed);
                publish_failed(&bus, id, format!("panicked: {msg}"));
                Err(WrappedError::new(TaskFailure::Panic(Arc::from(msg))))
            }
        }
    }
}

/// Publishes `TaskFailed` with the failure message as reason.
fn publish_failed(bus: &Bus, id: TaskId, reason: String) {
    bus.publish(
        Event::new(EventKind::TaskFailed)
            .with_task(id)
            .with_reason(reason),
    );
}
