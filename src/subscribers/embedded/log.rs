//! # LogWriter: lifecycle events as `tracing` records
//!
//! A minimal subscriber that turns incoming [`Event`]s into `tracing` events under the
//! `timervisor` target. Install any `tracing` subscriber to see them.
//!
//! ## Example output (with `tracing-subscriber`'s fmt layer)
//! ```text
//! DEBUG timervisor: scheduled task=task-1 delay_ms=10
//! DEBUG timervisor: starting task=task-1
//!  INFO timervisor: succeeded task=task-1
//!  WARN timervisor: failed task=task-2 reason="boom"
//!  INFO timervisor: cancelled task=task-3
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.map(|t| t.to_string()).unwrap_or_default();
        let reason = e.reason.as_deref().unwrap_or("unknown");

        match e.kind {
            EventKind::TaskScheduled => {
                tracing::debug!(target: "timervisor", task = %task, delay_ms = ?e.delay_ms, seq = e.seq, "scheduled");
            }
            EventKind::TaskStarting => {
                tracing::debug!(target: "timervisor", task = %task, seq = e.seq, "starting");
            }
            EventKind::TaskSucceeded => {
                tracing::info!(target: "timervisor", task = %task, seq = e.seq, "succeeded");
            }
            EventKind::TaskFailed => {
                tracing::warn!(target: "timervisor", task = %task, reason = %reason, seq = e.seq, "failed");
            }
            EventKind::TaskCancelled => {
                tracing::info!(target: "timervisor", task = %task, seq = e.seq, "cancelled");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: "timervisor", reason = %reason, "subscriber-overflow");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(target: "timervisor", reason = %reason, "subscriber-panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
