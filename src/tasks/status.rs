//! # Task lifecycle status and the supervisor's progress marker.
//!
//! [`TaskStatus`] is the public view of a task. It is never stored anywhere; a handle derives it
//! on demand from two independent sources:
//!
//! - the dispatch token (`is_done` / `is_cancelled`), owned by the engine;
//! - the [`Marker`], written by the supervisor closure on the executor thread.
//!
//! ```text
//! Pending ──► Running ──► Success
//!    │            └─────► Failed
//!    └─► Cancelled
//! ```
//!
//! The marker never holds `Cancelled`: cancellation is only observed through the token.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Public lifecycle status of a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// Scheduled, the action has not started.
    Pending,
    /// The action is executing (or has just returned and the engine has not published it yet).
    Running,
    /// The action returned a value.
    Success,
    /// The action returned an error or panicked.
    Failed,
    /// The task was cancelled before it started.
    Cancelled,
}

impl TaskStatus {
    /// Returns `true` for `Success`, `Failed` and `Cancelled`.
    ///
    /// # Example
    /// ```
    /// use timervisor::TaskStatus;
    ///
    /// assert!(TaskStatus::Cancelled.is_terminal());
    /// assert!(!TaskStatus::Running.is_terminal());
    /// ```
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Success | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Success => "success",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Returns `true` if `next` may be observed after `self`.
    ///
    /// Staying in place is always allowed; terminal statuses allow nothing else.
    pub fn can_advance_to(self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        self == next
            || matches!(
                (self, next),
                (Pending, Running | Success | Failed | Cancelled) | (Running, Success | Failed)
            )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Progress of the supervisor closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum Progress {
    Pending = 0,
    Running = 1,
    Success = 2,
    Failed = 3,
}

impl Progress {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Progress::Pending,
            1 => Progress::Running,
            2 => Progress::Success,
            _ => Progress::Failed,
        }
    }
}

impl From<Progress> for TaskStatus {
    fn from(p: Progress) -> Self {
        match p {
            Progress::Pending => TaskStatus::Pending,
            Progress::Running => TaskStatus::Running,
            Progress::Success => TaskStatus::Success,
            Progress::Failed => TaskStatus::Failed,
        }
    }
}

/// Atomic progress cell: single writer (the executor thread), many readers.
#[derive(Debug)]
pub(crate) struct Marker {
    progress: AtomicU8,
}

impl Marker {
    pub(crate) fn new() -> Self {
        Self {
            progress: AtomicU8::new(Progress::Pending as u8),
        }
    }

    #[inline]
    pub(crate) fn store(&self, p: Progress) {
        self.progress.store(p as u8, Ordering::Release);
    }

    #[inline]
    pub(crate) fn load(&self) -> Progress {
        Progress::from_u8(self.progress.load(Ordering::Acquire))
    }
}

impl Default for Marker {
    fn default() -> Self {
        Self::new()
    }
}
