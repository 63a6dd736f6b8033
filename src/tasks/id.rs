use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for task ids.
static TASK_SEQ: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a scheduled task.
///
/// Ids are assigned in scheduling order and appear in events and log lines as `task-<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    pub(crate) fn next() -> Self {
        Self(TASK_SEQ.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric id.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}
