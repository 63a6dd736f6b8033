//! Delayed-dispatch engine contract and its default tokio implementation.
//!
//! The timer never sleeps or spawns by itself. It hands a supervisor closure to a [`Dispatch`]
//! engine together with a delay and keeps the returned [`DispatchToken`], a cancellable
//! future-like view on the job.
//!
//! ## Contents
//! - [`Dispatch`], [`DispatchToken`], [`Job`] the engine contract
//! - [`TokioDispatcher`] default engine over a tokio runtime
//!
//! ## Token contract
//! ```text
//! schedule(job, delay) ──► token
//!
//! token.cancel(false)   true iff the job had not started; the job then never runs
//! token.is_done()       monotone; true after the job exited or was cancelled
//! token.is_cancelled()  monotone; true only after a successful cancel
//! token.get(interrupt)  waits for done, or returns Interrupted when `interrupt` fires first
//! token.result_now()    non-blocking snapshot, TaskStateError when unavailable
//! token.exception_now() non-blocking snapshot, TaskStateError when unavailable
//! ```
//!
//! `is_done` becoming true happens-after every write the job made before returning.

mod token;
mod tokio_dispatcher;

pub use token::{Dispatch, DispatchToken, Job};
pub use tokio_dispatcher::TokioDispatcher;
