//! # Task-side types.
//!
//! This module provides what a caller holds after scheduling:
//! - [`TaskHandle`] - cancel, wait for and inspect one scheduled task
//! - [`TaskStatus`] - lifecycle status derived by the handle
//! - [`TaskId`] - process-unique task identifier
//! - [`TimeUnit`] - delay unit for `(amount, unit)` scheduling

mod handle;
mod id;
mod status;
mod unit;

pub use handle::TaskHandle;
pub use id::TaskId;
pub use status::TaskStatus;
pub use unit::TimeUnit;

pub(crate) use status::{Marker, Progress};
