//! Lifecycle events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to publish task lifecycle
//! events emitted by the timer, the supervisor closure and task handles.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Timer::run_after` (scheduled), the supervisor closure (starting /
//!   succeeded / failed), `TaskHandle::cancel` (cancelled), `SubscriberSet` workers
//!   (overflow / panic).
//! - **Consumers**: the timer's listener, which fans out to the `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
