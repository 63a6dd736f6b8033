//! Timer core: scheduling facade and its construction.
//!
//! This module contains the embedded implementation of the timer. The public API from this
//! module is [`Timer`], [`TimerBuilder`] and [`TimerConfig`].
//!
//! Internal modules:
//! - [`runner`]: the supervisor closure that runs one action and records its progress;
//! - [`timer`]: the facade, plus the listener forwarding events to subscribers;
//! - [`builder`]: resolves the runtime and wires bus, subscribers and engine;
//! - [`config`]: plain configuration struct.

mod builder;
mod config;
mod runner;
mod timer;

pub use builder::TimerBuilder;
pub use config::TimerConfig;
pub use timer::Timer;
