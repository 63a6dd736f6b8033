//! # Timer configuration.
//!
//! Provides [`TimerConfig`], the settings consumed by [`TimerBuilder`](crate::TimerBuilder).
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1 (a broadcast channel needs at least one slot)

/// Configuration for a [`Timer`](crate::Timer).
///
/// ## Field semantics
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
/// - `blocking_actions`: Where the default engine runs actions
///
/// All fields are public; prefer the helper accessors over sentinel checks.
#[derive(Clone, Debug)]
pub struct TimerConfig {
    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// The timer's listener lagging behind more than `bus_capacity` events skips the oldest
    /// ones. Minimum value is 1 (enforced by Bus).
    pub bus_capacity: usize,

    /// Run actions on tokio's blocking pool.
    ///
    /// - `true` = `spawn_blocking`; actions may block or sleep freely
    /// - `false` = inline on an async worker thread; actions must be short and non-blocking
    ///
    /// Only read by the default engine (`TimerBuilder::build`).
    pub blocking_actions: bool,
}

impl TimerConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for TimerConfig {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024` (good baseline)
    /// - `blocking_actions = true`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            blocking_actions: true,
        }
    }
}
