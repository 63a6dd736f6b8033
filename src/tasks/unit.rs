//! # Time units for `(delay, unit)` pairs.
//!
//! The timer takes a [`Duration`]; [`TimeUnit`] converts a count in a conventional unit into
//! one, saturating instead of overflowing.
//!
//! ```rust
//! use std::time::Duration;
//! use timervisor::TimeUnit;
//!
//! assert_eq!(TimeUnit::Milliseconds.duration(10), Duration::from_millis(10));
//! assert_eq!(TimeUnit::Days.duration(1), Duration::from_secs(86_400));
//! ```

use std::time::Duration;

/// Conventional time unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Converts `amount` of this unit into a [`Duration`] (saturating at [`Duration::MAX`]).
    pub fn duration(self, amount: u64) -> Duration {
        match self {
            TimeUnit::Nanoseconds => Duration::from_nanos(amount),
            TimeUnit::Microseconds => Duration::from_micros(amount),
            TimeUnit::Milliseconds => Duration::from_millis(amount),
            TimeUnit::Seconds => Duration::from_secs(amount),
            TimeUnit::Minutes => Self::secs(amount, 60),
            TimeUnit::Hours => Self::secs(amount, 60 * 60),
            TimeUnit::Days => Self::secs(amount, 24 * 60 * 60),
        }
    }

    fn secs(amount: u64, per: u64) -> Duration {
        amount
            .checked_mul(per)
            .map(Duration::from_secs)
            .unwrap_or(Duration::MAX)
    }
}
