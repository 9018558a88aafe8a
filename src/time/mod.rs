//! # Time of day
//!
//! The system clock, its origins and the slew (`adjtime`) machinery. Everything
//! here hangs off one [`Clock`] that the kernel owns for its whole uptime and
//! hands out by reference.

use core::fmt;

pub use self::adjust::Slew;
pub use self::clock::{Clock, Rtc, Timezone};
pub use self::timeval::{Timeval, USEC_PER_SEC};

#[cfg(test)]
pub(crate) use self::clock::tests;

/// Gradual clock correction
mod adjust;

/// Wall time, boot and run origins, timezone
mod clock;

/// Seconds and microseconds arithmetic
mod timeval;

/// Failures of the time and interval timer operations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeError {
    /// The caller may not change the clock, or the change would move the
    /// clock backwards while the system is secure
    PermissionDenied,
    /// Unknown interval timer
    InvalidArgument,
    /// Interval timer value or interval out of range
    InvalidTimerValue,
}

impl fmt::Display for TimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeError::PermissionDenied => "operation not permitted",
            TimeError::InvalidArgument => "unknown interval timer",
            TimeError::InvalidTimerValue => "interval timer value out of range",
        })
    }
}
