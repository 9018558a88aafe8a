//! Clock constants used when no explicit [`Config`](crate::config::Config) is given.

/// Clock interrupts per second
pub const HZ: u32 = 100;

/// Microseconds in one second
pub const USEC_PER_SEC: i64 = crate::time::USEC_PER_SEC;

/// Corrections larger than this many microseconds are slewed at ten times
/// the base rate
pub const BIGADJ: i64 = 1_000_000;

/// Largest number of seconds accepted in either field of an interval timer
pub const MAX_TIMER_SECS: i64 = 1_100_000_000;
