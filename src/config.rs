use crate::consts::{BIGADJ, HZ, MAX_TIMER_SECS, USEC_PER_SEC};

/// Tunables of the clock and the interval timers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Clock interrupts per second
    pub hz: u32,
    /// Microseconds per clock interrupt; also the timer resolution
    pub tick: i64,
    /// Base slew step, microseconds of skew applied per tick
    pub tickadj: i64,
    /// Above this many microseconds the slew step is `10 * tickadj`
    pub bigadj: i64,
    /// Ceiling for the seconds field of an interval timer
    pub max_timer_secs: i64,
}

impl Config {
    /// Derive the per-tick values from the interrupt rate. A rate of zero is
    /// treated as one interrupt per second.
    pub const fn with_hz(hz: u32) -> Config {
        let hz = if hz == 0 { 1 } else { hz };

        // Can force a change of about 4 ms/s, the same skew the BSDs allow.
        let tickadj = 240_000 / (60 * hz as i64);

        Config {
            hz,
            tick: USEC_PER_SEC / hz as i64,
            tickadj: if tickadj == 0 { 1 } else { tickadj },
            bigadj: BIGADJ,
            max_timer_secs: MAX_TIMER_SECS,
        }
    }
}

impl Default for Config {
    fn default() -> Config {
        Config::with_hz(HZ)
    }
}
