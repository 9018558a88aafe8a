//! # Interval timers
//!
//! Every process has three: the real timer counts wall time and is driven by a
//! callout, the virtual and profiling timers count execution time and are
//! decremented by the clock interrupt.
//!
//! The virtual and profiling timers are kept the way they are specified
//! externally, as time left until they expire. The real timer keeps its value
//! as an absolute deadline instead. A callout can fire late when the system is
//! busy, so reloading from the interval would let a periodic real timer drift;
//! with an absolute deadline the next expiry is always computed from where the
//! previous one should have been.

use crate::config::Config;
use crate::time::{TimeError, Timeval, USEC_PER_SEC};

use super::signal::Signal;
use super::timeout::Callout;
use super::ProcessId;

pub use self::expire::{decrement, expire_real};

/// Decrement and reload
mod expire;

pub const ITIMER_REAL: usize = 0;
pub const ITIMER_VIRTUAL: usize = 1;
pub const ITIMER_PROF: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum ITimerKind {
    /// Wall time, raises `SIGALRM`
    Real = ITIMER_REAL,
    /// User mode execution time, raises `SIGVTALRM`
    Virtual = ITIMER_VIRTUAL,
    /// User and kernel mode execution time, raises `SIGPROF`
    Profiling = ITIMER_PROF,
}

impl ITimerKind {
    pub fn signal(self) -> Signal {
        match self {
            ITimerKind::Real => Signal::Alarm,
            ITimerKind::Virtual => Signal::VirtualAlarm,
            ITimerKind::Profiling => Signal::Profile,
        }
    }
}

impl TryFrom<usize> for ITimerKind {
    type Error = TimeError;

    fn try_from(which: usize) -> Result<ITimerKind, TimeError> {
        match which {
            ITIMER_REAL => Ok(ITimerKind::Real),
            ITIMER_VIRTUAL => Ok(ITimerKind::Virtual),
            ITIMER_PROF => Ok(ITimerKind::Profiling),
            _ => Err(TimeError::InvalidArgument),
        }
    }
}

/// One interval timer. A zero `it_interval` makes it one-shot, a zero
/// `it_value` disarms it.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ITimerVal {
    pub it_interval: Timeval,
    pub it_value: Timeval,
}

impl ITimerVal {
    pub const ZERO: ITimerVal = ITimerVal {
        it_interval: Timeval::ZERO,
        it_value: Timeval::ZERO,
    };

    pub const fn new(value: Timeval, interval: Timeval) -> ITimerVal {
        ITimerVal {
            it_interval: interval,
            it_value: value,
        }
    }
}

/// Check that a proposed value for either field of an interval timer is
/// acceptable, and round it up to the clock resolution if it is shorter.
pub fn validate(tv: Timeval, config: &Config) -> Result<Timeval, TimeError> {
    if tv.tv_sec < 0
        || tv.tv_sec > config.max_timer_secs
        || tv.tv_usec < 0
        || tv.tv_usec >= USEC_PER_SEC
    {
        return Err(TimeError::InvalidTimerValue);
    }

    if tv.tv_sec == 0 && tv.tv_usec != 0 && tv.tv_usec < config.tick {
        return Ok(Timeval::new(0, config.tick));
    }

    Ok(tv)
}

/// Validate both fields; nothing is returned unless both pass.
pub fn validate_pair(itv: ITimerVal, config: &Config) -> Result<ITimerVal, TimeError> {
    Ok(ITimerVal {
        it_interval: validate(itv.it_interval, config)?,
        it_value: validate(itv.it_value, config)?,
    })
}

/// The three interval timers of one process.
#[derive(Debug, Default)]
pub struct IntervalTimers {
    real: ITimerVal,
    virt: ITimerVal,
    prof: ITimerVal,
}

impl IntervalTimers {
    pub const fn new() -> IntervalTimers {
        IntervalTimers {
            real: ITimerVal::ZERO,
            virt: ITimerVal::ZERO,
            prof: ITimerVal::ZERO,
        }
    }

    /// Current value as seen from outside. The real timer's deadline is turned
    /// back into the time left until it passes, zero if it already has.
    pub fn get(&self, kind: ITimerKind, now: Timeval) -> ITimerVal {
        match kind {
            ITimerKind::Real => {
                let mut itv = self.real;
                if itv.it_value.is_set() {
                    if itv.it_value < now {
                        itv.it_value.clear();
                    } else {
                        itv.it_value -= now;
                    }
                }
                itv
            }
            ITimerKind::Virtual => self.virt,
            ITimerKind::Profiling => self.prof,
        }
    }

    /// Arm or disarm a timer and return its previous value as [`get`] would.
    ///
    /// Nothing changes, including the callout, unless both fields are valid.
    ///
    /// [`get`]: IntervalTimers::get
    pub fn set(
        &mut self,
        pid: ProcessId,
        kind: ITimerKind,
        new: ITimerVal,
        now: Timeval,
        config: &Config,
        callout: &dyn Callout,
    ) -> Result<ITimerVal, TimeError> {
        let mut new = validate_pair(new, config)?;
        let old = self.get(kind, now);

        match kind {
            ITimerKind::Real => {
                callout.cancel(pid);
                if new.it_value.is_set() {
                    new.it_value += now;
                    callout.schedule(pid, new.it_value);
                    log::debug!("itimer: pid {} real timer due at {}", pid, new.it_value);
                }
                self.real = new;
            }
            ITimerKind::Virtual => self.virt = new,
            ITimerKind::Profiling => self.prof = new,
        }

        Ok(old)
    }

    /// Drop the real timer and its callout, used when the process goes away.
    pub fn cancel_real(&mut self, pid: ProcessId, callout: &dyn Callout) {
        callout.cancel(pid);
        self.real = ITimerVal::ZERO;
    }

    /// Absolute deadline of the real timer, zero when disarmed
    pub fn real_deadline(&self) -> Timeval {
        self.real.it_value
    }

    /// Internal representation of a slot, for the expiry paths.
    pub fn slot_mut(&mut self, kind: ITimerKind) -> &mut ITimerVal {
        match kind {
            ITimerKind::Real => &mut self.real,
            ITimerKind::Virtual => &mut self.virt,
            ITimerKind::Profiling => &mut self.prof,
        }
    }
}
