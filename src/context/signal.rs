use bitflags::bitflags;

use super::ProcessId;

/// Real timer expired
pub const SIGALRM: usize = 14;
/// Virtual timer expired
pub const SIGVTALRM: usize = 26;
/// Profiling timer expired
pub const SIGPROF: usize = 27;

/// Signals raised by the interval timers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    /// Real timer expired
    Alarm,
    /// Virtual timer expired
    VirtualAlarm,
    /// Profiling timer expired
    Profile,
}

impl Signal {
    pub fn number(self) -> usize {
        match self {
            Signal::Alarm => SIGALRM,
            Signal::VirtualAlarm => SIGVTALRM,
            Signal::Profile => SIGPROF,
        }
    }
}

bitflags! {
    /// Signals posted to a process and not yet picked up, one bit per
    /// signal number like a sigset.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct PendingSignals: u64 {
        const ALARM = 1 << (SIGALRM as u64 - 1);
        const VTALARM = 1 << (SIGVTALRM as u64 - 1);
        const PROF = 1 << (SIGPROF as u64 - 1);
    }
}

impl From<Signal> for PendingSignals {
    fn from(signal: Signal) -> PendingSignals {
        match signal {
            Signal::Alarm => PendingSignals::ALARM,
            Signal::VirtualAlarm => PendingSignals::VTALARM,
            Signal::Profile => PendingSignals::PROF,
        }
    }
}

/// Whatever delivers signals to processes. Posting must not block, it is
/// called from the clock interrupt.
pub trait SignalSink {
    fn send(&self, pid: ProcessId, signal: Signal);
}
