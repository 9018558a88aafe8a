//! # Processes
//!
//! Just enough of a process for the time subsystem: an identity, a privilege
//! bit, the interval timers, and a set of pending signals the timers post to.

use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use spin::RwLock;
use spinning_top::{guard::SpinlockGuard, Spinlock};

use crate::time::{Clock, TimeError};

pub use self::itimer::{ITimerKind, ITimerVal, IntervalTimers};
pub use self::signal::{PendingSignals, Signal, SignalSink};
pub use self::timeout::{Callout, Registry};

/// Interval timers
pub mod itimer;

/// Signals raised by the timers
pub mod signal;

/// Real timer callouts
pub mod timeout;

int_like!(ProcessId, usize);

#[derive(Debug)]
pub struct Process {
    /// The process ID of this process
    pub pid: ProcessId,
    /// The effective user id
    pub euid: u32,
    itimers: Spinlock<IntervalTimers>,
    pending: AtomicU64,
}

impl Process {
    pub fn new(pid: ProcessId, euid: u32) -> Process {
        Process {
            pid,
            euid,
            itimers: Spinlock::new(IntervalTimers::new()),
            pending: AtomicU64::new(0),
        }
    }

    /// Whether the process may set the clock
    pub fn is_privileged(&self) -> bool {
        self.euid == 0
    }

    /// Lock the interval timers. Taken before the clock lock when both are
    /// needed.
    pub fn itimers(&self) -> SpinlockGuard<'_, IntervalTimers> {
        self.itimers.lock()
    }

    pub fn get_itimer(&self, kind: ITimerKind, clock: &Clock) -> ITimerVal {
        let itimers = self.itimers();
        itimers.get(kind, clock.read_time())
    }

    pub fn set_itimer(
        &self,
        kind: ITimerKind,
        new: ITimerVal,
        clock: &Clock,
        callout: &dyn Callout,
    ) -> Result<ITimerVal, TimeError> {
        let mut itimers = self.itimers();
        let now = clock.read_time();
        itimers.set(self.pid, kind, new, now, clock.config(), callout)
    }

    /// Post a signal; posting one that is already pending has no effect.
    pub fn signal(&self, signal: Signal) {
        self.pending
            .fetch_or(PendingSignals::from(signal).bits(), Ordering::SeqCst);
    }

    pub fn pending_signals(&self) -> PendingSignals {
        PendingSignals::from_bits_truncate(self.pending.load(Ordering::SeqCst))
    }

    /// Take every pending signal, leaving none.
    pub fn take_pending_signals(&self) -> PendingSignals {
        PendingSignals::from_bits_truncate(self.pending.swap(0, Ordering::SeqCst))
    }
}

/// Live processes, by ID
#[derive(Debug)]
pub struct ProcessList {
    map: RwLock<BTreeMap<ProcessId, Arc<Process>>>,
    next_id: AtomicUsize,
}

impl ProcessList {
    pub const fn new() -> ProcessList {
        ProcessList {
            map: RwLock::new(BTreeMap::new()),
            next_id: AtomicUsize::new(1),
        }
    }

    /// Create a process with disarmed timers.
    pub fn spawn(&self, euid: u32) -> Arc<Process> {
        let pid = ProcessId::from(self.next_id.fetch_add(1, Ordering::SeqCst));
        let process = Arc::new(Process::new(pid, euid));
        self.map.write().insert(pid, Arc::clone(&process));
        process
    }

    pub fn get(&self, pid: ProcessId) -> Option<Arc<Process>> {
        self.map.read().get(&pid).cloned()
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }

    /// Call `f` on every live process while holding the list for reading.
    pub fn for_each(&self, mut f: impl FnMut(&Arc<Process>)) {
        for process in self.map.read().values() {
            f(process);
        }
    }

    /// Tear a process down. Its real timer callout is cancelled first so it
    /// cannot fire for a process that no longer exists.
    pub fn remove(&self, pid: ProcessId, callout: &dyn Callout) -> Option<Arc<Process>> {
        let process = self.map.write().remove(&pid)?;
        process.itimers().cancel_real(pid, callout);
        Some(process)
    }
}

impl Default for ProcessList {
    fn default() -> ProcessList {
        ProcessList::new()
    }
}

impl SignalSink for ProcessList {
    fn send(&self, pid: ProcessId, signal: Signal) {
        match self.get(pid) {
            Some(process) => process.signal(signal),
            None => log::debug!("signal {:?} for missing pid {}", signal, pid),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use test_log::test;

    use super::*;
    use crate::config::Config;
    use crate::time::Timeval;

    #[test]
    fn spawn_assigns_increasing_ids() {
        let processes = ProcessList::new();

        let a = processes.spawn(0);
        let b = processes.spawn(1000);

        assert!(a.pid < b.pid);
        assert!(a.is_privileged());
        assert!(!b.is_privileged());
        assert_eq!(processes.len(), 2);

        let mut pids = Vec::new();
        processes.for_each(|process| pids.push(process.pid));
        assert_eq!(pids, [a.pid, b.pid]);
    }

    #[test]
    fn new_process_has_disarmed_timers() {
        let processes = ProcessList::new();
        let clock = Clock::new(Config::default(), Timeval::new(50, 0));
        let process = processes.spawn(0);

        for kind in [ITimerKind::Real, ITimerKind::Virtual, ITimerKind::Profiling] {
            assert_eq!(process.get_itimer(kind, &clock), ITimerVal::ZERO);
        }
    }

    #[test]
    fn signals_accumulate_until_taken() {
        let processes = ProcessList::new();
        let process = processes.spawn(0);

        processes.send(process.pid, Signal::Alarm);
        processes.send(process.pid, Signal::Alarm);
        processes.send(process.pid, Signal::Profile);

        assert_eq!(
            process.take_pending_signals(),
            PendingSignals::ALARM | PendingSignals::PROF
        );
        assert!(process.pending_signals().is_empty());
    }

    #[test]
    fn remove_cancels_real_timer() {
        // Given
        let processes = ProcessList::new();
        let registry = Registry::new();
        let clock = Clock::new(Config::default(), Timeval::new(50, 0));
        let process = processes.spawn(1000);
        let itv = ITimerVal::new(Timeval::new(10, 0), Timeval::new(10, 0));
        process
            .set_itimer(ITimerKind::Real, itv, &clock, &registry)
            .unwrap();
        assert_eq!(registry.deadline(process.pid), Some(Timeval::new(60, 0)));

        // When
        let removed = processes.remove(process.pid, &registry);

        // Then
        assert!(removed.is_some());
        assert!(registry.is_empty());
        assert!(processes.get(process.pid).is_none());
        assert_eq!(process.itimers().real_deadline(), Timeval::ZERO);
    }
}
