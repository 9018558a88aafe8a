use alloc::collections::VecDeque;
use spin::Mutex;

use crate::interrupt::clock::on_real_timer_deadline;
use crate::time::{Clock, Timeval};

use super::signal::SignalSink;
use super::{ProcessId, ProcessList};

/// Schedules the real timer callback of a process. Each process has at most
/// one callback outstanding.
pub trait Callout {
    /// Run the real timer callback of `pid` once `deadline` has passed.
    fn schedule(&self, pid: ProcessId, deadline: Timeval);
    /// Forget the callback of `pid`, if any.
    fn cancel(&self, pid: ProcessId);
}

#[derive(Debug)]
struct Timeout {
    pub pid: ProcessId,
    pub deadline: Timeval,
}

/// Pending real timer callbacks, checked from the clock interrupt.
#[derive(Debug, Default)]
pub struct Registry {
    timeouts: Mutex<VecDeque<Timeout>>,
}

impl Registry {
    pub const fn new() -> Registry {
        Registry {
            timeouts: Mutex::new(VecDeque::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.timeouts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.timeouts.lock().is_empty()
    }

    /// Deadline of the callback scheduled for `pid`
    pub fn deadline(&self, pid: ProcessId) -> Option<Timeval> {
        self.timeouts
            .lock()
            .iter()
            .find(|timeout| timeout.pid == pid)
            .map(|timeout| timeout.deadline)
    }

    /// Remove one callback whose deadline is at or before `now`.
    pub fn pop_expired(&self, now: Timeval) -> Option<(ProcessId, Timeval)> {
        let mut timeouts = self.timeouts.lock();
        let i = timeouts.iter().position(|timeout| timeout.deadline <= now)?;
        timeouts
            .remove(i)
            .map(|timeout| (timeout.pid, timeout.deadline))
    }

    /// Run every callback that is due. Periodic timers are rescheduled by
    /// the callback itself, under the process timer lock.
    ///
    /// The registry lock is dropped before each callback runs, since the
    /// callback takes the process timer lock, which orders before it.
    pub fn trigger(&self, clock: &Clock, processes: &ProcessList, signals: &dyn SignalSink) {
        while let Some((pid, deadline)) = self.pop_expired(clock.read_time()) {
            let Some(process) = processes.get(pid) else {
                log::warn!("timeout: pid {} went away with a real timer pending", pid);
                continue;
            };

            on_real_timer_deadline(clock, &process, deadline, self, signals);
        }
    }
}

impl Callout for Registry {
    fn schedule(&self, pid: ProcessId, deadline: Timeval) {
        let mut timeouts = self.timeouts.lock();
        timeouts.retain(|timeout| timeout.pid != pid);
        timeouts.push_back(Timeout { pid, deadline });
    }

    fn cancel(&self, pid: ProcessId) {
        self.timeouts.lock().retain(|timeout| timeout.pid != pid);
    }
}
