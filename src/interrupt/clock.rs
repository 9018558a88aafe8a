use crate::context::itimer::{decrement, expire_real};
use crate::context::{Callout, ITimerKind, Process, SignalSink};
use crate::time::{Clock, Timeval};

/// What a CPU was doing when the clock interrupt arrived.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CpuMode {
    User,
    Kernel,
}

/// Called once per clock interrupt with the time that passed since the last
/// one, which must be under a second.
///
/// Advances the wall clock, applying one step of any pending slew, then
/// charges the tick to each process that was running and the mode it was
/// running in. Returns the new wall time.
pub fn on_periodic_tick<'a>(
    clock: &Clock,
    elapsed_usec: i64,
    running: impl IntoIterator<Item = (&'a Process, CpuMode)>,
    signals: &dyn SignalSink,
) -> Timeval {
    let now = clock.tick(elapsed_usec);

    for (process, mode) in running {
        charge_tick(process, mode, elapsed_usec, signals);
    }

    now
}

/// Charge one tick of execution time to a process. The virtual timer only
/// counts user mode, the profiling timer counts both.
pub fn charge_tick(process: &Process, mode: CpuMode, elapsed_usec: i64, signals: &dyn SignalSink) {
    let (vt_fired, prof_fired) = {
        let mut itimers = process.itimers();
        let vt_fired = mode == CpuMode::User
            && decrement(itimers.slot_mut(ITimerKind::Virtual), elapsed_usec);
        let prof_fired = decrement(itimers.slot_mut(ITimerKind::Profiling), elapsed_usec);
        (vt_fired, prof_fired)
    };

    if vt_fired {
        log::trace!("itimer: pid {} virtual timer expired", process.pid);
        signals.send(process.pid, ITimerKind::Virtual.signal());
    }
    if prof_fired {
        log::trace!("itimer: pid {} profiling timer expired", process.pid);
        signals.send(process.pid, ITimerKind::Profiling.signal());
    }
}

/// Called by the callout once the real timer deadline of `process` has
/// passed. `deadline` is the one the callout was scheduled for; if the timer
/// has been rearmed or disarmed since, nothing happens and `None` is
/// returned.
///
/// Otherwise the process is signalled exactly once, however late this runs.
/// A periodic timer is moved past the current time and its callout
/// scheduled again before the timer lock is dropped, so a concurrent
/// `setitimer` either precedes the whole expiry or replaces its result.
/// Returns the next deadline of a periodic timer.
pub fn on_real_timer_deadline(
    clock: &Clock,
    process: &Process,
    deadline: Timeval,
    callout: &dyn Callout,
    signals: &dyn SignalSink,
) -> Option<Timeval> {
    let next = {
        let mut itimers = process.itimers();
        if itimers.real_deadline() != deadline {
            log::trace!("itimer: pid {} stale real timer callout for {}", process.pid, deadline);
            return None;
        }

        let now = clock.read_time();
        let next = expire_real(itimers.slot_mut(ITimerKind::Real), now);
        if let Some(next) = next {
            callout.schedule(process.pid, next);
        }
        next
    };

    // Delivery may take the process list, which orders before the timers.
    signals.send(process.pid, ITimerKind::Real.signal());

    match next {
        Some(deadline) => log::trace!("itimer: pid {} real timer next due at {}", process.pid, deadline),
        None => log::trace!("itimer: pid {} real timer disarmed", process.pid),
    }

    next
}
