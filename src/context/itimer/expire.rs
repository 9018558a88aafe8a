use crate::time::{Timeval, USEC_PER_SEC};

use super::ITimerVal;

/// Decrement an interval timer by `usec` microseconds, which must be less
/// than a second. Returns whether the timer expired.
///
/// On expiry a periodic timer is reloaded, and whatever part of `usec` ran
/// past the old value is taken off the new one so the timer does not drift.
/// The caller must hold the lock the timer lives under.
pub fn decrement(itimer: &mut ITimerVal, usec: i64) -> bool {
    debug_assert!((0..USEC_PER_SEC).contains(&usec));

    if !itimer.it_value.is_set() {
        return false;
    }

    let mut usec = usec;
    let value = &mut itimer.it_value;

    if value.tv_usec < usec {
        if value.tv_sec == 0 {
            // Expired, and already in the next interval.
            usec -= value.tv_usec;
            reload(itimer, usec);
            return true;
        }
        value.tv_usec += USEC_PER_SEC;
        value.tv_sec -= 1;
    }

    value.tv_usec -= usec;
    if value.is_set() {
        return false;
    }

    // Expired, exactly at the end of the interval.
    reload(itimer, 0);
    true
}

fn reload(itimer: &mut ITimerVal, overshoot: i64) {
    if !itimer.it_interval.is_set() {
        itimer.it_value.clear();
        return;
    }

    let value = itimer.it_interval - Timeval::from_usec(overshoot);

    // An overshoot of a whole interval would disarm the timer; keep it armed
    // so it fires on the next tick instead.
    itimer.it_value = if value > Timeval::ZERO {
        value
    } else {
        Timeval::new(0, 1)
    };
}

/// Move a real timer past an expiry at `now`.
///
/// A one-shot timer is cleared and `None` returned. A periodic timer's
/// deadline is advanced by whole intervals until it lies after `now`, and the
/// new deadline returned for the callout. A callout that ran late therefore
/// collapses all the periods it missed into the one expiry being handled.
pub fn expire_real(itimer: &mut ITimerVal, now: Timeval) -> Option<Timeval> {
    if !itimer.it_interval.is_set() {
        itimer.it_value.clear();
        return None;
    }

    let mut missed = 0_u64;
    loop {
        itimer.it_value += itimer.it_interval;
        if itimer.it_value > now {
            break;
        }
        missed += 1;
    }

    if missed > 0 {
        log::debug!(
            "itimer: real timer ran late, collapsed {} missed periods, next at {}",
            missed,
            itimer.it_value
        );
    }

    Some(itimer.it_value)
}
