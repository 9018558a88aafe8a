use crate::context::{Callout, ITimerKind, ITimerVal, Process};
use crate::syscall::debug::debug_end;
use crate::syscall::error::Result;
use crate::time::{Clock, Rtc, TimeError, Timeval, Timezone, USEC_PER_SEC};

pub fn get_time(clock: &Clock) -> (Timeval, Timezone) {
    (clock.read_time(), clock.read_timezone())
}

/// Set the time, the timezone, or both. Only the time needs privilege.
pub fn set_time(
    clock: &Clock,
    process: &Process,
    new_time: Option<Timeval>,
    new_tz: Option<Timezone>,
    rtc: &dyn Rtc,
) -> core::result::Result<(), TimeError> {
    clock.write_time(new_time, new_tz, process.is_privileged(), rtc)
}

/// Slew the clock by `delta_usec` and return the correction that was still
/// pending.
pub fn adjust_time(
    clock: &Clock,
    process: &Process,
    delta_usec: i64,
) -> core::result::Result<i64, TimeError> {
    clock.request_adjustment(delta_usec, process.is_privileged())
}

pub fn get_interval_timer(
    clock: &Clock,
    process: &Process,
    which: usize,
) -> core::result::Result<ITimerVal, TimeError> {
    let kind = ITimerKind::try_from(which)?;
    Ok(process.get_itimer(kind, clock))
}

/// Arm or disarm an interval timer, returning the previous value.
pub fn set_interval_timer(
    clock: &Clock,
    process: &Process,
    which: usize,
    new: ITimerVal,
    callout: &dyn Callout,
) -> core::result::Result<ITimerVal, TimeError> {
    let kind = ITimerKind::try_from(which)?;
    process.set_itimer(kind, new, clock, callout)
}

pub fn gettimeofday(
    clock: &Clock,
    tv: Option<&mut Timeval>,
    tz: Option<&mut Timezone>,
) -> Result<usize> {
    let (now, zone) = get_time(clock);
    if let Some(tv) = tv {
        *tv = now;
    }
    if let Some(tz) = tz {
        *tz = zone;
    }
    Ok(0)
}

pub fn settimeofday(
    clock: &Clock,
    process: &Process,
    tv: Option<&Timeval>,
    tz: Option<&Timezone>,
    rtc: &dyn Rtc,
) -> Result<usize> {
    let result = set_time(clock, process, tv.copied(), tz.copied(), rtc)
        .map(|()| 0)
        .map_err(Into::into);
    debug_end(
        "settimeofday",
        format_args!("{:?}, {:?}", tv, tz),
        result,
    )
}

/// `olddelta` receives the unapplied correction split the way C division
/// splits it, so both fields carry the sign.
pub fn adjtime(
    clock: &Clock,
    process: &Process,
    delta: &Timeval,
    olddelta: Option<&mut Timeval>,
) -> Result<usize> {
    let result = adjust_time(clock, process, delta.as_usec()).map_err(Into::into);
    let result = result.map(|old| {
        if let Some(olddelta) = olddelta {
            *olddelta = Timeval {
                tv_sec: old / USEC_PER_SEC,
                tv_usec: old % USEC_PER_SEC,
            };
        }
        0
    });
    debug_end("adjtime", format_args!("{}", delta), result)
}

pub fn getitimer(clock: &Clock, process: &Process, which: usize, value: &mut ITimerVal) -> Result<usize> {
    let result = get_interval_timer(clock, process, which)
        .map(|itv| {
            *value = itv;
            0
        })
        .map_err(Into::into);
    debug_end("getitimer", format_args!("{}", which), result)
}

/// Without a new value this only reports the current one.
pub fn setitimer(
    clock: &Clock,
    process: &Process,
    which: usize,
    new: Option<&ITimerVal>,
    old: Option<&mut ITimerVal>,
    callout: &dyn Callout,
) -> Result<usize> {
    let result = match new {
        Some(new) => set_interval_timer(clock, process, which, *new, callout),
        None => get_interval_timer(clock, process, which),
    };
    let result = result
        .map(|prev| {
            if let Some(old) = old {
                *old = prev;
            }
            0
        })
        .map_err(Into::into);
    debug_end("setitimer", format_args!("{}, {:?}", which, new), result)
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::config::Config;
    use crate::context::itimer::tests::RecordingCallout;
    use crate::context::ProcessList;
    use crate::syscall::error::{Error, EINVAL, EPERM};
    use crate::time::tests::FakeRtc;

    fn clock() -> Clock {
        Clock::new(Config::default(), Timeval::new(5_000, 0))
    }

    #[test]
    fn gettimeofday_fills_what_is_asked_for() {
        let clock = clock();
        let mut tv = Timeval::ZERO;

        assert_eq!(gettimeofday(&clock, Some(&mut tv), None), Ok(0));
        assert_eq!(tv, Timeval::new(5_000, 0));
    }

    #[test]
    fn settimeofday_needs_privilege_for_time_only() {
        let clock = clock();
        let processes = ProcessList::new();
        let user = processes.spawn(1000);
        let rtc = FakeRtc::default();
        let tz = Timezone {
            tz_minuteswest: -60,
            tz_dsttime: 0,
        };

        assert_eq!(
            settimeofday(&clock, &user, Some(&Timeval::new(1, 0)), Some(&tz), &rtc),
            Err(Error::new(EPERM))
        );
        assert_eq!(clock.read_timezone(), Timezone::default());

        assert_eq!(settimeofday(&clock, &user, None, Some(&tz), &rtc), Ok(0));
        assert_eq!(clock.read_timezone(), tz);
        assert_eq!(rtc.last.get(), None);
    }

    #[test]
    fn adjtime_reports_old_delta_truncated() {
        // Given
        let clock = clock();
        let processes = ProcessList::new();
        let root = processes.spawn(0);
        let delta = Timeval {
            tv_sec: -1,
            tv_usec: -500_000,
        };
        adjtime(&clock, &root, &delta, None).unwrap();

        // When
        let mut olddelta = Timeval::ZERO;
        let res = adjtime(&clock, &root, &Timeval::ZERO, Some(&mut olddelta));

        // Then
        assert_eq!(res, Ok(0));
        assert_eq!(
            olddelta,
            Timeval {
                tv_sec: -1,
                tv_usec: -500_000
            }
        );
        assert_eq!(clock.pending_correction(), 0);
    }

    #[test]
    fn adjtime_denied_for_user() {
        let clock = clock();
        let processes = ProcessList::new();
        let user = processes.spawn(1000);
        let mut olddelta = Timeval::new(9, 9);

        assert_eq!(
            adjtime(&clock, &user, &Timeval::new(0, 4_000), Some(&mut olddelta)),
            Err(Error::new(EPERM))
        );
        assert_eq!(olddelta, Timeval::new(9, 9));
    }

    #[test]
    fn itimer_which_is_checked() {
        let clock = clock();
        let processes = ProcessList::new();
        let user = processes.spawn(1000);
        let callout = RecordingCallout::default();
        let mut out = ITimerVal::ZERO;

        assert_eq!(getitimer(&clock, &user, 7, &mut out), Err(Error::new(EINVAL)));
        assert_eq!(
            setitimer(&clock, &user, 7, Some(&ITimerVal::ZERO), None, &callout),
            Err(Error::new(EINVAL))
        );
        assert!(callout.ops.lock().is_empty());
    }

    #[test]
    fn setitimer_without_new_value_only_reports() {
        // Given
        let clock = clock();
        let processes = ProcessList::new();
        let user = processes.spawn(1000);
        let callout = RecordingCallout::default();
        let itv = ITimerVal::new(Timeval::new(2, 0), Timeval::new(1, 0));
        setitimer(&clock, &user, 0, Some(&itv), None, &callout).unwrap();
        let ops = callout.ops.lock().len();

        // When
        let mut old = ITimerVal::ZERO;
        let res = setitimer(&clock, &user, 0, None, Some(&mut old), &callout);

        // Then
        assert_eq!(res, Ok(0));
        assert_eq!(old, itv);
        assert_eq!(callout.ops.lock().len(), ops);
    }

    #[test]
    fn setitimer_rejects_bad_value_and_keeps_old() {
        let clock = clock();
        let processes = ProcessList::new();
        let user = processes.spawn(1000);
        let callout = RecordingCallout::default();
        let itv = ITimerVal::new(Timeval::new(0, 500_000), Timeval::ZERO);
        setitimer(&clock, &user, 1, Some(&itv), None, &callout).unwrap();

        let bad = ITimerVal::new(Timeval::new(-1, 0), Timeval::ZERO);
        let mut old = ITimerVal::ZERO;
        assert_eq!(
            setitimer(&clock, &user, 1, Some(&bad), Some(&mut old), &callout),
            Err(Error::new(EINVAL))
        );
        assert_eq!(old, ITimerVal::ZERO);

        let mut out = ITimerVal::ZERO;
        getitimer(&clock, &user, 1, &mut out).unwrap();
        assert_eq!(out, itv);
    }
}
