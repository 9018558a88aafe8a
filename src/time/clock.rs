use core::sync::atomic::{AtomicI32, Ordering};

use spin::Mutex;

use crate::config::Config;

use super::{Slew, TimeError, Timeval};

/// Timezone as stored by `settimeofday`. The kernel never interprets it.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Timezone {
    /// Minutes west of Greenwich
    pub tz_minuteswest: i32,
    /// Type of daylight saving correction
    pub tz_dsttime: i32,
}

/// Battery backed clock that has to follow the system time after it is set.
pub trait Rtc {
    fn sync(&self, now: Timeval);
}

#[derive(Debug)]
pub(super) struct ClockState {
    pub time: Timeval,
    pub boottime: Timeval,
    pub runtime: Timeval,
    pub tz: Timezone,
    pub slew: Slew,
}

/// The system clock.
///
/// All fields that move together live behind one lock, which is also what the
/// clock interrupt takes in [`Clock::tick`]. The lock is only held to compute
/// and publish, never across a call into a collaborator.
#[derive(Debug)]
pub struct Clock {
    pub(super) state: Mutex<ClockState>,
    securelevel: AtomicI32,
    config: Config,
}

impl Clock {
    pub fn new(config: Config, now: Timeval) -> Clock {
        let now = now.normalized();
        Clock {
            state: Mutex::new(ClockState {
                time: now,
                boottime: now,
                runtime: now,
                tz: Timezone::default(),
                slew: Slew::default(),
            }),
            securelevel: AtomicI32::new(0),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn read_time(&self) -> Timeval {
        self.state.lock().time
    }

    pub fn read_timezone(&self) -> Timezone {
        self.state.lock().tz
    }

    /// Wall time at which the system booted, shifted along with every jump
    pub fn boottime(&self) -> Timeval {
        self.state.lock().boottime
    }

    /// Origin of the current run, shifted along with every jump
    pub fn runtime(&self) -> Timeval {
        self.state.lock().runtime
    }

    /// Time elapsed since boot
    pub fn uptime(&self) -> Timeval {
        let state = self.state.lock();
        state.time - state.boottime
    }

    pub fn securelevel(&self) -> i32 {
        self.securelevel.load(Ordering::SeqCst)
    }

    /// Above zero the clock can only be stepped forward.
    pub fn set_securelevel(&self, level: i32) {
        log::debug!("securelevel {} -> {}", self.securelevel(), level);
        self.securelevel.store(level, Ordering::SeqCst);
    }

    /// Step the clock and/or replace the timezone.
    ///
    /// Changing the time needs privilege; changing only the timezone does not.
    /// Both are checked before either is applied, so a rejected call leaves the
    /// clock untouched. The boot and run origins move by the same amount as the
    /// time, keeping the elapsed time derived from them intact.
    pub fn write_time(
        &self,
        new_time: Option<Timeval>,
        new_tz: Option<Timezone>,
        privileged: bool,
        rtc: &dyn Rtc,
    ) -> Result<(), TimeError> {
        let Some(new_time) = new_time.map(Timeval::normalized) else {
            if let Some(tz) = new_tz {
                self.write_timezone(tz);
            }
            return Ok(());
        };

        if !privileged {
            log::warn!("settimeofday: denied, caller is not privileged");
            return Err(TimeError::PermissionDenied);
        }

        {
            let mut state = self.state.lock();

            // If the system is secure the time may be slowed with adjtime, but
            // never set back.
            if self.securelevel() > 0 && new_time < state.time {
                log::warn!(
                    "settimeofday: denied, {} is before {} at securelevel {}",
                    new_time,
                    state.time,
                    self.securelevel()
                );
                return Err(TimeError::PermissionDenied);
            }

            let delta = new_time - state.time;
            state.time = new_time;
            state.boottime += delta;
            state.runtime += delta;

            if let Some(tz) = new_tz {
                state.tz = tz;
            }

            log::debug!("settimeofday: stepped to {} (delta {})", new_time, delta);
        }

        rtc.sync(new_time);

        Ok(())
    }

    pub fn write_timezone(&self, tz: Timezone) {
        self.state.lock().tz = tz;
    }

    /// Number of clock ticks until `deadline`, at least one.
    pub fn ticks_until(&self, deadline: Timeval) -> i64 {
        let remaining = (deadline - self.read_time()).as_usec();
        if remaining <= 0 {
            return 1;
        }

        let tick = self.config.tick.max(1);
        (remaining.saturating_add(tick - 1) / tick).max(1)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use core::cell::Cell;

    use test_log::test;

    use super::*;

    #[derive(Default)]
    pub struct FakeRtc {
        pub last: Cell<Option<Timeval>>,
    }

    impl Rtc for FakeRtc {
        fn sync(&self, now: Timeval) {
            self.last.set(Some(now));
        }
    }

    fn clock_at(sec: i64, usec: i64) -> Clock {
        Clock::new(Config::default(), Timeval::new(sec, usec))
    }

    #[test]
    fn read_back_after_boot() {
        let clock = clock_at(1_000, 250_000);

        assert_eq!(clock.read_time(), Timeval::new(1_000, 250_000));
        assert_eq!(clock.boottime(), clock.read_time());
        assert_eq!(clock.uptime(), Timeval::ZERO);
        assert_eq!(clock.read_timezone(), Timezone::default());
    }

    #[test]
    fn jump_shifts_origins() {
        // Given
        let clock = clock_at(1_000, 0);
        let rtc = FakeRtc::default();
        clock.tick(10_000);
        let uptime = clock.uptime();
        let since_run = clock.read_time() - clock.runtime();

        // When
        let target = Timeval::new(5_000, 750_000);
        clock.write_time(Some(target), None, true, &rtc).unwrap();

        // Then
        assert_eq!(clock.read_time(), target);
        assert_eq!(clock.uptime(), uptime);
        assert_eq!(clock.read_time() - clock.runtime(), since_run);
        assert_eq!(rtc.last.get(), Some(target));
    }

    #[test]
    fn backward_jump_allowed_when_insecure() {
        let clock = clock_at(1_000, 0);
        let rtc = FakeRtc::default();
        clock.tick(10_000);

        clock
            .write_time(Some(Timeval::new(10, 500_000)), None, true, &rtc)
            .unwrap();

        assert_eq!(clock.read_time(), Timeval::new(10, 500_000));
        assert_eq!(clock.uptime(), Timeval::new(0, 10_000));
        assert_eq!(clock.boottime(), Timeval::new(10, 490_000));
    }

    #[test]
    fn backward_jump_denied_when_secure() {
        // Given
        let clock = clock_at(1_000, 0);
        let rtc = FakeRtc::default();
        clock.set_securelevel(1);
        let tz = Timezone {
            tz_minuteswest: 60,
            tz_dsttime: 1,
        };

        // When
        let res = clock.write_time(Some(Timeval::new(999, 999_999)), Some(tz), true, &rtc);

        // Then
        assert_eq!(res, Err(TimeError::PermissionDenied));
        assert_eq!(clock.read_time(), Timeval::new(1_000, 0));
        assert_eq!(clock.boottime(), Timeval::new(1_000, 0));
        assert_eq!(clock.read_timezone(), Timezone::default());
        assert_eq!(rtc.last.get(), None);
    }

    #[test]
    fn forward_jump_allowed_when_secure() {
        let clock = clock_at(1_000, 0);
        let rtc = FakeRtc::default();
        clock.set_securelevel(2);

        clock
            .write_time(Some(Timeval::new(1_000, 1)), None, true, &rtc)
            .unwrap();

        assert_eq!(clock.read_time(), Timeval::new(1_000, 1));
    }

    #[test]
    fn unprivileged_write_changes_nothing() {
        let clock = clock_at(1_000, 0);
        let rtc = FakeRtc::default();
        let tz = Timezone {
            tz_minuteswest: -120,
            tz_dsttime: 0,
        };

        let res = clock.write_time(Some(Timeval::new(2_000, 0)), Some(tz), false, &rtc);

        assert_eq!(res, Err(TimeError::PermissionDenied));
        assert_eq!(clock.read_time(), Timeval::new(1_000, 0));
        assert_eq!(clock.read_timezone(), Timezone::default());
    }

    #[test]
    fn timezone_alone_needs_no_privilege() {
        let clock = clock_at(1_000, 0);
        let rtc = FakeRtc::default();
        let tz = Timezone {
            tz_minuteswest: 300,
            tz_dsttime: 1,
        };

        clock.write_time(None, Some(tz), false, &rtc).unwrap();

        assert_eq!(clock.read_timezone(), tz);
        assert_eq!(clock.read_time(), Timeval::new(1_000, 0));
        assert_eq!(rtc.last.get(), None);
    }

    #[test]
    fn ticks_until_rounds_up() {
        let clock = clock_at(1_000, 0);

        assert_eq!(clock.ticks_until(Timeval::new(1_000, 0)), 1);
        assert_eq!(clock.ticks_until(Timeval::new(999, 0)), 1);
        assert_eq!(clock.ticks_until(Timeval::new(1_000, 10_000)), 1);
        assert_eq!(clock.ticks_until(Timeval::new(1_000, 10_001)), 2);
        assert_eq!(clock.ticks_until(Timeval::new(1_001, 0)), 100);
    }
}
