use crate::config::Config;

use super::{Clock, TimeError, Timeval};

/// A clock correction being applied a little at a time.
///
/// `pending` is the magnitude still to apply and always a whole multiple of
/// `step`, so the per-tick application lands exactly on zero. `step` carries
/// the direction: negative slows the clock down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Slew {
    pending: u64,
    step: i64,
}

impl Slew {
    /// Compute the correction and the rate at which to apply it.
    pub fn new(delta_usec: i64, config: &Config) -> Slew {
        let magnitude = delta_usec.unsigned_abs();
        let base = config.tickadj.max(1);
        let step = if magnitude > config.bigadj.unsigned_abs() {
            base.saturating_mul(10)
        } else {
            base
        };

        // Round down to a whole multiple of the step, lest the correction
        // overshoot and start taking us away from the desired final time.
        let pending = magnitude - magnitude % step.unsigned_abs();

        Slew {
            pending,
            step: if delta_usec < 0 { -step } else { step },
        }
    }

    /// Correction still to apply, in signed microseconds.
    pub fn remaining(&self) -> i64 {
        let pending = i64::try_from(self.pending).unwrap_or(i64::MAX);
        if self.step < 0 {
            -pending
        } else {
            pending
        }
    }

    pub fn pending(&self) -> u64 {
        self.pending
    }

    /// Signed skew added to every tick while a correction is pending.
    pub fn step(&self) -> i64 {
        self.step
    }

    /// Consume one tick worth of correction and return the skew to add to it.
    pub fn consume(&mut self) -> i64 {
        if self.pending == 0 {
            return 0;
        }
        self.pending = self.pending.saturating_sub(self.step.unsigned_abs());
        self.step
    }
}

impl Clock {
    /// Start slewing the clock by `delta_usec`, replacing any correction in
    /// progress. Returns the part of the old correction that was not applied
    /// yet.
    pub fn request_adjustment(&self, delta_usec: i64, privileged: bool) -> Result<i64, TimeError> {
        if !privileged {
            log::warn!("adjtime: denied, caller is not privileged");
            return Err(TimeError::PermissionDenied);
        }

        let slew = Slew::new(delta_usec, self.config());

        let old = {
            let mut state = self.state.lock();
            core::mem::replace(&mut state.slew, slew)
        };

        log::debug!(
            "adjtime: slewing {} us at {} us/tick, {} us left unapplied",
            slew.remaining(),
            slew.step(),
            old.remaining()
        );

        Ok(old.remaining())
    }

    /// Unapplied correction, in signed microseconds
    pub fn pending_correction(&self) -> i64 {
        self.state.lock().slew.remaining()
    }

    /// Skew added to each tick while a correction is pending
    pub fn tick_increment(&self) -> i64 {
        self.state.lock().slew.step()
    }

    /// Advance the clock by one interrupt worth of `elapsed_usec`, plus the
    /// slew step if a correction is pending. Returns the new time.
    pub fn tick(&self, elapsed_usec: i64) -> Timeval {
        let mut state = self.state.lock();
        let delta = elapsed_usec + state.slew.consume();
        state.time += Timeval::from_usec(delta);
        state.time
    }
}
