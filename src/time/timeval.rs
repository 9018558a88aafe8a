use core::fmt;
use core::ops::{Add, AddAssign, Sub, SubAssign};

pub const USEC_PER_SEC: i64 = 1_000_000;

/// A time quantity split into seconds and microseconds.
///
/// Every value handed out by this type is normalized: `tv_usec` lies in
/// `[0, USEC_PER_SEC)`. Because of that the derived ordering, which compares
/// seconds first and microseconds second, is the numeric ordering.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timeval {
    pub tv_sec: i64,
    pub tv_usec: i64,
}

impl Timeval {
    pub const ZERO: Timeval = Timeval { tv_sec: 0, tv_usec: 0 };

    /// Build a normalized value from arbitrary components.
    pub const fn new(tv_sec: i64, tv_usec: i64) -> Timeval {
        Timeval { tv_sec, tv_usec }.normalized()
    }

    /// Split a signed microsecond count. Truncates toward zero for the
    /// seconds part before normalizing, so `-1` becomes `(-1, 999_999)`.
    pub const fn from_usec(usec: i64) -> Timeval {
        Timeval::new(usec / USEC_PER_SEC, usec % USEC_PER_SEC)
    }

    /// Total microseconds, saturating at the `i64` limits.
    pub const fn as_usec(self) -> i64 {
        self.tv_sec
            .saturating_mul(USEC_PER_SEC)
            .saturating_add(self.tv_usec)
    }

    /// Carry or borrow whole seconds until `tv_usec` is in range. Seconds
    /// wrap at the `i64` limit.
    pub const fn normalized(self) -> Timeval {
        Timeval {
            tv_sec: self.tv_sec.wrapping_add(self.tv_usec.div_euclid(USEC_PER_SEC)),
            tv_usec: self.tv_usec.rem_euclid(USEC_PER_SEC),
        }
    }

    pub const fn is_zero(self) -> bool {
        self.tv_sec == 0 && self.tv_usec == 0
    }

    /// Whether the value is armed, i.e. nonzero.
    pub const fn is_set(self) -> bool {
        !self.is_zero()
    }

    pub fn clear(&mut self) {
        *self = Timeval::ZERO;
    }
}

impl Add for Timeval {
    type Output = Timeval;

    fn add(self, rhs: Timeval) -> Timeval {
        Timeval {
            tv_sec: self.tv_sec.wrapping_add(rhs.tv_sec),
            tv_usec: self.tv_usec + rhs.tv_usec,
        }
        .normalized()
    }
}

impl AddAssign for Timeval {
    fn add_assign(&mut self, rhs: Timeval) {
        *self = *self + rhs;
    }
}

/// Only meaningful when `self >= rhs`; otherwise the result is still
/// normalized but carries negative seconds.
impl Sub for Timeval {
    type Output = Timeval;

    fn sub(self, rhs: Timeval) -> Timeval {
        Timeval {
            tv_sec: self.tv_sec.wrapping_sub(rhs.tv_sec),
            tv_usec: self.tv_usec - rhs.tv_usec,
        }
        .normalized()
    }
}

impl SubAssign for Timeval {
    fn sub_assign(&mut self, rhs: Timeval) {
        *self = *self - rhs;
    }
}

impl fmt::Display for Timeval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.tv_sec, self.tv_usec)
    }
}
