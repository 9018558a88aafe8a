//!
//! This module provides the time syscalls, in the error dialect of the rest
//! of the kernel: `Result<usize>` from `redox_syscall`, with output written
//! through out-parameters.

extern crate syscall;

pub use self::syscall::{error, flag};

pub use self::time::*;

use self::error::{Error, EINVAL, EPERM};
use crate::time::TimeError;

/// Debug
pub mod debug;

/// Time syscalls
pub mod time;

impl From<TimeError> for Error {
    fn from(err: TimeError) -> Error {
        match err {
            TimeError::PermissionDenied => Error::new(EPERM),
            TimeError::InvalidArgument | TimeError::InvalidTimerValue => Error::new(EINVAL),
        }
    }
}
