use core::fmt;

use super::error::Result;

/// Trace a finished syscall with its arguments and result.
#[cfg(feature = "syscall_debug")]
pub fn debug_end(name: &str, args: fmt::Arguments<'_>, result: Result<usize>) -> Result<usize> {
    match &result {
        Ok(ret) => log::trace!("{}({}) = Ok({})", name, args, ret),
        Err(err) => log::trace!("{}({}) = Err({:?})", name, args, err),
    }
    result
}

#[cfg(not(feature = "syscall_debug"))]
#[inline(always)]
pub fn debug_end(_name: &str, _args: fmt::Arguments<'_>, result: Result<usize>) -> Result<usize> {
    result
}
