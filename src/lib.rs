//! # Kernel time
//!
//! The time of day and per-process interval timer subsystem of the kernel:
//! the system clock with its boot and run origins, `adjtime` slewing, and the
//! real, virtual and profiling interval timers together with the clock
//! interrupt and callout paths that expire them.
//!
//! Nothing here is a global. The kernel owns one [`time::Clock`], one
//! [`context::ProcessList`] and one [`context::Registry`] for its whole uptime
//! and passes them to the syscalls and to the interrupt handlers.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[macro_use]
/// Shared data structures
pub mod common;

/// Tunables of the clock and the interval timers
pub mod config;

/// Default clock constants
pub mod consts;

/// Processes, their interval timers and the real timer callouts
pub mod context;

/// Clock interrupt and callout entry points
pub mod interrupt;

/// In-memory kernel log
pub mod log;

/// Syscall handlers
pub mod syscall;

/// Time
pub mod time;
