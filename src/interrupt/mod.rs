//! # Interrupt handling
//!
//! Entry points called from the clock interrupt and from the callout that
//! runs expired real timers. Neither blocks; every lock they take is held
//! only for the update it guards.

/// Clock interrupt and real timer callbacks
pub mod clock;
