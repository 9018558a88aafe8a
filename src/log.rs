use alloc::collections::VecDeque;
use core::fmt::{self, Write};

use spin::Mutex;

/// Kernel log, readable after the fact by whoever drains it.
pub static LOG: Mutex<Option<Log>> = Mutex::new(None);

pub fn init() {
    *LOG.lock() = Some(Log::new(1024 * 1024));
}

pub struct Log {
    data: VecDeque<u8>,
    size: usize,
}

impl Log {
    pub fn new(size: usize) -> Log {
        Log {
            data: VecDeque::with_capacity(size),
            size,
        }
    }

    pub fn read(&self) -> (&[u8], &[u8]) {
        self.data.as_slices()
    }

    /// Append, dropping the oldest bytes once full.
    pub fn write(&mut self, buf: &[u8]) {
        for &b in buf {
            while self.data.len() + 1 >= self.size {
                self.data.pop_front();
            }
            self.data.push_back(b);
        }
    }
}

impl Write for Log {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write(s.as_bytes());
        Ok(())
    }
}

struct TimeLogger;

impl ::log::Log for TimeLogger {
    fn enabled(&self, metadata: &::log::Metadata<'_>) -> bool {
        metadata.level() <= ::log::max_level()
    }

    fn log(&self, record: &::log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Some(ref mut log) = *LOG.lock() {
            // Nowhere to report a failure to log.
            let _ = writeln!(
                log,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}

static LOGGER: TimeLogger = TimeLogger;

/// Route the `log` macros into [`LOG`]. Only the first call has any effect.
pub fn init_logger(level: ::log::LevelFilter) {
    init();
    if ::log::set_logger(&LOGGER).is_ok() {
        ::log::set_max_level(level);
        ::log::info!("Logger initialized.");
    }
}
