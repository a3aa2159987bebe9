//! Kernel log (`dmesg`).
//!
//! Records from the `log` facade are formatted as
//! `[LEVEL] target: message` and kept in a bounded ring; the oldest line is
//! dropped once the ring is full.

use alloc::collections::VecDeque;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use common::sync::SpinLock;
use log::{LevelFilter, Log, Metadata, Record};

/// Lines kept in the ring.
pub const DMESG_CAPACITY: usize = 256;

static DMESG: SpinLock<VecDeque<String>> = SpinLock::new(VecDeque::new());

pub struct KernelLogger;

impl Log for KernelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!("[{}] {}: {}", record.level(), record.target(), record.args());
        let mut ring = DMESG.lock();
        if ring.len() == DMESG_CAPACITY {
            ring.pop_front();
        }
        ring.push_back(line);
    }

    fn flush(&self) {}
}

/// Install the kernel logger. Later calls only adjust the level.
pub fn init(level: LevelFilter) {
    static LOGGER: KernelLogger = KernelLogger;
    // Err means a logger is already installed
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}

/// Snapshot of the ring, oldest line first.
pub fn dmesg() -> Vec<String> {
    DMESG.lock().iter().cloned().collect()
}

pub fn clear() {
    DMESG.lock().clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_land_in_a_bounded_ring() {
        init(LevelFilter::Debug);
        init(LevelFilter::Debug);
        for i in 0..DMESG_CAPACITY + 8 {
            log::debug!(target: "logger_ring", "line {}", i);
        }
        log::info!(target: "logger_test", "hello {}", 42);

        let lines = dmesg();
        assert!(lines.len() <= DMESG_CAPACITY);
        assert!(!lines.iter().any(|l| l == "[DEBUG] logger_ring: line 0"));
        assert!(lines.iter().any(|l| l == "[INFO] logger_test: hello 42"));

        clear();
        assert!(!dmesg().iter().any(|l| l == "[INFO] logger_test: hello 42"));
    }
}
