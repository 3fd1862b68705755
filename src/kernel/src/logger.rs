//! `log` facade backend.
//!
//! Records are formatted as one line, `[LEVEL] target: message`, and handed
//! to a sink function. The x86_64 sink is the serialized serial console, so
//! log lines from different cores never interleave.

use core::fmt;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use spin::Once;

/// Receives one complete, newline-terminated log line.
pub type LogSink = fn(fmt::Arguments<'_>);

/// The kernel's `log` implementation.
pub struct KernelLogger {
    sink: Once<LogSink>,
}

static LOGGER: KernelLogger = KernelLogger::new();

impl KernelLogger {
    const fn new() -> Self {
        Self { sink: Once::new() }
    }
}

impl Log for KernelLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Some(sink) = self.sink.get() {
            sink(format_args!(
                "[{:>5}] {}: {}\n",
                record.level(),
                record.target(),
                record.args()
            ));
        }
    }

    fn flush(&self) {}
}

/// Install the kernel logger with `sink` as its output.
///
/// Fails if a logger is already installed.
pub fn init(sink: LogSink, level: LevelFilter) -> Result<(), SetLoggerError> {
    LOGGER.sink.call_once(|| sink);
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::String;
    use std::sync::Mutex;

    static CAPTURED: Mutex<String> = Mutex::new(String::new());

    fn capture(args: fmt::Arguments<'_>) {
        use fmt::Write;
        let _ = CAPTURED.lock().unwrap().write_fmt(args);
    }

    #[test]
    fn test_init_routes_records_to_sink() {
        init(capture, LevelFilter::Trace).expect("first install succeeds");
        assert!(init(capture, LevelFilter::Trace).is_err());

        log::info!(target: "tandem::test", "barrier released epoch {}", 3);
        let captured = CAPTURED.lock().unwrap().clone();
        assert!(captured.contains("[ INFO] tandem::test: barrier released epoch 3\n"));
    }
}
