//! Kernel-style logger over a caller-provided console sink, plus the [debug_ex] macro.

use core::fmt::Arguments;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, set_logger, set_max_level};
use spin::Once;

/// Writes one formatted line to the console.
pub type LogSink = fn(Arguments<'_>);

pub struct Logger {
    sink: Once<LogSink>,
}

impl Log for Logger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        self.sink.is_completed()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let color = match record.level() {
            Level::Error => 31, // Red
            Level::Warn => 93,  // BrightYellow
            Level::Info => 20,  // White
            Level::Debug => 32, // Green
            Level::Trace => 90, // BrightBlack
        };
        if let Some(sink) = self.sink.get() {
            sink(format_args!(
                "\u{1B}[{}m[{:}] {}\u{1B}[0m",
                color,
                record.level(),
                record.args(),
            ));
        }
    }

    fn flush(&self) {}
}

static LOGGER: Logger = Logger { sink: Once::new() };

/// Install the logger. Only the first call takes effect; later calls report the
/// error from [log::set_logger] and keep the first sink.
pub fn init(sink: LogSink, level: LevelFilter) -> Result<(), SetLoggerError> {
    LOGGER.sink.call_once(|| sink);
    set_logger(&LOGGER)?;
    set_max_level(level);
    Ok(())
}

/// Improved debug macro,
/// only compiled in debug mode.
#[macro_export]
macro_rules! debug_ex {
    // debug_ex!(target: "my_target", "a {} event", "log")
    (target: $target:expr, $($arg:tt)+) => {
        #[cfg(debug_assertions)]
        {
            use log::{log, Level};
            log!(target: $target, Level::Debug, $($arg)+)
        }
    };

    // debug_ex!("a {} event", "log")
    ($($arg:tt)+) => {
        #[cfg(debug_assertions)]
        {
            use log::{log, Level};
            log!(Level::Debug, $($arg)+)
        }
    }
}
