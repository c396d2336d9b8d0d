//! Logger.
//!
//! A colored, timestamped stdout backend for the `log` facade.

use chrono::{Datelike, Local, Timelike};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct StdoutLogger;

static LOGGER: StdoutLogger = StdoutLogger;

impl StdoutLogger {
  fn color(level: Level) -> &'static str {
    match level {
      Level::Error => "\x1b[1;31m",
      Level::Warn => "\x1b[33m",
      Level::Info => "\x1b[34m",
      Level::Debug | Level::Trace => "\x1b[36m",
    }
  }
}

impl Log for StdoutLogger {
  fn enabled(&self, metadata: &Metadata) -> bool {
    metadata.level() <= log::max_level()
  }

  fn log(&self, record: &Record) {
    if self.enabled(record.metadata()) {
      println!("\x1b[90m{} {}> {}\x1b[0m", now(), Self::color(record.level()), record.args());
    }
  }

  fn flush(&self) {}
}

/// Install the stdout logger, showing records up to `level`.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
  log::set_logger(&LOGGER)?;
  log::set_max_level(level);
  Ok(())
}

pub fn now() -> String {
  let t = Local::now();

  format!("{month:0>2}/{day:0>2}/{year} {hour:0>2}:{min:0>2}:{secs:0>2}:{nsecs:0>9}",
          month = t.month(),
          day = t.day(),
          year = t.year(),
          hour = t.hour(),
          min = t.minute(),
          secs = t.second(),
          nsecs = t.nanosecond())
}
