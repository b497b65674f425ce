//! A small [`log`] backend which writes diagnostics to standard error.
//!
//! The level is read from the `BUDDY_LOG` environment variable (`off`, `error`,
//! `warn`, `info`, `debug` or `trace`) and defaults to `warn`.

use log::{LevelFilter, Log, Metadata, Record};
use std::str::FromStr;

use crate::color::{self, MaybePaint};

pub(crate) const LOG_ENV_VAR: &'static str = "BUDDY_LOG";

struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        // Dependencies (reqwest, hyper, ...) are only shown at trace level
        metadata.level() <= self.level
            && (self.level == LevelFilter::Trace || metadata.target().starts_with("buddy"))
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let label = format!("{}:", record.level().as_str().to_lowercase());

        eprintln!(
            "{} [{}] {}",
            color::DEBUG_INDICATOR.maybe_paint(label),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {}
}

fn level_from_env() -> LevelFilter {
    match std::env::var(LOG_ENV_VAR) {
        Ok(level) => match LevelFilter::from_str(level.trim()) {
            Ok(level) => level,
            Err(_) => {
                crate::warn!(
                    "unrecognized {} level \"{}\", using \"warn\"",
                    LOG_ENV_VAR,
                    level
                );
                LevelFilter::Warn
            }
        },
        Err(_) => LevelFilter::Warn,
    }
}

/// Installs the logger. Calling this more than once has no effect.
pub(crate) fn init() {
    let level = level_from_env();

    if log::set_boxed_logger(Box::new(StderrLogger { level })).is_ok() {
        log::set_max_level(level);
    }
}
