//! User-facing diagnostics: `warning:` and `error:` lines on standard error.

use crate::color::{self, MaybePaint};
use std::fmt;

pub const DEFAULT_EXIT_CODE: i32 = 1;

pub(crate) fn fmt_error<S: AsRef<str>>(f: &mut fmt::Formatter<'_>, text: S) -> fmt::Result {
    write!(
        f,
        "{} {}",
        color::ERROR_INDICATOR.maybe_paint("error:"),
        color::ERROR_TEXT.maybe_paint(text.as_ref())
    )
}

pub(crate) fn fmt_warn<S: AsRef<str>>(f: &mut fmt::Formatter<'_>, text: S) -> fmt::Result {
    write!(
        f,
        "{} {}",
        color::WARNING_INDICATOR.maybe_paint("warning:"),
        color::WARNING_TEXT.maybe_paint(text.as_ref())
    )
}

struct Diagnostic<'t> {
    error: bool,
    text: &'t str,
}

impl fmt::Display for Diagnostic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error {
            true => fmt_error(f, self.text),
            false => fmt_warn(f, self.text),
        }
    }
}

pub(crate) fn error_internal(text: &str) {
    eprintln!("{}", Diagnostic { error: true, text });
}

pub(crate) fn warn_internal(text: &str) {
    eprintln!("{}", Diagnostic { error: false, text });
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => ({
        let formatted = format!($($arg)*);
        $crate::utils::errors::warn_internal(&formatted);
    })
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => ({
        let formatted = format!($($arg)*);
        $crate::utils::errors::error_internal(&formatted);
    })
}

#[macro_export]
macro_rules! die {
    ($($arg:tt)*) => ({
        let formatted = format!($($arg)*);
        $crate::utils::errors::error_internal(&formatted);
        ::std::process::exit($crate::utils::errors::DEFAULT_EXIT_CODE);
    })
}
