//! Report formatting for the drivers.
//!
//! Driver reports go to the `chemist-output` log target rather than to standard output, so that
//! an application can route them separately from the `debug` progress lines of the algorithms.

use std::fmt;

use itertools::Itertools;

#[cfg(test)]
#[path = "format_tests.rs"]
mod format_tests;

/// Inner width of section banners.
const BANNER_WIDTH: usize = 97;

/// Logs a warning line of a driver report.
macro_rules! chemist_warn {
    ($fmt:expr $(, $($arg:tt)*)?) => { log::warn!(target: "chemist-output", $fmt, $($($arg)*)?) }
}

/// Logs a line of a driver report.
macro_rules! chemist_output {
    ($fmt:expr $(, $($arg:tt)*)?) => { log::info!(target: "chemist-output", $fmt, $($($arg)*)?) }
}

pub(crate) use {chemist_output, chemist_warn};

/// Returns the three lines of a boxed section banner around `title`.
fn banner(title: &str) -> [String; 3] {
    let width = title.chars().count().max(BANNER_WIDTH);
    let bar = "─".repeat(width);
    [
        format!("┌──{bar}──┐"),
        format!("│§ {title:^width$} §│"),
        format!("└──{bar}──┘"),
    ]
}

/// Returns `text` underlined by a double rule of the same width.
fn underlined(text: &str) -> String {
    format!("{text}\n{}", "═".repeat(text.chars().count()))
}

/// Logs the banner opening a driver report.
pub(crate) fn log_title(title: &str) {
    banner(title)
        .iter()
        .for_each(|line| chemist_output!("{line}"));
}

/// Writes an underlined heading inside a report.
pub(crate) fn write_subtitle(f: &mut fmt::Formatter<'_>, subtitle: &str) -> fmt::Result {
    writeln!(f, "{}", underlined(subtitle))
}

/// Logs an underlined heading of a driver report.
pub(crate) fn log_subtitle(subtitle: &str) {
    underlined(subtitle)
        .lines()
        .for_each(|line| chemist_output!("{line}"));
}

pub(crate) fn nice_bool(b: bool) -> String {
    let word = if b { "yes" } else { "no" };
    word.to_string()
}

/// Formats offsets as `(a, b, ...)`.
pub(crate) fn paren_list(offsets: &[usize]) -> String {
    format!("({})", offsets.iter().join(", "))
}

/// Logging of report sections, one log record per line of their [`fmt::Display`] output.
pub(crate) trait ChemistOutput: fmt::Display {
    fn log_output_display(&self) {
        self.to_string()
            .lines()
            .for_each(|line| chemist_output!("{line}"));
    }
}

impl<T: fmt::Display + ?Sized> ChemistOutput for T {}
