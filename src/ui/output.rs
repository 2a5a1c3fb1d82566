//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Output is formatted consistently and respects the quiet flag. Validation
//! findings are rendered as sorted `[CODE] message` lines so runs are
//! diffable; the pass/fail summary always prints, even under `--quiet`.

use std::fmt::Display;

use crate::codes::{CodeCatalog, ValidationOutcome};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a debug message (only in debug mode).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Print the findings of one validation outcome.
pub fn print_outcome(
    label: &str,
    outcome: &ValidationOutcome,
    catalog: &CodeCatalog,
    show_warnings: bool,
    verbosity: Verbosity,
) {
    for line in outcome.render(catalog, show_warnings) {
        print(&line, verbosity);
    }
    if outcome.is_incomplete() {
        warn(format!("{label}: validation was cancelled before completing"), verbosity);
    }
}

/// One-line pass/fail summary. Always printed.
pub fn print_summary(label: &str, errors: usize, warnings: usize) {
    if errors == 0 {
        println!("{label}: VALID ({warnings} warnings)");
    } else {
        println!("{label}: INVALID ({errors} errors, {warnings} warnings)");
    }
}
