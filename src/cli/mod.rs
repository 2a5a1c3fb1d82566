//! cli
//!
//! Command-line interface layer.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Delegate to command handlers
//! - Does NOT walk or mutate storage directly
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! the [`crate::validate`], [`crate::build`], and [`crate::store`] modules,
//! which do the real work.

pub mod args;
pub mod commands;

pub use args::Cli;

use anyhow::Result;

use crate::ui::Verbosity;

/// Execution context shared by all command handlers.
#[derive(Debug, Clone, Copy)]
pub struct Context {
    pub verbosity: Verbosity,
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let ctx = Context {
        verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
    };
    commands::dispatch(cli.command, &ctx)
}
