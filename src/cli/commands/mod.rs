//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Calls into validate/build/store to execute
//! 3. Formats and displays output
//!
//! Handlers do NOT walk or mutate storage directly.

mod create;
mod init_root;
mod show;
mod update;
mod validate;

// Re-export command functions for testing and direct invocation
pub use create::create;
pub use init_root::init_root;
pub use show::show;
pub use update::update;
pub use validate::validate;

use std::path::Path;

use anyhow::{Context as _, Result};
use walkdir::WalkDir;

use crate::build::SourceFile;
use crate::cli::args::Command;
use crate::cli::Context;

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Validate {
            path,
            warnings,
            lax_digests,
            no_digests,
            codes,
        } => validate(ctx, &path, warnings, lax_digests, no_digests, codes.as_deref()),
        Command::Create {
            id,
            src,
            objdir,
            digest,
            fixity,
            message,
            name,
            address,
            padding,
            skip,
        } => create(
            ctx, &id, &src, &objdir, &digest, &fixity, message, name, address, padding, &skip,
        ),
        Command::Update {
            objdir,
            src,
            message,
            name,
            address,
            skip,
        } => update(ctx, &objdir, &src, message, name, address, &skip),
        Command::Show { objdir, version } => show(ctx, &objdir, version.as_deref()),
        Command::InitRoot { root, layout } => init_root(ctx, &root, &layout),
    }
}

/// Collect a source tree as (logical path, file) pairs.
///
/// Logical paths are the forward-slash relative paths under `src`. Names
/// in `skip` are ignored wherever they appear.
pub(crate) fn collect_sources(src: &Path, skip: &[String]) -> Result<Vec<SourceFile>> {
    let mut sources = Vec::new();
    for entry in WalkDir::new(src) {
        let entry = entry.with_context(|| format!("Failed to read {}", src.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if skip.iter().any(|s| s == name.as_ref()) {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(src)
            .expect("walkdir yields paths under its root");
        let logical = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        sources.push(SourceFile::new(logical, entry.path()));
    }
    sources.sort_by(|a, b| a.logical_path.cmp(&b.logical_path));
    Ok(sources)
}
