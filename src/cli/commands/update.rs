//! update command - add a new version to an existing object

use std::path::Path;

use anyhow::{bail, Context as _, Result};

use crate::build::{ObjectBuilder, VersionMetadata};
use crate::cli::Context;
use crate::ui::output;

use super::collect_sources;

/// Add a new version whose state is exactly the tree under `src`.
///
/// Unchanged files are recognized by digest and never stored twice; only
/// genuinely new content lands in the version's content directory.
pub fn update(
    ctx: &Context,
    objdir: &Path,
    src: &Path,
    message: Option<String>,
    name: Option<String>,
    address: Option<String>,
    skip: &[String],
) -> Result<()> {
    let sources = collect_sources(src, skip)?;
    if sources.is_empty() {
        bail!("No source files found under {}", src.display());
    }

    let mut metadata = VersionMetadata::new();
    if let Some(message) = message {
        metadata = metadata.message(message);
    }
    if let Some(name) = name {
        metadata = metadata.user(name, address);
    }

    let inventory = ObjectBuilder::new()
        .add_version(objdir, &sources, metadata)
        .with_context(|| format!("Failed to update object at {}", objdir.display()))?;

    output::print(
        format!(
            "Updated object {} to {} ({} files in state)",
            inventory.id,
            inventory.head,
            sources.len()
        ),
        ctx.verbosity,
    );
    Ok(())
}
