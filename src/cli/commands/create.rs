//! create command - build a new OCFL object from a source tree

use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context as _, Result};

use crate::build::{ObjectBuilder, VersionMetadata};
use crate::cli::Context;
use crate::core::digest::DigestAlgorithm;
use crate::ui::output;

use super::collect_sources;

/// Create a new object at `objdir` with the tree under `src` as v1.
#[allow(clippy::too_many_arguments)]
pub fn create(
    ctx: &Context,
    id: &str,
    src: &Path,
    objdir: &Path,
    digest: &str,
    fixity: &[String],
    message: Option<String>,
    name: Option<String>,
    address: Option<String>,
    padding: usize,
    skip: &[String],
) -> Result<()> {
    let algorithm = DigestAlgorithm::from_str(digest)
        .with_context(|| format!("Unknown digest algorithm '{digest}'"))?;
    let fixity: Vec<DigestAlgorithm> = fixity
        .iter()
        .map(|alg| {
            DigestAlgorithm::from_str(alg)
                .with_context(|| format!("Unknown fixity algorithm '{alg}'"))
        })
        .collect::<Result<_>>()?;

    let sources = collect_sources(src, skip)?;
    if sources.is_empty() {
        bail!("No source files found under {}", src.display());
    }
    output::debug(
        format!("collected {} source files from {}", sources.len(), src.display()),
        ctx.verbosity,
    );

    let mut metadata = VersionMetadata::new();
    if let Some(message) = message {
        metadata = metadata.message(message);
    }
    if let Some(name) = name {
        metadata = metadata.user(name, address);
    }

    let inventory = ObjectBuilder::new()
        .digest_algorithm(algorithm)
        .padding(padding)
        .fixity(fixity)
        .create(id, &sources, metadata, objdir)
        .with_context(|| format!("Failed to create object at {}", objdir.display()))?;

    output::print(
        format!(
            "Created object {} at {} ({} files)",
            inventory.id,
            objdir.display(),
            sources.len()
        ),
        ctx.verbosity,
    );
    Ok(())
}
