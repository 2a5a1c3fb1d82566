//! init-root command - create a new storage root

use std::path::Path;

use anyhow::{bail, Context as _, Result};

use crate::cli::Context;
use crate::store::layout::StorageLayout;
use crate::store::init_root as store_init_root;
use crate::ui::output;

/// Initialize a storage root with the chosen layout policy.
pub fn init_root(ctx: &Context, root: &Path, layout: &str) -> Result<()> {
    let layout = match layout {
        "direct" => Some(StorageLayout::Direct),
        "hashed-n-tuple" => Some(StorageLayout::default()),
        "none" => None,
        other => bail!("Unknown layout '{other}'; expected direct, hashed-n-tuple, or none"),
    };

    store_init_root(root, layout.as_ref())
        .with_context(|| format!("Failed to initialize storage root at {}", root.display()))?;

    output::print(
        format!("Initialized storage root at {}", root.display()),
        ctx.verbosity,
    );
    Ok(())
}
