//! show command - print an object's inventory in human-readable form

use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context as _, Result};

use crate::cli::Context;
use crate::core::inventory::Inventory;
use crate::core::object_paths::ObjectPaths;
use crate::core::versions::VersionNum;
use crate::ui::output;

/// Show an object's history, or the file listing of one version.
pub fn show(ctx: &Context, objdir: &Path, version: Option<&str>) -> Result<()> {
    let inventory_path = ObjectPaths::new(objdir).inventory();
    let bytes = fs::read(&inventory_path)
        .with_context(|| format!("Failed to read {}", inventory_path.display()))?;
    let inventory = Inventory::parse(&bytes)
        .with_context(|| format!("Failed to parse {}", inventory_path.display()))?;

    match version {
        Some(name) => show_version(ctx, &inventory, name),
        None => {
            show_history(ctx, &inventory);
            Ok(())
        }
    }
}

fn show_history(ctx: &Context, inventory: &Inventory) {
    output::print(format!("id: {}", inventory.id), ctx.verbosity);
    output::print(
        format!("digest algorithm: {}", inventory.digest_algorithm),
        ctx.verbosity,
    );
    output::print(format!("head: {}", inventory.head), ctx.verbosity);
    output::print(
        format!("manifest entries: {}", inventory.manifest.len()),
        ctx.verbosity,
    );
    for (version, entry) in &inventory.versions {
        let message = entry.message.as_deref().unwrap_or("(no message)");
        let user = entry
            .user
            .as_ref()
            .map(|u| u.name.as_str())
            .unwrap_or("(no user)");
        output::print(
            format!(
                "{version}  {}  {user}  {message}  [{} files]",
                entry.created.to_rfc3339(),
                entry.logical_paths().count()
            ),
            ctx.verbosity,
        );
    }
}

fn show_version(ctx: &Context, inventory: &Inventory, name: &str) -> Result<()> {
    let version =
        VersionNum::from_str(name).with_context(|| format!("Invalid version name '{name}'"))?;
    let Some(entry) = inventory.versions.get(&version) else {
        bail!("Object {} has no version {version}", inventory.id);
    };
    let mut paths: Vec<(&str, &str)> = entry.logical_paths().collect();
    paths.sort_unstable();
    for (path, digest) in paths {
        let stored = inventory
            .content_paths_for(digest)
            .and_then(|p| p.first().map(String::as_str))
            .unwrap_or("(no stored copy)");
        output::print(format!("{path}  {stored}"), ctx.verbosity);
    }
    Ok(())
}
