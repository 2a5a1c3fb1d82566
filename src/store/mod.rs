//! store
//!
//! Storage root concerns: layout policies that map object ids to paths,
//! and root initialization.
//!
//! # Architecture
//!
//! A storage root is a directory carrying the `0=ocfl_1.0` namaste file
//! and, optionally, an `ocfl_layout.json` descriptor naming the layout
//! policy. The policy itself is a pure function from object id to
//! root-relative path; discovery of existing objects never depends on it,
//! so a root with a wrong or missing descriptor is still enumerable.

pub mod layout;

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

use crate::core::object_paths::ROOT_DECLARATION;
use layout::{StorageLayout, LAYOUT_FILENAME};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage root {path} already exists and is not empty")]
    RootNotEmpty { path: String },

    #[error("cannot write storage root {path}: {source}")]
    Io { path: String, source: io::Error },

    #[error("cannot serialize layout descriptor: {0}")]
    Layout(#[from] serde_json::Error),
}

/// Initialize a new storage root at `path`.
///
/// Creates the directory if needed, writes the root declaration and, when
/// a layout is given, the `ocfl_layout.json` descriptor. Refuses to touch
/// a non-empty directory.
pub fn init_root(path: &Path, layout: Option<&StorageLayout>) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.display().to_string(),
        source,
    };

    if path.exists() {
        let mut entries = fs::read_dir(path).map_err(io_err)?;
        if entries.next().is_some() {
            return Err(StoreError::RootNotEmpty {
                path: path.display().to_string(),
            });
        }
    } else {
        fs::create_dir_all(path).map_err(io_err)?;
    }

    let decl_body = format!("{}\n", &ROOT_DECLARATION["0=".len()..]);
    fs::write(path.join(ROOT_DECLARATION), decl_body).map_err(io_err)?;

    if let Some(layout) = layout {
        let mut bytes = serde_json::to_vec_pretty(layout)?;
        bytes.push(b'\n');
        fs::write(path.join(LAYOUT_FILENAME), bytes).map_err(io_err)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_writes_declaration_and_descriptor() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("root");
        init_root(&root, Some(&StorageLayout::default())).unwrap();

        let decl = fs::read_to_string(root.join("0=ocfl_1.0")).unwrap();
        assert_eq!(decl, "ocfl_1.0\n");
        assert!(root.join(LAYOUT_FILENAME).is_file());
    }

    #[test]
    fn init_without_layout_omits_descriptor() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("root");
        init_root(&root, None).unwrap();
        assert!(!root.join(LAYOUT_FILENAME).exists());
    }

    #[test]
    fn init_refuses_non_empty_directory() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("file"), b"x").unwrap();
        assert!(matches!(
            init_root(tmp.path(), None),
            Err(StoreError::RootNotEmpty { .. })
        ));
    }
}
