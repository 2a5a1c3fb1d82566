//! core::object_paths
//!
//! Centralized path routing inside an OCFL object directory.
//!
//! # Architecture
//!
//! Every file an object contains has one well-known location: the namaste
//! declaration, the root inventory and its sidecar, and per-version
//! directories each holding a content directory and optionally a copy of
//! the inventory. The well-known joins live here so callers do not
//! concatenate object paths ad hoc.

use std::path::{Path, PathBuf};

use super::digest::DigestAlgorithm;
use super::inventory::INVENTORY_FILENAME;
use super::versions::VersionNum;

/// Namaste declaration file for an OCFL 1.0 object.
pub const OBJECT_DECLARATION: &str = "0=ocfl_object_1.0";

/// Prefix shared by object declarations of any spec version.
pub const OBJECT_DECLARATION_PREFIX: &str = "0=ocfl_object_";

/// Namaste declaration file for an OCFL 1.0 storage root.
pub const ROOT_DECLARATION: &str = "0=ocfl_1.0";

/// Prefix shared by storage root declarations of any spec version.
pub const ROOT_DECLARATION_PREFIX: &str = "0=ocfl_";

/// Path routing for one object directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectPaths {
    root: PathBuf,
}

impl ObjectPaths {
    /// Create path routing rooted at an object directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The object root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/0=ocfl_object_1.0`
    pub fn declaration(&self) -> PathBuf {
        self.root.join(OBJECT_DECLARATION)
    }

    /// `<root>/inventory.json`
    pub fn inventory(&self) -> PathBuf {
        self.root.join(INVENTORY_FILENAME)
    }

    /// `<root>/inventory.json.<alg>`
    pub fn sidecar(&self, alg: DigestAlgorithm) -> PathBuf {
        self.root.join(format!("{}.{}", INVENTORY_FILENAME, alg))
    }

    /// `<root>/v<N>`
    pub fn version_dir(&self, version: VersionNum) -> PathBuf {
        self.root.join(version.to_string())
    }

    /// `<root>/v<N>/inventory.json`
    pub fn version_inventory(&self, version: VersionNum) -> PathBuf {
        self.version_dir(version).join(INVENTORY_FILENAME)
    }

    /// Resolve an inventory-relative content path (`v1/content/a.txt`).
    pub fn content_path(&self, content_path: &str) -> PathBuf {
        self.root.join(content_path)
    }
}

/// Whether a file name is an object namaste declaration.
pub fn is_object_declaration(name: &str) -> bool {
    name.starts_with(OBJECT_DECLARATION_PREFIX)
}

/// Whether a file name is a storage root namaste declaration.
pub fn is_root_declaration(name: &str) -> bool {
    name.starts_with(ROOT_DECLARATION_PREFIX) && !is_object_declaration(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing() {
        let paths = ObjectPaths::new("/data/obj1");
        assert_eq!(
            paths.declaration(),
            PathBuf::from("/data/obj1/0=ocfl_object_1.0")
        );
        assert_eq!(paths.inventory(), PathBuf::from("/data/obj1/inventory.json"));
        assert_eq!(
            paths.sidecar(DigestAlgorithm::Sha512),
            PathBuf::from("/data/obj1/inventory.json.sha512")
        );
        assert_eq!(
            paths.version_dir(VersionNum::new(3)),
            PathBuf::from("/data/obj1/v3")
        );
        assert_eq!(
            paths.version_dir(VersionNum::with_padding(3, 4)),
            PathBuf::from("/data/obj1/v0003")
        );
        assert_eq!(
            paths.version_inventory(VersionNum::new(1)),
            PathBuf::from("/data/obj1/v1/inventory.json")
        );
        assert_eq!(
            paths.content_path("v1/content/a.txt"),
            PathBuf::from("/data/obj1/v1/content/a.txt")
        );
    }

    #[test]
    fn declaration_predicates() {
        assert!(is_object_declaration("0=ocfl_object_1.0"));
        assert!(is_object_declaration("0=ocfl_object_1.1"));
        assert!(!is_object_declaration("0=ocfl_1.0"));

        assert!(is_root_declaration("0=ocfl_1.0"));
        assert!(!is_root_declaration("0=ocfl_object_1.0"));
        assert!(!is_root_declaration("inventory.json"));
    }
}
