//! core::inventory
//!
//! Typed OCFL inventory document.
//!
//! # Architecture
//!
//! This is the strict representation used by the builder and by anything
//! that needs to trust an inventory (`show`, prior-version writing). Parsing
//! is all-or-nothing: a field with the wrong shape is a [`InventoryError`],
//! never coerced. The error-collecting structural checks used during
//! validation work on raw `serde_json::Value` instead and live in
//! [`crate::validate::inventory_check`].
//!
//! Digest keys are normalized to lowercase on parse so that map lookups
//! never miss on case.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::digest::{normalize_digest, DigestAlgorithm};
use super::versions::VersionNum;

/// The inventory file name at the object root and in version directories.
pub const INVENTORY_FILENAME: &str = "inventory.json";

/// The `type` value declaring conformance to OCFL 1.0.
pub const SPEC_TYPE_1_0: &str = "https://ocfl.io/1.0/spec/#inventory";

/// Default name of the content directory inside a version directory.
pub const DEFAULT_CONTENT_DIRECTORY: &str = "content";

/// Digest → paths mapping used by the manifest and by version states.
pub type DigestMap = BTreeMap<String, Vec<String>>;

/// Errors from strict inventory parsing.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("inventory is not valid JSON or has a malformed field: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("inventory head {head} has no entry in versions")]
    HeadNotInVersions { head: String },
}

/// A `user` block: who created a version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// One version block: metadata plus the logical state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub created: DateTime<FixedOffset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    pub state: DigestMap,
}

impl VersionEntry {
    /// All logical paths in this version, with their digests.
    pub fn logical_paths(&self) -> impl Iterator<Item = (&str, &str)> {
        self.state.iter().flat_map(|(digest, paths)| {
            paths
                .iter()
                .map(move |p| (p.as_str(), digest.as_str()))
        })
    }

    /// Look up the digest for a logical path.
    pub fn digest_for_logical(&self, path: &str) -> Option<&str> {
        self.state
            .iter()
            .find(|(_, paths)| paths.iter().any(|p| p == path))
            .map(|(digest, _)| digest.as_str())
    }
}

/// The authoritative manifest + version-history document for one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub id: String,
    #[serde(rename = "type")]
    pub spec_type: String,
    #[serde(rename = "digestAlgorithm")]
    pub digest_algorithm: DigestAlgorithm,
    pub head: VersionNum,
    #[serde(
        rename = "contentDirectory",
        skip_serializing_if = "Option::is_none"
    )]
    pub content_directory: Option<String>,
    pub manifest: DigestMap,
    pub versions: BTreeMap<VersionNum, VersionEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixity: Option<BTreeMap<String, DigestMap>>,
}

impl Inventory {
    /// Parse an inventory strictly from bytes.
    ///
    /// # Errors
    ///
    /// [`InventoryError::Malformed`] for JSON syntax errors or wrong-shaped
    /// fields; [`InventoryError::HeadNotInVersions`] when `head` names a
    /// version with no block.
    pub fn parse(bytes: &[u8]) -> Result<Self, InventoryError> {
        let mut inv: Inventory = serde_json::from_slice(bytes)?;
        if !inv.versions.contains_key(&inv.head) {
            return Err(InventoryError::HeadNotInVersions {
                head: inv.head.to_string(),
            });
        }
        inv.normalize_digests();
        Ok(inv)
    }

    /// Serialize to the stable pretty form written to disk.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, InventoryError> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Name of the digest sidecar for this inventory.
    pub fn sidecar_name(&self) -> String {
        format!("{}.{}", INVENTORY_FILENAME, self.digest_algorithm)
    }

    /// The content directory name, with the `content` default applied.
    pub fn content_directory(&self) -> &str {
        self.content_directory
            .as_deref()
            .unwrap_or(DEFAULT_CONTENT_DIRECTORY)
    }

    /// Version numbers in numeric order.
    pub fn version_numbers(&self) -> Vec<VersionNum> {
        self.versions.keys().copied().collect()
    }

    /// The head version block.
    pub fn head_entry(&self) -> Option<&VersionEntry> {
        self.versions.get(&self.head)
    }

    /// Content paths stored for a digest, if any.
    pub fn content_paths_for(&self, digest: &str) -> Option<&[String]> {
        self.manifest
            .get(&normalize_digest(digest))
            .map(|v| v.as_slice())
    }

    /// Look up the digest recorded for a content path.
    pub fn digest_for_content_path(&self, path: &str) -> Option<&str> {
        self.manifest
            .iter()
            .find(|(_, paths)| paths.iter().any(|p| p == path))
            .map(|(digest, _)| digest.as_str())
    }

    /// Lowercase all digest keys in manifest, states, and fixity.
    fn normalize_digests(&mut self) {
        self.manifest = lowercase_keys(std::mem::take(&mut self.manifest));
        for entry in self.versions.values_mut() {
            entry.state = lowercase_keys(std::mem::take(&mut entry.state));
        }
        if let Some(fixity) = self.fixity.take() {
            self.fixity = Some(
                fixity
                    .into_iter()
                    .map(|(alg, digests)| (alg, lowercase_keys(digests)))
                    .collect(),
            );
        }
    }
}

fn lowercase_keys(map: DigestMap) -> DigestMap {
    map.into_iter()
        .map(|(digest, paths)| (normalize_digest(&digest), paths))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "id": "ark:/12345/bcd987",
        "type": "https://ocfl.io/1.0/spec/#inventory",
        "digestAlgorithm": "sha512",
        "head": "v2",
        "manifest": {
            "AB12": ["v1/content/a.txt"],
            "cd34": ["v2/content/b.txt"]
        },
        "versions": {
            "v1": {
                "created": "2023-01-01T10:00:00Z",
                "message": "first",
                "user": {"name": "Alice", "address": "mailto:alice@example.org"},
                "state": {"AB12": ["a.txt"]}
            },
            "v2": {
                "created": "2023-02-01T10:00:00+01:00",
                "state": {"ab12": ["a.txt"], "cd34": ["b.txt"]}
            }
        }
    }"#;

    #[test]
    fn parse_sample() {
        let inv = Inventory::parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(inv.id, "ark:/12345/bcd987");
        assert_eq!(inv.digest_algorithm, DigestAlgorithm::Sha512);
        assert_eq!(inv.head, VersionNum::new(2));
        assert_eq!(inv.version_numbers().len(), 2);
        assert_eq!(inv.content_directory(), "content");
    }

    #[test]
    fn digests_normalized_to_lowercase() {
        let inv = Inventory::parse(SAMPLE.as_bytes()).unwrap();
        assert!(inv.manifest.contains_key("ab12"));
        assert!(!inv.manifest.contains_key("AB12"));
        assert_eq!(
            inv.content_paths_for("AB12").unwrap(),
            &["v1/content/a.txt".to_string()]
        );
        let v1 = inv.versions.get(&VersionNum::new(1)).unwrap();
        assert_eq!(v1.digest_for_logical("a.txt"), Some("ab12"));
    }

    #[test]
    fn head_must_exist() {
        let bad = SAMPLE.replace("\"head\": \"v2\"", "\"head\": \"v3\"");
        let err = Inventory::parse(bad.as_bytes()).unwrap_err();
        assert!(matches!(err, InventoryError::HeadNotInVersions { .. }));
    }

    #[test]
    fn wrong_shape_rejected() {
        // message must be a plain string, not an object
        let bad = SAMPLE.replace("\"message\": \"first\"", "\"message\": {\"text\": \"first\"}");
        assert!(matches!(
            Inventory::parse(bad.as_bytes()),
            Err(InventoryError::Malformed(_))
        ));
    }

    #[test]
    fn unknown_digest_algorithm_rejected() {
        let bad = SAMPLE.replace("sha512", "crc32");
        assert!(Inventory::parse(bad.as_bytes()).is_err());
    }

    #[test]
    fn round_trip_stable() {
        let inv = Inventory::parse(SAMPLE.as_bytes()).unwrap();
        let bytes = inv.to_json_bytes().unwrap();
        let again = Inventory::parse(&bytes).unwrap();
        assert_eq!(inv, again);
        // Re-serialization is byte-stable.
        assert_eq!(bytes, again.to_json_bytes().unwrap());
    }

    #[test]
    fn sidecar_name_carries_algorithm() {
        let inv = Inventory::parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(inv.sidecar_name(), "inventory.json.sha512");
    }

    #[test]
    fn logical_path_iteration() {
        let inv = Inventory::parse(SAMPLE.as_bytes()).unwrap();
        let head = inv.head_entry().unwrap();
        let mut paths: Vec<&str> = head.logical_paths().map(|(p, _)| p).collect();
        paths.sort_unstable();
        assert_eq!(paths, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn versions_ordered_numerically() {
        // v10 must sort after v9, not lexicographically.
        let mut sample = SAMPLE.to_string();
        sample = sample.replace("\"head\": \"v2\"", "\"head\": \"v10\"");
        sample = sample.replace("\"v2\":", "\"v10\":");
        // Gap v2..v9 is a validator concern, not a parse error.
        let inv = Inventory::parse(sample.as_bytes()).unwrap();
        let nums: Vec<u32> = inv.version_numbers().iter().map(|v| v.num).collect();
        assert_eq!(nums, vec![1, 10]);
    }
}
