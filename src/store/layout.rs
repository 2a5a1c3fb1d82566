//! store::layout
//!
//! Layout policies mapping object ids to storage root paths.
//!
//! # Architecture
//!
//! The descriptor format is the `ocfl_layout.json` convention: a JSON
//! object whose `name` tag selects the policy and whose remaining fields
//! are that policy's parameters. Mapping is pure so the same policy code
//! serves the builder (where to put an object) and the validator (where
//! an object should have been).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::digest::{digest_bytes, DigestAlgorithm};

/// Storage root layout descriptor file name.
pub const LAYOUT_FILENAME: &str = "ocfl_layout.json";

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("object id {id} cannot be used as a directory name under the direct layout")]
    UnsafeId { id: String },

    #[error(
        "hashed-n-tuple parameters are invalid: {num_tuples} tuples of size {tuple_size} \
         over a {algorithm} digest"
    )]
    InvalidTuples {
        tuple_size: usize,
        num_tuples: usize,
        algorithm: DigestAlgorithm,
    },

    #[error("cannot read layout descriptor {path}: {source}")]
    Unreadable {
        path: String,
        source: std::io::Error,
    },

    #[error("layout descriptor {path} is invalid: {source}")]
    Malformed {
        path: String,
        source: serde_json::Error,
    },
}

/// A storage root layout policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum StorageLayout {
    /// The object id, used verbatim as a single path segment.
    #[serde(rename = "direct")]
    Direct,

    /// Digest-derived hierarchy: N tuples of the id's digest as nested
    /// directories, ending in either the full digest or the id.
    #[serde(rename = "hashed-n-tuple", rename_all = "camelCase")]
    HashedNTuple {
        #[serde(default = "default_layout_algorithm")]
        digest_algorithm: DigestAlgorithm,
        #[serde(default = "default_tuple_size")]
        tuple_size: usize,
        #[serde(default = "default_num_tuples")]
        num_tuples: usize,
        #[serde(default)]
        short_object_root: bool,
    },
}

fn default_layout_algorithm() -> DigestAlgorithm {
    DigestAlgorithm::Sha256
}

fn default_tuple_size() -> usize {
    3
}

fn default_num_tuples() -> usize {
    3
}

impl Default for StorageLayout {
    fn default() -> Self {
        StorageLayout::HashedNTuple {
            digest_algorithm: default_layout_algorithm(),
            tuple_size: default_tuple_size(),
            num_tuples: default_num_tuples(),
            short_object_root: false,
        }
    }
}

impl StorageLayout {
    /// Check that the policy's parameters are internally consistent.
    ///
    /// The tuple segments must fit inside the id digest, with at least one
    /// character left for the leaf when `shortObjectRoot` truncates it.
    /// The descriptor is external input, so this runs at load time and
    /// again before any path is derived.
    pub fn check(&self) -> Result<(), LayoutError> {
        let StorageLayout::HashedNTuple {
            digest_algorithm,
            tuple_size,
            num_tuples,
            short_object_root,
        } = self
        else {
            return Ok(());
        };
        let hex_len = digest_algorithm.hex_len();
        let fits = match num_tuples.checked_mul(*tuple_size) {
            Some(used) if *short_object_root => used < hex_len,
            Some(used) => used <= hex_len,
            None => false,
        };
        if !fits || (*tuple_size == 0) != (*num_tuples == 0) {
            return Err(LayoutError::InvalidTuples {
                tuple_size: *tuple_size,
                num_tuples: *num_tuples,
                algorithm: *digest_algorithm,
            });
        }
        Ok(())
    }

    /// Map an object id to its root-relative object directory.
    pub fn id_to_path(&self, id: &str) -> Result<PathBuf, LayoutError> {
        self.check()?;
        match self {
            StorageLayout::Direct => {
                if id.is_empty()
                    || id == "."
                    || id == ".."
                    || id.contains('/')
                    || id.contains('\\')
                    || id.bytes().any(|b| b.is_ascii_control())
                {
                    return Err(LayoutError::UnsafeId { id: id.to_string() });
                }
                Ok(PathBuf::from(id))
            }
            StorageLayout::HashedNTuple {
                digest_algorithm,
                tuple_size,
                num_tuples,
                short_object_root,
            } => {
                let digest = digest_bytes(*digest_algorithm, id.as_bytes());
                let mut path = PathBuf::new();
                for i in 0..*num_tuples {
                    let start = i * tuple_size;
                    path.push(&digest[start..start + tuple_size]);
                }
                if *short_object_root {
                    path.push(&digest[num_tuples * tuple_size..]);
                } else {
                    path.push(&digest);
                }
                Ok(path)
            }
        }
    }
}

/// Read the layout descriptor of a storage root, if one exists.
pub fn load_layout(root: &Path) -> Result<Option<StorageLayout>, LayoutError> {
    let path = root.join(LAYOUT_FILENAME);
    if !path.is_file() {
        return Ok(None);
    }
    let text = fs::read_to_string(&path).map_err(|source| LayoutError::Unreadable {
        path: path.display().to_string(),
        source,
    })?;
    let layout: StorageLayout =
        serde_json::from_str(&text).map_err(|source| LayoutError::Malformed {
            path: path.display().to_string(),
            source,
        })?;
    layout.check()?;
    Ok(Some(layout))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_uses_id_verbatim() {
        let layout = StorageLayout::Direct;
        assert_eq!(layout.id_to_path("obj-001").unwrap(), PathBuf::from("obj-001"));
    }

    #[test]
    fn direct_rejects_unsafe_ids() {
        let layout = StorageLayout::Direct;
        assert!(layout.id_to_path("a/b").is_err());
        assert!(layout.id_to_path("..").is_err());
        assert!(layout.id_to_path("").is_err());
    }

    #[test]
    fn hashed_n_tuple_shape() {
        let layout = StorageLayout::default();
        let path = layout.id_to_path("ark:/12345/obj1").unwrap();
        let segments: Vec<String> = path
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0].len(), 3);
        assert_eq!(segments[1].len(), 3);
        assert_eq!(segments[2].len(), 3);
        // sha256 hex digest as the leaf.
        assert_eq!(segments[3].len(), 64);
        assert!(segments[3].starts_with(&segments[0]));
    }

    #[test]
    fn hashed_n_tuple_is_deterministic() {
        let layout = StorageLayout::default();
        assert_eq!(
            layout.id_to_path("some-id").unwrap(),
            layout.id_to_path("some-id").unwrap()
        );
    }

    #[test]
    fn short_object_root_truncates_leaf() {
        let layout = StorageLayout::HashedNTuple {
            digest_algorithm: DigestAlgorithm::Sha256,
            tuple_size: 3,
            num_tuples: 3,
            short_object_root: true,
        };
        let path = layout.id_to_path("x").unwrap();
        let leaf = path.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(leaf.len(), 64 - 9);
    }

    #[test]
    fn descriptor_round_trip() {
        let layout = StorageLayout::default();
        let json = serde_json::to_string(&layout).unwrap();
        assert!(json.contains("\"name\":\"hashed-n-tuple\""));
        let back: StorageLayout = serde_json::from_str(&json).unwrap();
        assert_eq!(back, layout);
    }

    #[test]
    fn descriptor_defaults_apply() {
        let layout: StorageLayout =
            serde_json::from_str(r#"{"name": "hashed-n-tuple"}"#).unwrap();
        assert_eq!(layout, StorageLayout::default());
    }

    #[test]
    fn unknown_layout_name_rejected() {
        assert!(serde_json::from_str::<StorageLayout>(r#"{"name": "mystery"}"#).is_err());
    }

    #[test]
    fn oversized_tuple_params_rejected() {
        let layout = StorageLayout::HashedNTuple {
            digest_algorithm: DigestAlgorithm::Sha256,
            tuple_size: 999,
            num_tuples: 999,
            short_object_root: false,
        };
        assert!(matches!(
            layout.id_to_path("some-id"),
            Err(LayoutError::InvalidTuples { .. })
        ));
    }

    #[test]
    fn tuple_params_must_leave_room_for_short_leaf() {
        // 16 tuples of 4 consume the whole sha256 digest; fine with a full
        // leaf, empty leaf when shortObjectRoot truncates it.
        let full_leaf = StorageLayout::HashedNTuple {
            digest_algorithm: DigestAlgorithm::Sha256,
            tuple_size: 4,
            num_tuples: 16,
            short_object_root: false,
        };
        assert!(full_leaf.id_to_path("x").is_ok());

        let short_leaf = StorageLayout::HashedNTuple {
            digest_algorithm: DigestAlgorithm::Sha256,
            tuple_size: 4,
            num_tuples: 16,
            short_object_root: true,
        };
        assert!(short_leaf.id_to_path("x").is_err());
    }

    #[test]
    fn zero_tuple_params_must_agree() {
        let flat = StorageLayout::HashedNTuple {
            digest_algorithm: DigestAlgorithm::Sha256,
            tuple_size: 0,
            num_tuples: 0,
            short_object_root: false,
        };
        assert!(flat.id_to_path("x").is_ok());

        let mismatched = StorageLayout::HashedNTuple {
            digest_algorithm: DigestAlgorithm::Sha256,
            tuple_size: 0,
            num_tuples: 3,
            short_object_root: false,
        };
        assert!(mismatched.id_to_path("x").is_err());
    }

    #[test]
    fn load_layout_rejects_oversized_tuple_params() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::write(
            tmp.path().join(LAYOUT_FILENAME),
            r#"{"name": "hashed-n-tuple", "tupleSize": 100000, "numTuples": 100000}"#,
        )
        .unwrap();
        assert!(matches!(
            load_layout(tmp.path()),
            Err(LayoutError::InvalidTuples { .. })
        ));
    }

    #[test]
    fn load_layout_absent_is_none() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(load_layout(tmp.path()).unwrap().is_none());
    }
}
