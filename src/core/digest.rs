//! core::digest
//!
//! Streaming digest engine over a closed algorithm registry.
//!
//! # Architecture
//!
//! All content addressing in an OCFL object runs through this module.
//! Algorithms form a closed set ([`DigestAlgorithm`]); unknown names are
//! rejected at parse time rather than falling back to a default.
//!
//! Digests are computed by streaming through a fixed-size buffer so that
//! multi-gigabyte preservation content never has to be held in memory.
//!
//! # Example
//!
//! ```
//! use ocflkit::core::digest::{digest_bytes, DigestAlgorithm};
//!
//! let d = digest_bytes(DigestAlgorithm::Sha256, b"content");
//! assert_eq!(d.len(), DigestAlgorithm::Sha256.hex_len());
//! ```

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use digest::DynDigest;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from digest computation.
#[derive(Debug, Error)]
pub enum DigestError {
    /// The algorithm name is not in the registry.
    #[error("unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The byte source could not be read to completion.
    #[error("cannot read {path}: {source}")]
    UnreadableSource {
        /// The path that failed to read.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Read buffer size for streaming digest computation.
const DIGEST_BUF_SIZE: usize = 64 * 1024;

/// A digest algorithm from the OCFL registry.
///
/// `sha512` is the mandatory primary algorithm; `sha256` is the accepted
/// alternate. The remaining algorithms are valid for fixity blocks only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Sha512,
    #[serde(rename = "blake2b-512")]
    Blake2b512,
}

impl DigestAlgorithm {
    /// All registered algorithms.
    pub const ALL: [DigestAlgorithm; 5] = [
        DigestAlgorithm::Md5,
        DigestAlgorithm::Sha1,
        DigestAlgorithm::Sha256,
        DigestAlgorithm::Sha512,
        DigestAlgorithm::Blake2b512,
    ];

    /// The canonical lowercase name used in inventories and sidecar names.
    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => "md5",
            DigestAlgorithm::Sha1 => "sha1",
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha512 => "sha512",
            DigestAlgorithm::Blake2b512 => "blake2b-512",
        }
    }

    /// Length of the lowercase hex encoding of a digest value.
    pub fn hex_len(&self) -> usize {
        match self {
            DigestAlgorithm::Md5 => 32,
            DigestAlgorithm::Sha1 => 40,
            DigestAlgorithm::Sha256 => 64,
            DigestAlgorithm::Sha512 => 128,
            DigestAlgorithm::Blake2b512 => 128,
        }
    }

    /// Whether the algorithm is acceptable as an inventory's primary
    /// `digestAlgorithm` without lax mode.
    pub fn is_primary(&self) -> bool {
        matches!(self, DigestAlgorithm::Sha256 | DigestAlgorithm::Sha512)
    }

    fn hasher(&self) -> Box<dyn DynDigest> {
        match self {
            DigestAlgorithm::Md5 => Box::new(md5::Md5::default()),
            DigestAlgorithm::Sha1 => Box::new(sha1::Sha1::default()),
            DigestAlgorithm::Sha256 => Box::new(sha2::Sha256::default()),
            DigestAlgorithm::Sha512 => Box::new(sha2::Sha512::default()),
            DigestAlgorithm::Blake2b512 => Box::new(blake2::Blake2b512::default()),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "md5" => Ok(DigestAlgorithm::Md5),
            "sha1" => Ok(DigestAlgorithm::Sha1),
            "sha256" => Ok(DigestAlgorithm::Sha256),
            "sha512" => Ok(DigestAlgorithm::Sha512),
            "blake2b-512" => Ok(DigestAlgorithm::Blake2b512),
            other => Err(DigestError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Digest a byte slice, returning lowercase hex.
pub fn digest_bytes(alg: DigestAlgorithm, bytes: &[u8]) -> String {
    let mut hasher = alg.hasher();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Digest a reader by streaming, returning lowercase hex.
pub fn digest_reader<R: Read>(alg: DigestAlgorithm, reader: &mut R) -> std::io::Result<String> {
    let mut hasher = alg.hasher();
    let mut buf = [0u8; DIGEST_BUF_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Digest a file by streaming its contents.
///
/// # Errors
///
/// Returns [`DigestError::UnreadableSource`] if the file cannot be opened
/// or read to completion.
pub fn digest_file(alg: DigestAlgorithm, path: &Path) -> Result<String, DigestError> {
    let file = File::open(path).map_err(|source| DigestError::UnreadableSource {
        path: path.display().to_string(),
        source,
    })?;
    let mut reader = BufReader::new(file);
    digest_reader(alg, &mut reader).map_err(|source| DigestError::UnreadableSource {
        path: path.display().to_string(),
        source,
    })
}

/// Verify a file's digest against an expected value.
///
/// Comparison is case-insensitive; inventories store lowercase hex but
/// uppercase digests are equivalent values.
pub fn verify_file(
    alg: DigestAlgorithm,
    path: &Path,
    expected: &str,
) -> Result<bool, DigestError> {
    let actual = digest_file(alg, path)?;
    Ok(actual.eq_ignore_ascii_case(expected))
}

/// Normalize a digest value to its canonical lowercase form.
pub fn normalize_digest(digest: &str) -> String {
    digest.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn registry_round_trips_names() {
        for alg in DigestAlgorithm::ALL {
            assert_eq!(alg.name().parse::<DigestAlgorithm>().unwrap(), alg);
        }
    }

    #[test]
    fn unknown_algorithm_rejected() {
        let err = "sha3-512".parse::<DigestAlgorithm>().unwrap_err();
        assert!(matches!(err, DigestError::UnsupportedAlgorithm(_)));
    }

    #[test]
    fn sha512_known_value() {
        // Empty-input sha512 is a fixed constant.
        let d = digest_bytes(DigestAlgorithm::Sha512, b"");
        assert!(d.starts_with("cf83e1357eefb8bd"));
        assert_eq!(d.len(), 128);
    }

    #[test]
    fn sha256_known_value() {
        let d = digest_bytes(DigestAlgorithm::Sha256, b"abc");
        assert_eq!(
            d,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn streaming_matches_oneshot() {
        let data = vec![7u8; 200_000]; // larger than one buffer
        let oneshot = digest_bytes(DigestAlgorithm::Sha512, &data);
        let mut cursor = std::io::Cursor::new(&data);
        let streamed = digest_reader(DigestAlgorithm::Sha512, &mut cursor).unwrap();
        assert_eq!(oneshot, streamed);
    }

    #[test]
    fn digest_file_and_verify() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        let mut f = File::create(&path).unwrap();
        f.write_all(b"hello").unwrap();
        drop(f);

        let d = digest_file(DigestAlgorithm::Sha256, &path).unwrap();
        assert!(verify_file(DigestAlgorithm::Sha256, &path, &d).unwrap());
        assert!(verify_file(DigestAlgorithm::Sha256, &path, &d.to_uppercase()).unwrap());
        assert!(!verify_file(DigestAlgorithm::Sha256, &path, "00").unwrap());
    }

    #[test]
    fn missing_file_is_unreadable_source() {
        let err = digest_file(DigestAlgorithm::Sha256, Path::new("/nonexistent/x")).unwrap_err();
        assert!(matches!(err, DigestError::UnreadableSource { .. }));
    }

    #[test]
    fn hex_lens() {
        assert_eq!(DigestAlgorithm::Md5.hex_len(), 32);
        assert_eq!(DigestAlgorithm::Sha1.hex_len(), 40);
        assert_eq!(DigestAlgorithm::Blake2b512.hex_len(), 128);
    }
}
