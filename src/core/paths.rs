//! core::paths
//!
//! Logical and content path rules plus collision detection.
//!
//! # Architecture
//!
//! Paths inside an OCFL object are always relative, `/`-separated, and
//! portable. This module enforces validity at the string level and detects
//! pairs of declared paths that could not coexist on a real filesystem:
//!
//! - case-fold / Unicode-normalization collisions (`Readme` vs `readme`,
//!   NFC vs NFD encodings of the same name)
//! - ancestor overlaps (`a` used as both a file and a directory, as in
//!   `a` + `a/b`)
//!
//! Everything here is pure; no I/O is performed.

use std::collections::BTreeMap;

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// Errors from path validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("path is empty")]
    Empty,

    #[error("path is absolute: {0}")]
    Absolute(String),

    #[error("path has an empty segment: {0}")]
    EmptySegment(String),

    #[error("path has a '{segment}' segment: {path}")]
    DotSegment { path: String, segment: String },

    #[error("path contains forbidden character {ch:?}: {path}")]
    ForbiddenCharacter { path: String, ch: char },

    #[error("content path is not under a version content directory: {0}")]
    NotUnderContent(String),
}

/// Validate a logical path.
///
/// Logical paths are the user-facing names in a version's state. They must
/// be relative, `/`-separated, free of empty or `.`/`..` segments, and free
/// of characters that break portable filesystems (backslash, NUL, other
/// control characters).
pub fn validate_logical_path(path: &str) -> Result<(), PathError> {
    if path.is_empty() {
        return Err(PathError::Empty);
    }
    if path.starts_with('/') {
        return Err(PathError::Absolute(path.to_string()));
    }
    for ch in path.chars() {
        if ch == '\\' || ch.is_control() {
            return Err(PathError::ForbiddenCharacter {
                path: path.to_string(),
                ch,
            });
        }
    }
    for segment in path.split('/') {
        if segment.is_empty() {
            return Err(PathError::EmptySegment(path.to_string()));
        }
        if segment == "." || segment == ".." {
            return Err(PathError::DotSegment {
                path: path.to_string(),
                segment: segment.to_string(),
            });
        }
    }
    Ok(())
}

/// Validate a content path relative to the object root.
///
/// Content paths must satisfy the logical path rules and additionally take
/// the shape `v<N>/<content_dir>/...`.
pub fn validate_content_path(path: &str, content_dir: &str) -> Result<(), PathError> {
    validate_logical_path(path)?;

    let mut segments = path.split('/');
    let version = segments.next().unwrap_or("");
    let content = segments.next();

    let version_ok = version.len() > 1
        && version.starts_with('v')
        && version[1..].bytes().all(|b| b.is_ascii_digit());
    if !version_ok || content != Some(content_dir) || segments.next().is_none() {
        return Err(PathError::NotUnderContent(path.to_string()));
    }
    Ok(())
}

/// A collision between two declared paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathCollision {
    /// Two distinct paths occupy the same slot after case folding and
    /// Unicode normalization.
    CaseFold { first: String, second: String },

    /// One path is a directory ancestor of another, so one of them cannot
    /// exist as a file.
    AncestorOverlap {
        ancestor: String,
        descendant: String,
    },
}

/// Fold a path for collision comparison: NFC normalization + lowercase.
fn fold(path: &str) -> String {
    path.nfc().collect::<String>().to_lowercase()
}

/// Detect collisions among a set of declared paths.
///
/// Input order does not affect which collisions are found, only which path
/// of a pair is reported first.
pub fn detect_collisions<'a, I>(paths: I) -> Vec<PathCollision>
where
    I: IntoIterator<Item = &'a str>,
{
    let paths: Vec<&str> = paths.into_iter().collect();
    let mut collisions = Vec::new();

    // Case/Unicode collisions: map folded form back to the first declarer.
    let mut folded: BTreeMap<String, &str> = BTreeMap::new();
    for path in &paths {
        let key = fold(path);
        match folded.get(key.as_str()) {
            Some(first) if *first != *path => collisions.push(PathCollision::CaseFold {
                first: (*first).to_string(),
                second: (*path).to_string(),
            }),
            Some(_) => {}
            None => {
                folded.insert(key, path);
            }
        }
    }

    // Ancestor overlaps: a declared path matching a directory prefix of
    // another declared path.
    for path in &paths {
        let key = fold(path);
        let mut prefix = String::new();
        for segment in key.split('/') {
            if !prefix.is_empty() {
                if let Some(ancestor) = folded.get(prefix.as_str()) {
                    collisions.push(PathCollision::AncestorOverlap {
                        ancestor: (*ancestor).to_string(),
                        descendant: (*path).to_string(),
                    });
                }
                prefix.push('/');
            }
            prefix.push_str(segment);
        }
    }

    collisions
}
