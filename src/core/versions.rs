//! core::versions
//!
//! Version number value type and sequence validation.
//!
//! # Architecture
//!
//! OCFL version directories are named `v1`, `v2`, ... or with one fixed
//! zero-padding width (`v0001`). [`VersionNum`] carries both the number and
//! the padding so a name can be reproduced exactly. [`validate_sequence`]
//! checks a set of names for the sequence invariants and reports typed
//! violations; mapping violations to catalog codes is the validator
//! layer's job.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from parsing a single version name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("invalid version name: {0}")]
    InvalidName(String),

    #[error("version number zero is not allowed: {0}")]
    Zero(String),
}

/// A version number with its zero-padding width.
///
/// `padding` is the total digit count when zero-padded, or `0` for the
/// unpadded form. `v3` has padding 0; `v0003` has padding 4.
///
/// Ordering is numeric; padding only affects rendering.
///
/// # Example
///
/// ```
/// use ocflkit::core::versions::VersionNum;
///
/// let v: VersionNum = "v0003".parse().unwrap();
/// assert_eq!(v.num, 3);
/// assert_eq!(v.to_string(), "v0003");
/// assert_eq!(v.next().to_string(), "v0004");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionNum {
    /// The version number, starting at 1.
    pub num: u32,
    /// Total digit width when zero-padded; 0 when unpadded.
    pub padding: usize,
}

impl VersionNum {
    /// Create an unpadded version number.
    pub fn new(num: u32) -> Self {
        Self { num, padding: 0 }
    }

    /// Create a zero-padded version number.
    pub fn with_padding(num: u32, padding: usize) -> Self {
        Self { num, padding }
    }

    /// The next version, keeping the same padding convention.
    pub fn next(&self) -> Self {
        Self {
            num: self.num + 1,
            padding: self.padding,
        }
    }

    /// Whether the number renders within the padding convention.
    ///
    /// A padded name must keep at least one leading zero; `v1000` under
    /// width 4 would re-parse as unpadded, so a width-4 object tops out
    /// at `v0999`. Unpadded numbers always fit.
    pub fn fits_padding(&self) -> bool {
        self.padding == 0 || self.num.to_string().len() < self.padding
    }
}

impl PartialOrd for VersionNum {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionNum {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.num
            .cmp(&other.num)
            .then(self.padding.cmp(&other.padding))
    }
}

impl fmt::Display for VersionNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.padding > 0 {
            write!(f, "v{:0width$}", self.num, width = self.padding)
        } else {
            write!(f, "v{}", self.num)
        }
    }
}

impl FromStr for VersionNum {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('v')
            .ok_or_else(|| VersionError::InvalidName(s.to_string()))?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(VersionError::InvalidName(s.to_string()));
        }
        let num: u32 = digits
            .parse()
            .map_err(|_| VersionError::InvalidName(s.to_string()))?;
        if num == 0 {
            return Err(VersionError::Zero(s.to_string()));
        }
        let padding = if digits.starts_with('0') {
            digits.len()
        } else {
            0
        };
        Ok(Self { num, padding })
    }
}

impl TryFrom<String> for VersionNum {
    type Error = VersionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<VersionNum> for String {
    fn from(v: VersionNum) -> String {
        v.to_string()
    }
}

/// A violated sequence rule, reported per occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceViolation {
    /// A name that does not parse as a version.
    Unparseable { name: String },

    /// No `v1` (or padded equivalent) exists, so no sequence can start.
    MissingFirst,

    /// A number between 1 and the maximum has no name.
    Gap { missing: u32 },

    /// The same number appears under more than one name (`v1` and `v001`).
    Duplicate { first: String, second: String },

    /// Padded and unpadded names (or two widths) are mixed.
    MixedPadding { name: String, expected_width: usize },

    /// The sequence uses zero-padding at this width. Accepted but
    /// discouraged (warning-level).
    ZeroPadded { width: usize },
}

/// Result of checking a set of version names.
#[derive(Debug, Clone, Default)]
pub struct SequenceCheck {
    /// Versions that form the usable in-order sequence.
    pub versions: Vec<VersionNum>,
    /// Rules violated by the input set.
    pub violations: Vec<SequenceViolation>,
}

impl SequenceCheck {
    /// The highest in-sequence version, if any.
    pub fn max(&self) -> Option<VersionNum> {
        self.versions.last().copied()
    }
}

/// Validate a set of version names for contiguity and consistent padding.
///
/// Returns the ordered usable sequence plus every violated rule. The
/// sequence is best-effort: violations do not empty it, so later
/// validation stages can keep working on the versions that do line up.
pub fn validate_sequence<S: AsRef<str>>(names: &[S]) -> SequenceCheck {
    let mut check = SequenceCheck::default();
    let mut parsed: Vec<VersionNum> = Vec::new();

    for name in names {
        let name = name.as_ref();
        match name.parse::<VersionNum>() {
            Ok(v) => parsed.push(v),
            Err(_) => check.violations.push(SequenceViolation::Unparseable {
                name: name.to_string(),
            }),
        }
    }
    parsed.sort();

    if parsed.is_empty() {
        if !names.is_empty() {
            check.violations.push(SequenceViolation::MissingFirst);
        }
        return check;
    }

    // Padding convention comes from the first version.
    let width = parsed[0].padding;
    if width > 0 {
        check
            .violations
            .push(SequenceViolation::ZeroPadded { width });
    }

    let mut last: Option<VersionNum> = None;
    for v in parsed {
        if let Some(prev) = last {
            if v.num == prev.num {
                check.violations.push(SequenceViolation::Duplicate {
                    first: prev.to_string(),
                    second: v.to_string(),
                });
                continue;
            }
            for missing in prev.num + 1..v.num {
                check.violations.push(SequenceViolation::Gap { missing });
            }
        } else if v.num != 1 {
            check.violations.push(SequenceViolation::MissingFirst);
            for missing in 1..v.num {
                check.violations.push(SequenceViolation::Gap { missing });
            }
        }
        if v.padding != width {
            check.violations.push(SequenceViolation::MixedPadding {
                name: v.to_string(),
                expected_width: width,
            });
        }
        check.versions.push(v);
        last = Some(v);
    }

    check
}

/// Check the declared head against the maximum in-sequence version.
///
/// Returns the expected head when the declared value does not match.
pub fn check_head(declared: VersionNum, max: VersionNum) -> Option<VersionNum> {
    if declared.num == max.num && declared.padding == max.padding {
        None
    } else {
        Some(max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_render() {
        let v: VersionNum = "v1".parse().unwrap();
        assert_eq!(v, VersionNum::new(1));
        assert_eq!(v.to_string(), "v1");

        let v: VersionNum = "v0042".parse().unwrap();
        assert_eq!(v.num, 42);
        assert_eq!(v.padding, 4);
        assert_eq!(v.to_string(), "v0042");
    }

    #[test]
    fn parse_rejects_bad_names() {
        assert!("1".parse::<VersionNum>().is_err());
        assert!("v".parse::<VersionNum>().is_err());
        assert!("va".parse::<VersionNum>().is_err());
        assert!("v1a".parse::<VersionNum>().is_err());
        assert_eq!(
            "v0".parse::<VersionNum>(),
            Err(VersionError::Zero("v0".to_string()))
        );
        assert_eq!(
            "v00".parse::<VersionNum>(),
            Err(VersionError::Zero("v00".to_string()))
        );
    }

    #[test]
    fn next_keeps_padding() {
        let v = VersionNum::with_padding(9, 4);
        assert_eq!(v.next().to_string(), "v0010");
        assert_eq!(VersionNum::new(9).next().to_string(), "v10");
    }

    #[test]
    fn padding_width_caps_the_sequence() {
        assert!(VersionNum::with_padding(999, 4).fits_padding());
        assert!(!VersionNum::with_padding(1000, 4).fits_padding());
        assert!(!VersionNum::with_padding(1, 1).fits_padding());
        assert!(VersionNum::new(u32::MAX - 1).fits_padding());
    }

    #[test]
    fn clean_unpadded_sequence() {
        let check = validate_sequence(&["v3", "v1", "v2"]);
        assert!(check.violations.is_empty());
        assert_eq!(
            check.versions,
            vec![VersionNum::new(1), VersionNum::new(2), VersionNum::new(3)]
        );
        assert_eq!(check.max(), Some(VersionNum::new(3)));
    }

    #[test]
    fn padded_sequence_warns_only() {
        let check = validate_sequence(&["v001", "v002"]);
        assert_eq!(
            check.violations,
            vec![SequenceViolation::ZeroPadded { width: 3 }]
        );
        assert_eq!(check.versions.len(), 2);
    }

    #[test]
    fn gap_detected() {
        let check = validate_sequence(&["v1", "v3"]);
        assert!(check
            .violations
            .contains(&SequenceViolation::Gap { missing: 2 }));
    }

    #[test]
    fn missing_first_detected() {
        let check = validate_sequence(&["v2", "v3"]);
        assert!(check.violations.contains(&SequenceViolation::MissingFirst));
    }

    #[test]
    fn duplicate_across_paddings() {
        let check = validate_sequence(&["v1", "v01"]);
        assert!(check
            .violations
            .iter()
            .any(|v| matches!(v, SequenceViolation::Duplicate { .. })));
    }

    #[test]
    fn mixed_padding_detected() {
        let check = validate_sequence(&["v1", "v02"]);
        assert!(check
            .violations
            .iter()
            .any(|v| matches!(v, SequenceViolation::MixedPadding { .. })));
    }

    #[test]
    fn unparseable_names_reported() {
        let check = validate_sequence(&["v1", "logs"]);
        assert!(check.violations.contains(&SequenceViolation::Unparseable {
            name: "logs".to_string()
        }));
        assert_eq!(check.versions.len(), 1);
    }

    #[test]
    fn head_check() {
        assert!(check_head(VersionNum::new(3), VersionNum::new(3)).is_none());
        assert_eq!(
            check_head(VersionNum::new(2), VersionNum::new(3)),
            Some(VersionNum::new(3))
        );
        // Same number, different padding is still a mismatch.
        assert!(check_head(VersionNum::new(3), VersionNum::with_padding(3, 4)).is_some());
    }
}
