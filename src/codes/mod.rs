//! codes
//!
//! Validation code catalog and the outcome accumulator.
//!
//! # Architecture
//!
//! The set of validation codes is an evolving external specification, so it
//! is data, not logic: the builtin table is an embedded JSON document in
//! the ocfl-py catalog format (code → ordered params → per-language
//! description), built once behind a `OnceLock` and passed by reference
//! into every validation run. Audit modes targeting a different canonical
//! code list can load their own table with [`CodeCatalog::from_path`].
//!
//! Severity is encoded in the code itself: `E...` is an error, `W...` a
//! warning. A [`ValidationOutcome`] is append-only; expected violations are
//! recorded and validation continues, so the caller always receives the
//! full diagnostic yield.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use serde::Deserialize;
use thiserror::Error;

/// URL prefix for spec references attached to spec-numbered codes.
const SPEC_URL: &str = "https://ocfl.io/1.0/spec/";

/// Codes with a numeric part below this have anchors in the specification.
const SPEC_CODE_CEILING: u32 = 200;

/// Severity of an outcome record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// The object (or root) fails validation.
    Error,
    /// Reported but does not affect pass/fail.
    Warning,
}

impl Severity {
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }

    /// Derive severity from a code's prefix letter.
    pub fn of_code(code: &str) -> Severity {
        if code.starts_with('W') {
            Severity::Warning
        } else {
            Severity::Error
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// One catalog entry: ordered parameter names and localized descriptions.
#[derive(Debug, Clone, Deserialize)]
pub struct CodeSpec {
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub description: BTreeMap<String, String>,
}

/// Errors loading a catalog from disk.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot read code catalog {path}: {source}")]
    Unreadable {
        path: String,
        source: std::io::Error,
    },

    #[error("code catalog {path} is not valid: {source}")]
    Malformed {
        path: String,
        source: serde_json::Error,
    },
}

/// An immutable code → description table.
#[derive(Debug, Clone)]
pub struct CodeCatalog {
    codes: BTreeMap<String, CodeSpec>,
    lang: String,
}

static BUILTIN: OnceLock<CodeCatalog> = OnceLock::new();

impl CodeCatalog {
    /// The builtin catalog, built once per process.
    pub fn builtin() -> &'static CodeCatalog {
        BUILTIN.get_or_init(|| {
            let codes = serde_json::from_str(include_str!("validation-codes.json"))
                .expect("embedded validation-codes.json is well-formed");
            CodeCatalog {
                codes,
                lang: "en".to_string(),
            }
        })
    }

    /// Load an alternate catalog, for audits targeting a different
    /// canonical code list.
    pub fn from_path(path: &Path) -> Result<CodeCatalog, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Unreadable {
            path: path.display().to_string(),
            source,
        })?;
        let codes = serde_json::from_str(&text).map_err(|source| CatalogError::Malformed {
            path: path.display().to_string(),
            source,
        })?;
        Ok(CodeCatalog {
            codes,
            lang: "en".to_string(),
        })
    }

    /// Whether the catalog knows a code.
    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains_key(code)
    }

    /// Render a human-readable message for a code with its context.
    ///
    /// Description templates use `%s` placeholders filled from the context
    /// values of the entry's declared params, in order. Unknown codes and
    /// missing params degrade to a generic message rather than failing.
    pub fn describe(&self, code: &str, context: &BTreeMap<String, String>) -> String {
        let Some(spec) = self.codes.get(code) else {
            return format!("Unknown code {code} (context: {})", render_context(context));
        };
        let template = spec
            .description
            .get(&self.lang)
            .or_else(|| spec.description.get("en"))
            .or_else(|| spec.description.values().next());
        let Some(template) = template else {
            return format!("{code} (context: {})", render_context(context));
        };

        let mut message = String::with_capacity(template.len());
        let mut params = spec.params.iter();
        let mut rest = template.as_str();
        while let Some(pos) = rest.find("%s") {
            message.push_str(&rest[..pos]);
            let value = params
                .next()
                .and_then(|p| context.get(p))
                .map(String::as_str)
                .unwrap_or("???");
            message.push_str(value);
            rest = &rest[pos + 2..];
        }
        message.push_str(rest);

        if let Some(anchor) = spec_anchor(code) {
            message.push_str(&format!(" (see {SPEC_URL}#{anchor})"));
        }
        message
    }
}

/// Spec anchor for codes the specification itself numbers.
fn spec_anchor(code: &str) -> Option<&str> {
    let num: u32 = code.get(1..)?.parse().ok()?;
    if num < SPEC_CODE_CEILING {
        Some(code)
    } else {
        None
    }
}

fn render_context(context: &BTreeMap<String, String>) -> String {
    context
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One recorded validation finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeRecord {
    pub code: String,
    pub severity: Severity,
    pub context: BTreeMap<String, String>,
}

/// Append-only collection of validation findings for one run.
///
/// Never mutated after a run completes; a run cut short by cancellation is
/// marked incomplete instead of discarded.
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    records: Vec<OutcomeRecord>,
    incomplete: bool,
}

impl ValidationOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finding; severity comes from the code prefix.
    pub fn record<I, K, V>(&mut self, code: &str, context: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.records.push(OutcomeRecord {
            code: code.to_string(),
            severity: Severity::of_code(code),
            context: context
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        });
    }

    /// All findings in recording order.
    pub fn records(&self) -> &[OutcomeRecord] {
        &self.records
    }

    pub fn error_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.severity.is_error())
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.records.len() - self.error_count()
    }

    /// Valid iff there are zero error-severity records. Warnings do not
    /// affect pass/fail.
    pub fn is_valid(&self) -> bool {
        self.error_count() == 0
    }

    /// Whether a specific code was recorded.
    pub fn has_code(&self, code: &str) -> bool {
        self.records.iter().any(|r| r.code == code)
    }

    /// Mark the run as cut short; existing records stay as-is.
    pub fn mark_incomplete(&mut self) {
        self.incomplete = true;
    }

    pub fn is_incomplete(&self) -> bool {
        self.incomplete
    }

    /// Absorb another outcome (bucket merge for parallel validation).
    pub fn merge(&mut self, other: ValidationOutcome) {
        self.records.extend(other.records);
        self.incomplete |= other.incomplete;
    }

    /// Render all findings as sorted, coded message lines.
    pub fn render(&self, catalog: &CodeCatalog, include_warnings: bool) -> Vec<String> {
        let mut lines: Vec<String> = self
            .records
            .iter()
            .filter(|r| include_warnings || r.severity.is_error())
            .map(|r| format!("[{}] {}", r.code, catalog.describe(&r.code, &r.context)))
            .collect();
        lines.sort();
        lines.dedup();
        lines
    }
}
