//! validate::root
//!
//! Validation of an OCFL storage root and every object under it.
//!
//! # Architecture
//!
//! Discovery is an iterative work list, not layout-driven: any directory
//! containing an object namaste file is an object and is not descended
//! into, so objects are found even when the layout descriptor is missing
//! or wrong. The declared layout is then checked as a separate finding
//! (E929) per object. Objects validate independently and in parallel;
//! each gets its own [`ValidationOutcome`] keyed by object id, with the
//! root-relative path as fallback when no id could be read.

use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde_json::Value;

use crate::codes::{CodeCatalog, ValidationOutcome};
use crate::core::inventory::INVENTORY_FILENAME;
use crate::core::object_paths::{is_object_declaration, is_root_declaration};
use crate::store::layout::{load_layout, StorageLayout, LAYOUT_FILENAME};

use super::object::ObjectValidator;
use super::{CancelFlag, ValidateError, ValidateOptions};

/// Aggregated result of a storage root validation.
#[derive(Debug, Default)]
pub struct RootValidationResult {
    /// Findings about the root itself: declaration, layout, strays,
    /// placement, duplicate ids.
    pub root: ValidationOutcome,
    /// Per-object findings, keyed by object id (or root-relative path
    /// when the id could not be read).
    pub objects: BTreeMap<String, ValidationOutcome>,
}

impl RootValidationResult {
    /// Valid iff the root and every object have zero errors.
    pub fn is_valid(&self) -> bool {
        self.root.is_valid() && self.objects.values().all(ValidationOutcome::is_valid)
    }

    pub fn error_count(&self) -> usize {
        self.root.error_count()
            + self
                .objects
                .values()
                .map(ValidationOutcome::error_count)
                .sum::<usize>()
    }

    pub fn warning_count(&self) -> usize {
        self.root.warning_count()
            + self
                .objects
                .values()
                .map(ValidationOutcome::warning_count)
                .sum::<usize>()
    }

    pub fn is_incomplete(&self) -> bool {
        self.root.is_incomplete() || self.objects.values().any(ValidationOutcome::is_incomplete)
    }
}

/// Validates a storage root directory.
pub struct RootValidator<'a> {
    catalog: &'a CodeCatalog,
    options: ValidateOptions,
    cancel: CancelFlag,
}

impl<'a> RootValidator<'a> {
    pub fn new(catalog: &'a CodeCatalog) -> Self {
        Self {
            catalog,
            options: ValidateOptions::default(),
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_options(mut self, options: ValidateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Validate the storage root at `root`.
    pub fn validate(&self, root: &Path) -> Result<RootValidationResult, ValidateError> {
        let mut result = RootValidationResult::default();
        let location = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());

        self.check_declaration(root, &location, &mut result.root)?;

        let layout = match load_layout(root) {
            Ok(layout) => layout,
            Err(err) => {
                result.root.record(
                    "E928",
                    [("where", location.clone()), ("description", err.to_string())],
                );
                None
            }
        };

        let object_dirs = self.discover_objects(root, &location, &mut result.root)?;
        if self.cancel.is_cancelled() {
            result.root.mark_incomplete();
            return Ok(result);
        }

        // Each object validates independently; order of results is fixed
        // afterwards by the BTreeMap key.
        let validator = ObjectValidator::new(self.catalog)
            .with_options(self.options)
            .with_cancel(self.cancel.clone());
        let validated: Vec<(String, Result<ValidationOutcome, ValidateError>)> = object_dirs
            .par_iter()
            .map(|rel| {
                let rel_str = rel_path_string(rel);
                let outcome = validator.validate_at(&root.join(rel), &rel_str);
                (rel_str, outcome)
            })
            .collect();

        let mut seen_ids: BTreeMap<String, String> = BTreeMap::new();
        for (rel, outcome) in validated {
            // An object whose files cannot be read is itself a finding;
            // the other objects still get their full validation.
            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(err) => {
                    let mut outcome = ValidationOutcome::new();
                    outcome.record(
                        "E932",
                        [("where", rel.clone()), ("description", err.to_string())],
                    );
                    outcome.mark_incomplete();
                    outcome
                }
            };
            let id = read_object_id(&root.join(&rel));

            if let (Some(id), Some(layout)) = (id.as_deref(), layout.as_ref()) {
                self.check_placement(layout, id, &rel, &location, &mut result.root);
            }

            let key = match id {
                Some(id) => match seen_ids.get(&id) {
                    Some(first) => {
                        result.root.record(
                            "E937",
                            [
                                ("where", location.clone()),
                                ("id", id.clone()),
                                ("first", first.clone()),
                                ("second", rel.clone()),
                            ],
                        );
                        rel.clone()
                    }
                    None => {
                        seen_ids.insert(id.clone(), rel.clone());
                        id
                    }
                },
                None => rel.clone(),
            };
            result.objects.insert(key, outcome);
        }

        if self.cancel.is_cancelled() {
            result.root.mark_incomplete();
        }
        Ok(result)
    }

    fn check_declaration(
        &self,
        root: &Path,
        location: &str,
        out: &mut ValidationOutcome,
    ) -> Result<(), ValidateError> {
        let entries = read_dir_names(root)?;
        let Some(decl) = entries
            .iter()
            .find(|(name, is_dir)| !is_dir && is_root_declaration(name))
            .map(|(name, _)| name.clone())
        else {
            out.record("E931", [("where", location)]);
            return Ok(());
        };
        let expected = format!("{}\n", &decl["0=".len()..]);
        match fs::read_to_string(root.join(&decl)) {
            Ok(content) if content == expected => {}
            Ok(content) => {
                out.record(
                    "E934",
                    [
                        ("where", location.to_string()),
                        ("got", format!("{content:?}")),
                    ],
                );
            }
            Err(_) => {
                out.record(
                    "E934",
                    [("where", location.to_string()), ("got", "<unreadable>".to_string())],
                );
            }
        }
        Ok(())
    }

    /// Breadth-first discovery of object directories.
    ///
    /// A directory holding an object declaration is an object; everything
    /// else is descended into. Stray files are errors at the root level
    /// and warnings deeper in the hierarchy.
    fn discover_objects(
        &self,
        root: &Path,
        location: &str,
        out: &mut ValidationOutcome,
    ) -> Result<Vec<PathBuf>, ValidateError> {
        let mut objects = Vec::new();
        let mut queue: VecDeque<PathBuf> = VecDeque::new();
        queue.push_back(PathBuf::new());

        while let Some(rel) = queue.pop_front() {
            if self.cancel.is_cancelled() {
                break;
            }
            let dir = root.join(&rel);
            let at_root = rel.as_os_str().is_empty();
            let entries = match read_dir_names(&dir) {
                Ok(entries) => entries,
                // An unreadable root means there is nothing to validate;
                // an unreadable subdirectory is a finding and discovery
                // moves on to its siblings.
                Err(err) if at_root => return Err(err),
                Err(err) => {
                    out.record(
                        "E945",
                        [
                            ("where", location.to_string()),
                            ("path", rel_path_string(&rel)),
                            ("description", err.to_string()),
                        ],
                    );
                    continue;
                }
            };

            if !at_root && entries.iter().any(|(n, d)| !d && is_object_declaration(n)) {
                objects.push(rel);
                continue;
            }

            for (name, is_dir) in entries {
                let child = rel.join(&name);
                if is_dir {
                    if !(at_root && name == "extensions") {
                        queue.push_back(child);
                    }
                } else if at_root {
                    if !is_root_declaration(&name) && name != LAYOUT_FILENAME {
                        out.record(
                            "E930",
                            [("where", location.to_string()), ("path", name)],
                        );
                    }
                } else {
                    out.record(
                        "W903",
                        [
                            ("where", location.to_string()),
                            ("path", rel_path_string(&child)),
                        ],
                    );
                }
            }
        }
        objects.sort();
        Ok(objects)
    }

    fn check_placement(
        &self,
        layout: &StorageLayout,
        id: &str,
        rel: &str,
        location: &str,
        out: &mut ValidationOutcome,
    ) {
        let Ok(expected) = layout.id_to_path(id) else {
            return;
        };
        let expected = rel_path_string(&expected);
        if expected != rel {
            out.record(
                "E929",
                [
                    ("where", location.to_string()),
                    ("id", id.to_string()),
                    ("expected", expected),
                    ("got", rel.to_string()),
                ],
            );
        }
    }
}

/// Best-effort read of an object's id for keying and placement checks.
fn read_object_id(objdir: &Path) -> Option<String> {
    let bytes = fs::read(objdir.join(INVENTORY_FILENAME)).ok()?;
    let value: Value = serde_json::from_slice(&bytes).ok()?;
    Some(value.get("id")?.as_str()?.to_string())
}

fn read_dir_names(dir: &Path) -> Result<Vec<(String, bool)>, ValidateError> {
    let unreadable = |source| ValidateError::Unreadable {
        path: dir.display().to_string(),
        source,
    };
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(unreadable)? {
        let entry = entry.map_err(unreadable)?;
        let is_dir = entry.file_type().map_err(unreadable)?.is_dir();
        names.push((entry.file_name().to_string_lossy().into_owned(), is_dir));
    }
    names.sort();
    Ok(names)
}

fn rel_path_string(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
