//! validate::object
//!
//! Full validation of one OCFL object directory.
//!
//! # Architecture
//!
//! An object is validated in fixed stages, each feeding the next:
//! declaration, inventory location, sidecar verification, JSON parse,
//! structural checks, version directories, content files, and finally
//! cross-version consistency against any inventories stored inside
//! version directories. Findings accumulate in one
//! [`ValidationOutcome`]; only a missing inventory (E900) and a sidecar
//! digest mismatch (E925) abort early, because every later stage trusts
//! the inventory bytes. Cancellation is checked at stage boundaries and
//! returns the partial outcome marked incomplete.
//!
//! Content digests are recomputed in parallel with rayon; each worker
//! produces its own findings which are merged in path order afterwards,
//! so output is deterministic regardless of scheduling.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use rayon::prelude::*;
use serde_json::Value;
use walkdir::WalkDir;

use crate::codes::{CodeCatalog, ValidationOutcome};
use crate::core::digest::{digest_bytes, digest_file, DigestAlgorithm};
use crate::core::inventory::INVENTORY_FILENAME;
use crate::core::object_paths::{is_object_declaration, ObjectPaths};
use crate::core::versions::VersionNum;

use super::inventory_check::{check_inventory, InventoryCheck};
use super::{CancelFlag, ValidateError, ValidateOptions};

/// Directories an object root may contain besides version directories.
const ALLOWED_OBJECT_DIRS: &[&str] = &["extensions", "logs"];

/// Validates one OCFL object directory.
pub struct ObjectValidator<'a> {
    catalog: &'a CodeCatalog,
    options: ValidateOptions,
    cancel: CancelFlag,
}

impl<'a> ObjectValidator<'a> {
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

    /// The catalog findings from this validator should be rendered with.
    pub fn catalog(&self) -> &CodeCatalog {
        self.catalog
    }

    /// Validate the object rooted at `objdir`.
    ///
    /// Expected violations become outcome records; `Err` is reserved for
    /// an object root that cannot even be listed.
    pub fn validate(&self, objdir: &Path) -> Result<ValidationOutcome, ValidateError> {
        let location = objdir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| objdir.display().to_string());
        self.validate_at(objdir, &location)
    }

    /// Validate with an explicit location tag, used by the storage root
    /// validator to report object-relative paths.
    pub fn validate_at(
        &self,
        objdir: &Path,
        location: &str,
    ) -> Result<ValidationOutcome, ValidateError> {
        let mut out = ValidationOutcome::new();

        let entries = list_dir(objdir)?;
        if self.bail(&mut out) {
            return Ok(out);
        }

        self.check_declaration(objdir, &entries, location, &mut out);

        // Without an inventory nothing else is checkable.
        let inventory_path = ObjectPaths::new(objdir).inventory();
        if !inventory_path.is_file() {
            out.record("E900", [("where", location)]);
            return Ok(out);
        }
        let inventory_bytes = fs::read(&inventory_path).map_err(|source| {
            ValidateError::Unreadable {
                path: inventory_path.display().to_string(),
                source,
            }
        })?;

        if !self.check_sidecar(objdir, &entries, &inventory_bytes, location, &mut out) {
            return Ok(out);
        }

        let value: Value = match serde_json::from_slice(&inventory_bytes) {
            Ok(value) => value,
            Err(err) => {
                out.record(
                    "E901",
                    [("where", location.to_string()), ("description", err.to_string())],
                );
                return Ok(out);
            }
        };
        if self.bail(&mut out) {
            return Ok(out);
        }

        let check = check_inventory(&value, location, self.options.lax_digests, &mut out);
        if self.bail(&mut out) {
            return Ok(out);
        }

        let disk_versions = self.check_version_directories(&entries, &check, location, &mut out);
        if self.bail(&mut out) {
            return Ok(out);
        }

        self.check_content(objdir, &check, location, &mut out);
        self.check_extra_files(objdir, &disk_versions, &check, location, &mut out);
        if self.bail(&mut out) {
            return Ok(out);
        }

        self.check_prior_inventories(objdir, &disk_versions, &check, location, &mut out);
        Ok(out)
    }

    /// Cancellation check at a stage boundary.
    fn bail(&self, out: &mut ValidationOutcome) -> bool {
        if self.cancel.is_cancelled() {
            out.mark_incomplete();
            true
        } else {
            false
        }
    }

    fn check_declaration(
        &self,
        objdir: &Path,
        entries: &[DirEntry],
        location: &str,
        out: &mut ValidationOutcome,
    ) {
        let Some(decl) = entries
            .iter()
            .find(|e| !e.is_dir && is_object_declaration(&e.name))
        else {
            out.record("E927", [("where", location)]);
            return;
        };
        // The declaration must repeat its own name (minus the "0=").
        let expected = format!("{}\n", &decl.name["0=".len()..]);
        match fs::read_to_string(objdir.join(&decl.name)) {
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
    }

    /// Verify the inventory against its digest sidecar.
    ///
    /// Returns false when validation must stop: a mismatched sidecar means
    /// the inventory bytes cannot be trusted, so no downstream check is
    /// meaningful.
    fn check_sidecar(
        &self,
        objdir: &Path,
        entries: &[DirEntry],
        inventory_bytes: &[u8],
        location: &str,
        out: &mut ValidationOutcome,
    ) -> bool {
        let prefix = format!("{INVENTORY_FILENAME}.");
        let Some(sidecar) = entries
            .iter()
            .find(|e| !e.is_dir && e.name.starts_with(&prefix))
        else {
            out.record("E924", [("where", location)]);
            return true;
        };

        let alg = match DigestAlgorithm::from_str(&sidecar.name[prefix.len()..]) {
            Ok(alg) => alg,
            Err(_) => {
                out.record(
                    "E926",
                    [("where", location.to_string()), ("path", sidecar.name.clone())],
                );
                return true;
            }
        };
        let content = match fs::read_to_string(objdir.join(&sidecar.name)) {
            Ok(content) => content,
            Err(_) => {
                out.record(
                    "E926",
                    [("where", location.to_string()), ("path", sidecar.name.clone())],
                );
                return true;
            }
        };
        // The sidecar holds exactly one line: the digest, whitespace, and
        // the inventory file name.
        let mut tokens = content.split_whitespace();
        let expected = match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(digest), Some(name), None) if name == INVENTORY_FILENAME => digest,
            _ => {
                out.record(
                    "E926",
                    [("where", location.to_string()), ("path", sidecar.name.clone())],
                );
                return true;
            }
        };

        let computed = digest_bytes(alg, inventory_bytes);
        if computed.eq_ignore_ascii_case(expected) {
            true
        } else {
            out.record(
                "E925",
                [
                    ("where", location.to_string()),
                    ("expected", expected.to_string()),
                    ("got", computed),
                ],
            );
            false
        }
    }

    /// Cross-check on-disk version directories against the declared
    /// sequence. Returns the versions that exist on disk.
    fn check_version_directories(
        &self,
        entries: &[DirEntry],
        check: &InventoryCheck,
        location: &str,
        out: &mut ValidationOutcome,
    ) -> Vec<VersionNum> {
        let mut disk_versions: Vec<VersionNum> = Vec::new();
        for entry in entries.iter().filter(|e| e.is_dir) {
            if let Ok(version) = VersionNum::from_str(&entry.name) {
                disk_versions.push(version);
            } else if !ALLOWED_OBJECT_DIRS.contains(&entry.name.as_str()) {
                out.record(
                    "E936",
                    [("where", location.to_string()), ("path", entry.name.clone())],
                );
            }
        }
        disk_versions.sort();

        let declared: BTreeSet<String> =
            check.all_versions.iter().map(|v| v.to_string()).collect();
        let on_disk: BTreeSet<String> = disk_versions.iter().map(|v| v.to_string()).collect();
        for missing in declared.difference(&on_disk) {
            out.record(
                "E935",
                [("where", location.to_string()), ("version", missing.clone())],
            );
        }
        for extra in on_disk.difference(&declared) {
            out.record(
                "E936",
                [("where", location.to_string()), ("path", extra.clone())],
            );
        }
        disk_versions
    }

    /// Verify every manifest content path: existence always, digest when
    /// enabled. Runs in parallel; findings are merged in path order.
    fn check_content(
        &self,
        objdir: &Path,
        check: &InventoryCheck,
        location: &str,
        out: &mut ValidationOutcome,
    ) {
        let alg = check.digest_algorithm;
        let paths = ObjectPaths::new(objdir);
        let files: Vec<(&String, &String)> = check.manifest_files.iter().collect();
        let buckets: Vec<ValidationOutcome> = files
            .par_iter()
            .map(|(path, expected)| {
                let mut bucket = ValidationOutcome::new();
                if self.cancel.is_cancelled() {
                    bucket.mark_incomplete();
                    return bucket;
                }
                let full = paths.content_path(path);
                if !full.is_file() {
                    bucket.record(
                        "E921",
                        [("where", location.to_string()), ("path", path.to_string())],
                    );
                    return bucket;
                }
                if !self.options.check_digests {
                    return bucket;
                }
                match digest_file(alg, &full) {
                    Ok(actual) if actual.eq_ignore_ascii_case(expected) => {}
                    Ok(actual) => {
                        bucket.record(
                            "E922",
                            [
                                ("where", location.to_string()),
                                ("path", path.to_string()),
                                ("expected", expected.to_string()),
                                ("got", actual),
                            ],
                        );
                    }
                    Err(_) => {
                        bucket.record(
                            "E921",
                            [("where", location.to_string()), ("path", path.to_string())],
                        );
                    }
                }
                bucket
            })
            .collect();
        for bucket in buckets {
            out.merge(bucket);
        }
    }

    /// Walk version directories for files the inventory does not account
    /// for: orphans under a content directory are errors, anything else
    /// unexpected is a warning.
    fn check_extra_files(
        &self,
        objdir: &Path,
        disk_versions: &[VersionNum],
        check: &InventoryCheck,
        location: &str,
        out: &mut ValidationOutcome,
    ) {
        let paths = ObjectPaths::new(objdir);
        let sidecar_prefix = format!("{INVENTORY_FILENAME}.");
        for version in disk_versions {
            let vname = version.to_string();
            let vdir = paths.version_dir(*version);
            let content_prefix = format!("{vname}/{}/", check.content_directory);
            for entry in WalkDir::new(&vdir)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file())
            {
                let Ok(rel) = entry.path().strip_prefix(objdir) else {
                    continue;
                };
                let rel = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if rel.starts_with(&content_prefix) {
                    if !check.manifest_files.contains_key(&rel) {
                        out.record(
                            "E923",
                            [("where", location.to_string()), ("path", rel)],
                        );
                    }
                    continue;
                }
                // A version inventory and its sidecar are the only files
                // allowed directly in a version directory.
                let in_version_root = rel == format!("{vname}/{INVENTORY_FILENAME}")
                    || rel
                        .strip_prefix(&format!("{vname}/"))
                        .is_some_and(|n| n.starts_with(&sidecar_prefix) && !n.contains('/'));
                if !in_version_root {
                    out.record("W902", [("where", location.to_string()), ("path", rel)]);
                }
            }
        }
    }

    /// Check every inventory stored inside a version directory for
    /// consistency with the head inventory. Absence is not an error;
    /// presence with disagreement means history was rewritten.
    fn check_prior_inventories(
        &self,
        objdir: &Path,
        disk_versions: &[VersionNum],
        head_check: &InventoryCheck,
        location: &str,
        out: &mut ValidationOutcome,
    ) {
        let paths = ObjectPaths::new(objdir);
        for version in disk_versions {
            let path = paths.version_inventory(*version);
            let Ok(bytes) = fs::read(&path) else {
                continue;
            };
            let prior_location = format!("{location}/{version}");
            let value: Value = match serde_json::from_slice(&bytes) {
                Ok(value) => value,
                Err(err) => {
                    out.record(
                        "E901",
                        [
                            ("where", prior_location),
                            ("description", err.to_string()),
                        ],
                    );
                    continue;
                }
            };
            let prior = check_inventory(&value, &prior_location, self.options.lax_digests, out);
            head_check.validate_as_prior_version(&prior, out);
        }
    }
}

struct DirEntry {
    name: String,
    is_dir: bool,
}

fn list_dir(dir: &Path) -> Result<Vec<DirEntry>, ValidateError> {
    let unreadable = |source| ValidateError::Unreadable {
        path: dir.display().to_string(),
        source,
    };
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(unreadable)? {
        let entry = entry.map_err(unreadable)?;
        let file_type = entry.file_type().map_err(unreadable)?;
        entries.push(DirEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir: file_type.is_dir(),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::object_paths::OBJECT_DECLARATION;
    use serde_json::json;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn sha512_of(data: &[u8]) -> String {
        digest_bytes(DigestAlgorithm::Sha512, data)
    }

    fn write_inventory(dir: &Path, inv: &Value) {
        let mut bytes = serde_json::to_vec_pretty(inv).unwrap();
        bytes.push(b'\n');
        fs::write(dir.join("inventory.json"), &bytes).unwrap();
        let digest = sha512_of(&bytes);
        fs::write(
            dir.join("inventory.json.sha512"),
            format!("{digest} inventory.json\n"),
        )
        .unwrap();
    }

    /// One-version object holding a.txt with content "hello\n".
    fn build_object(objdir: &Path) -> Value {
        let content = b"hello\n";
        let digest = sha512_of(content);
        fs::create_dir_all(objdir.join("v1/content")).unwrap();
        fs::write(objdir.join("v1/content/a.txt"), content).unwrap();
        fs::write(objdir.join(OBJECT_DECLARATION), "ocfl_object_1.0\n").unwrap();
        let inv = json!({
            "id": "ark:/12345/obj1",
            "type": "https://ocfl.io/1.0/spec/#inventory",
            "digestAlgorithm": "sha512",
            "head": "v1",
            "manifest": { digest.clone(): ["v1/content/a.txt"] },
            "versions": {
                "v1": {
                    "created": "2023-05-01T12:00:00Z",
                    "message": "first",
                    "user": {"name": "A", "address": "mailto:a@example.org"},
                    "state": { digest: ["a.txt"] }
                }
            }
        });
        write_inventory(objdir, &inv);
        inv
    }

    fn objdir(tmp: &TempDir) -> PathBuf {
        let dir = tmp.path().join("obj1");
        fs::create_dir(&dir).unwrap();
        dir
    }

    fn validate(dir: &Path) -> ValidationOutcome {
        ObjectValidator::new(CodeCatalog::builtin())
            .validate(dir)
            .unwrap()
    }

    #[test]
    fn valid_object_passes() {
        let tmp = TempDir::new().unwrap();
        let dir = objdir(&tmp);
        build_object(&dir);
        let out = validate(&dir);
        assert!(out.is_valid(), "{:?}", out.records());
        assert_eq!(out.warning_count(), 0);
    }

    #[test]
    fn missing_inventory_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let dir = objdir(&tmp);
        fs::write(dir.join(OBJECT_DECLARATION), "ocfl_object_1.0\n").unwrap();
        let out = validate(&dir);
        assert!(out.has_code("E900"));
        assert_eq!(out.records().len(), 1);
    }

    #[test]
    fn missing_declaration_reported() {
        let tmp = TempDir::new().unwrap();
        let dir = objdir(&tmp);
        build_object(&dir);
        fs::remove_file(dir.join(OBJECT_DECLARATION)).unwrap();
        let out = validate(&dir);
        assert!(out.has_code("E927"));
    }

    #[test]
    fn declaration_content_must_repeat_name() {
        let tmp = TempDir::new().unwrap();
        let dir = objdir(&tmp);
        build_object(&dir);
        fs::write(dir.join(OBJECT_DECLARATION), "something else\n").unwrap();
        let out = validate(&dir);
        assert!(out.has_code("E934"));
    }

    #[test]
    fn missing_sidecar_reported_but_validation_continues() {
        let tmp = TempDir::new().unwrap();
        let dir = objdir(&tmp);
        build_object(&dir);
        fs::remove_file(dir.join("inventory.json.sha512")).unwrap();
        let out = validate(&dir);
        assert!(out.has_code("E924"));
        // The content stage still ran.
        assert!(!out.has_code("E921"));
    }

    #[test]
    fn sidecar_naming_wrong_file_is_malformed() {
        let tmp = TempDir::new().unwrap();
        let dir = objdir(&tmp);
        build_object(&dir);
        let bytes = fs::read(dir.join("inventory.json")).unwrap();
        let digest = sha512_of(&bytes);
        fs::write(
            dir.join("inventory.json.sha512"),
            format!("{digest} other.json\n"),
        )
        .unwrap();
        let out = validate(&dir);
        assert!(out.has_code("E926"));
        // Validation continued past the sidecar stage.
        assert!(!out.has_code("E925"));
        assert!(!out.has_code("E921"));
    }

    #[test]
    fn sidecar_with_trailing_tokens_is_malformed() {
        let tmp = TempDir::new().unwrap();
        let dir = objdir(&tmp);
        build_object(&dir);
        let bytes = fs::read(dir.join("inventory.json")).unwrap();
        let digest = sha512_of(&bytes);
        fs::write(
            dir.join("inventory.json.sha512"),
            format!("{digest} inventory.json extra\n"),
        )
        .unwrap();
        let out = validate(&dir);
        assert!(out.has_code("E926"));
    }

    #[test]
    fn sidecar_mismatch_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let dir = objdir(&tmp);
        let inv = build_object(&dir);
        // Rewrite the inventory without updating the sidecar.
        let mut tampered = inv.clone();
        tampered["id"] = json!("ark:/12345/other");
        let mut bytes = serde_json::to_vec_pretty(&tampered).unwrap();
        bytes.push(b'\n');
        fs::write(dir.join("inventory.json"), &bytes).unwrap();

        let out = validate(&dir);
        assert!(out.has_code("E925"));
        // Nothing after the sidecar stage ran.
        assert!(!out.has_code("E921"));
        assert!(!out.has_code("E923"));
    }

    #[test]
    fn unparseable_inventory_reported() {
        let tmp = TempDir::new().unwrap();
        let dir = objdir(&tmp);
        build_object(&dir);
        let bytes = b"{ not json".to_vec();
        fs::write(dir.join("inventory.json"), &bytes).unwrap();
        let digest = sha512_of(&bytes);
        fs::write(
            dir.join("inventory.json.sha512"),
            format!("{digest} inventory.json\n"),
        )
        .unwrap();
        let out = validate(&dir);
        assert!(out.has_code("E901"));
    }

    #[test]
    fn missing_content_file_reported() {
        let tmp = TempDir::new().unwrap();
        let dir = objdir(&tmp);
        build_object(&dir);
        fs::remove_file(dir.join("v1/content/a.txt")).unwrap();
        let out = validate(&dir);
        assert!(out.has_code("E921"));
    }

    #[test]
    fn corrupted_content_file_reported() {
        let tmp = TempDir::new().unwrap();
        let dir = objdir(&tmp);
        build_object(&dir);
        fs::write(dir.join("v1/content/a.txt"), b"tampered\n").unwrap();
        let out = validate(&dir);
        assert!(out.has_code("E922"));
    }

    #[test]
    fn corruption_missed_when_digest_checks_disabled() {
        let tmp = TempDir::new().unwrap();
        let dir = objdir(&tmp);
        build_object(&dir);
        fs::write(dir.join("v1/content/a.txt"), b"tampered\n").unwrap();
        let out = ObjectValidator::new(CodeCatalog::builtin())
            .with_options(ValidateOptions {
                check_digests: false,
                ..Default::default()
            })
            .validate(&dir)
            .unwrap();
        assert!(!out.has_code("E922"));
        assert!(out.is_valid());
    }

    #[test]
    fn orphan_content_file_reported() {
        let tmp = TempDir::new().unwrap();
        let dir = objdir(&tmp);
        build_object(&dir);
        fs::write(dir.join("v1/content/stray.txt"), b"stray").unwrap();
        let out = validate(&dir);
        assert!(out.has_code("E923"));
    }

    #[test]
    fn unexpected_file_in_version_dir_is_warning() {
        let tmp = TempDir::new().unwrap();
        let dir = objdir(&tmp);
        build_object(&dir);
        fs::write(dir.join("v1/notes.txt"), b"hi").unwrap();
        let out = validate(&dir);
        assert!(out.has_code("W902"));
        assert!(out.is_valid());
    }

    #[test]
    fn undeclared_version_dir_reported() {
        let tmp = TempDir::new().unwrap();
        let dir = objdir(&tmp);
        build_object(&dir);
        fs::create_dir(dir.join("v2")).unwrap();
        let out = validate(&dir);
        assert!(out.has_code("E936"));
    }

    #[test]
    fn extensions_dir_allowed() {
        let tmp = TempDir::new().unwrap();
        let dir = objdir(&tmp);
        build_object(&dir);
        fs::create_dir(dir.join("extensions")).unwrap();
        let out = validate(&dir);
        assert!(out.is_valid(), "{:?}", out.records());
    }

    #[test]
    fn missing_version_dir_reported() {
        let tmp = TempDir::new().unwrap();
        let dir = objdir(&tmp);
        let content = b"hello\n";
        let digest = sha512_of(content);
        fs::create_dir_all(dir.join("v1/content")).unwrap();
        fs::write(dir.join("v1/content/a.txt"), content).unwrap();
        fs::write(dir.join(OBJECT_DECLARATION), "ocfl_object_1.0\n").unwrap();
        let v1 = json!({
            "created": "2023-05-01T12:00:00Z",
            "message": "first",
            "user": {"name": "A", "address": "mailto:a@example.org"},
            "state": { digest.clone(): ["a.txt"] }
        });
        // v2 declared, directory never created. Same state so no new
        // content is expected.
        let mut v2 = v1.clone();
        v2["message"] = json!("second");
        let inv = json!({
            "id": "ark:/12345/obj1",
            "type": "https://ocfl.io/1.0/spec/#inventory",
            "digestAlgorithm": "sha512",
            "head": "v2",
            "manifest": { digest: ["v1/content/a.txt"] },
            "versions": {"v1": v1, "v2": v2}
        });
        write_inventory(&dir, &inv);
        let out = validate(&dir);
        assert!(out.has_code("E935"));
    }

    #[test]
    fn consistent_prior_inventory_passes() {
        let tmp = TempDir::new().unwrap();
        let dir = objdir(&tmp);
        build_object(&dir);
        // Copy the head inventory into v1, as the builder does.
        fs::copy(dir.join("inventory.json"), dir.join("v1/inventory.json")).unwrap();
        fs::copy(
            dir.join("inventory.json.sha512"),
            dir.join("v1/inventory.json.sha512"),
        )
        .unwrap();
        let out = validate(&dir);
        assert!(out.is_valid(), "{:?}", out.records());
    }

    #[test]
    fn rewritten_history_detected() {
        let tmp = TempDir::new().unwrap();
        let dir = objdir(&tmp);
        let inv = build_object(&dir);
        // The v1 inventory remembers a different commit message.
        let mut prior = inv.clone();
        prior["versions"]["v1"]["message"] = json!("original message");
        let bytes = serde_json::to_vec_pretty(&prior).unwrap();
        fs::write(dir.join("v1/inventory.json"), bytes).unwrap();
        let out = validate(&dir);
        assert!(out.has_code("E933"));
    }

    #[test]
    fn cancelled_run_is_marked_incomplete() {
        let tmp = TempDir::new().unwrap();
        let dir = objdir(&tmp);
        build_object(&dir);
        let cancel = CancelFlag::new();
        cancel.cancel();
        let out = ObjectValidator::new(CodeCatalog::builtin())
            .with_cancel(cancel)
            .validate(&dir)
            .unwrap();
        assert!(out.is_incomplete());
    }
}
