//! validate::inventory_check
//!
//! Error-collecting structural checks over a raw inventory document.
//!
//! # Architecture
//!
//! The validator cannot use the strict typed parse: one malformed field
//! must become one coded record while every other check still runs. So
//! this module walks a `serde_json::Value`, records findings into a
//! [`ValidationOutcome`], and returns a best-effort [`InventoryCheck`]
//! summary (algorithm, content directory, usable version sequence, content
//! path → digest map) that later filesystem stages consume even when
//! structural errors were collected.
//!
//! The prior-version consistency check also lives here: a version
//! inventory written at `vN` must be provably a prefix of the current
//! head inventory, or the object's history has been rewritten.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde_json::Value;

use crate::codes::ValidationOutcome;
use crate::core::digest::DigestAlgorithm;
use crate::core::inventory::{DEFAULT_CONTENT_DIRECTORY, SPEC_TYPE_1_0};
use crate::core::paths::{
    detect_collisions, validate_content_path, validate_logical_path, PathCollision,
};
use crate::core::versions::{validate_sequence, SequenceViolation, VersionNum};

/// Best-effort summary of a structurally checked inventory.
///
/// Fields hold whatever could be established; defaults (sha512, `content`)
/// stand in where the document was too broken to say, matching how
/// validation proceeds with degraded data rather than aborting.
#[derive(Debug, Clone)]
pub struct InventoryCheck {
    /// Location tag used as the `where` context of every record.
    pub location: String,
    /// Primary algorithm; sha512 until the inventory says otherwise.
    pub digest_algorithm: DigestAlgorithm,
    /// Content directory name with the default applied.
    pub content_directory: String,
    /// Declared head, when present and parseable.
    pub head: Option<VersionNum>,
    /// The usable in-order version sequence.
    pub all_versions: Vec<VersionNum>,
    /// Content path → digest for every manifest entry.
    pub manifest_files: BTreeMap<String, String>,
    value: Value,
}

impl InventoryCheck {
    fn new(location: &str, value: Value) -> Self {
        Self {
            location: location.to_string(),
            digest_algorithm: DigestAlgorithm::Sha512,
            content_directory: DEFAULT_CONTENT_DIRECTORY.to_string(),
            head: None,
            all_versions: Vec::new(),
            manifest_files: BTreeMap::new(),
            value,
        }
    }

    /// The raw version block for a version, if present.
    fn version_block(&self, version: VersionNum) -> Option<&Value> {
        self.value.get("versions")?.get(version.to_string())
    }

    /// Map of logical path → manifest content paths for one version.
    ///
    /// Used by the prior-version check to compare what each logical name
    /// resolved to at the time the earlier inventory was written.
    fn file_map(&self, version: VersionNum) -> BTreeMap<String, Vec<String>> {
        let mut map = BTreeMap::new();
        let Some(state) = self.version_block(version).and_then(|b| b.get("state")) else {
            return map;
        };
        let Some(state) = state.as_object() else {
            return map;
        };
        let manifest = self.value.get("manifest").and_then(|m| m.as_object());
        for (digest, paths) in state {
            let content: Vec<String> = manifest
                .and_then(|m| m.get(&digest.to_lowercase()).or_else(|| m.get(digest)))
                .and_then(|v| v.as_array())
                .map(|a| {
                    a.iter()
                        .filter_map(|p| p.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default();
            if let Some(paths) = paths.as_array() {
                for path in paths.iter().filter_map(|p| p.as_str()) {
                    map.insert(path.to_string(), content.clone());
                }
            }
        }
        map
    }

    /// Check that `prior`, a version inventory from an earlier version
    /// directory, is consistent with this (head) inventory.
    ///
    /// Every version the prior inventory records must exist here with an
    /// identical block, and the manifest entries its states reference must
    /// agree. Records E407-E411 and E933 on mismatch.
    pub fn validate_as_prior_version(
        &self,
        prior: &InventoryCheck,
        out: &mut ValidationOutcome,
    ) {
        let prior_head = prior
            .head
            .map(|v| v.to_string())
            .unwrap_or_else(|| "???".to_string());

        let ours: BTreeSet<VersionNum> = self.all_versions.iter().copied().collect();
        let theirs: BTreeSet<VersionNum> = prior.all_versions.iter().copied().collect();
        if !theirs.is_subset(&ours) {
            out.record(
                "E407",
                [
                    ("where", self.location.clone()),
                    ("prior_head", prior_head),
                ],
            );
            return;
        }

        let our_files: BTreeSet<&String> = self.manifest_files.keys().collect();
        let their_files: BTreeSet<&String> = prior.manifest_files.keys().collect();
        if !their_files.is_subset(&our_files) {
            out.record(
                "E408",
                [
                    ("where", self.location.clone()),
                    ("prior_head", prior_head),
                ],
            );
            return;
        }

        for version in &prior.all_versions {
            let prior_map = prior.file_map(*version);
            let self_map = self.file_map(*version);
            if prior_map.keys().ne(self_map.keys()) {
                out.record(
                    "E409",
                    [
                        ("where", self.location.clone()),
                        ("version", version.to_string()),
                        ("prior_head", prior_head.clone()),
                    ],
                );
            } else {
                for (path, prior_content) in &prior_map {
                    if self_map.get(path) != Some(prior_content) {
                        out.record(
                            "E411",
                            [
                                ("where", self.location.clone()),
                                ("version", version.to_string()),
                                ("path", path.clone()),
                                ("prior_head", prior_head.clone()),
                            ],
                        );
                    }
                }
            }

            // The metadata of a recorded version is part of history too.
            let prior_block = prior.version_block(*version);
            let self_block = self.version_block(*version);
            for key in ["created", "message", "user"] {
                let a = prior_block.and_then(|b| b.get(key));
                let b = self_block.and_then(|b| b.get(key));
                if a != b {
                    out.record(
                        "E933",
                        [
                            ("where", self.location.clone()),
                            ("version", version.to_string()),
                            ("key", key.to_string()),
                            ("prior_head", prior_head.clone()),
                        ],
                    );
                }
            }
        }
    }
}

/// Structurally check an inventory document, collecting coded records.
///
/// Mirrors the stage contract of the object validator: every violated rule
/// is one record, nothing aborts, and the returned summary carries the
/// best data the document supports.
pub fn check_inventory(
    value: &Value,
    location: &str,
    lax_digests: bool,
    out: &mut ValidationOutcome,
) -> InventoryCheck {
    let mut check = InventoryCheck::new(location, value.clone());
    let w = || ("where", location.to_string());

    check_id(value, location, out);
    check_type(value, location, out);
    check_algorithm(&mut check, value, lax_digests, out);
    check_content_directory(&mut check, value, out);

    match value.get("manifest") {
        None => out.record("E107", [w()]),
        Some(manifest) => check_manifest(&mut check, manifest, out),
    }

    let mut digests_used: BTreeSet<String> = BTreeSet::new();
    match value.get("versions") {
        None => out.record("E108", [w()]),
        Some(versions) => {
            check_version_sequence(&mut check, versions, out);
            digests_used = check_versions(&check, versions, out);
        }
    }

    check_head(&mut check, value, out);

    if value.get("manifest").is_some() && value.get("versions").is_some() {
        check_digests_present_and_used(&check, &digests_used, out);
    }

    if let Some(fixity) = value.get("fixity") {
        check_fixity(&check, fixity, out);
    }

    check
}

fn check_id(value: &Value, location: &str, out: &mut ValidationOutcome) {
    match value.get("id") {
        None => out.record("E100", [("where", location)]),
        Some(id) => match id.as_str() {
            None | Some("") => out.record("E101", [("where", location)]),
            Some(id) => {
                if !looks_like_uri(id) {
                    out.record("W207", [("where", location), ("id", id)]);
                }
            }
        },
    }
}

/// URI-shaped: a scheme of word characters, a colon, and a remainder.
fn looks_like_uri(id: &str) -> bool {
    match id.split_once(':') {
        Some((scheme, rest)) => {
            !scheme.is_empty()
                && !rest.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '+' || c == '-')
        }
        None => false,
    }
}

fn check_type(value: &Value, location: &str, out: &mut ValidationOutcome) {
    match value.get("type") {
        None => out.record("E102", [("where", location)]),
        Some(t) => {
            if t.as_str() != Some(SPEC_TYPE_1_0) {
                out.record(
                    "E103",
                    [("where", location.to_string()), ("got", render(t))],
                );
            }
        }
    }
}

fn check_algorithm(
    check: &mut InventoryCheck,
    value: &Value,
    lax_digests: bool,
    out: &mut ValidationOutcome,
) {
    let location = check.location.clone();
    match value.get("digestAlgorithm") {
        None => out.record("E104", [("where", location)]),
        Some(alg) => {
            let name = alg.as_str().unwrap_or_default();
            match DigestAlgorithm::from_str(name) {
                Ok(DigestAlgorithm::Sha512) => check.digest_algorithm = DigestAlgorithm::Sha512,
                Ok(alg) if lax_digests => check.digest_algorithm = alg,
                Ok(DigestAlgorithm::Sha256) => {
                    out.record("W206", [("where", location)]);
                    check.digest_algorithm = DigestAlgorithm::Sha256;
                }
                Ok(_) | Err(_) => out.record(
                    "E105",
                    [
                        ("where", location),
                        ("digest_algorithm", name.to_string()),
                    ],
                ),
            }
        }
    }
}

fn check_content_directory(
    check: &mut InventoryCheck,
    value: &Value,
    out: &mut ValidationOutcome,
) {
    if let Some(cd) = value.get("contentDirectory") {
        // Only adopt the value when it is safe to join onto paths.
        match cd.as_str() {
            Some(cd) if !cd.contains('/') && cd != "." && cd != ".." && !cd.is_empty() => {
                check.content_directory = cd.to_string();
            }
            _ => out.record("E051", [("where", check.location.clone())]),
        }
    }
}

fn check_manifest(check: &mut InventoryCheck, manifest: &Value, out: &mut ValidationOutcome) {
    let location = check.location.clone();
    let Some(manifest) = manifest.as_object() else {
        out.record("E307", [("where", location)]);
        return;
    };
    let mut seen_digests: BTreeSet<String> = BTreeSet::new();
    for (digest, paths) in manifest {
        if !digest_has_valid_form(digest, check.digest_algorithm) {
            out.record(
                "E304",
                [("where", location.clone()), ("digest", digest.clone())],
            );
            continue;
        }
        // JSON keys are unique as written, so digests differing only in
        // hex case have to be caught after normalization.
        let normalized = digest.to_lowercase();
        if !seen_digests.insert(normalized.clone()) {
            out.record(
                "E941",
                [("where", location.clone()), ("digest", normalized.clone())],
            );
            continue;
        }
        let Some(paths) = as_string_array(paths) else {
            out.record(
                "E308",
                [("where", location.clone()), ("digest", digest.clone())],
            );
            continue;
        };
        for path in paths {
            if validate_content_path(path, &check.content_directory).is_err() {
                out.record(
                    "E918",
                    [("where", location.clone()), ("path", path.to_string())],
                );
            }
            if let Some(previous) = check
                .manifest_files
                .insert(path.to_string(), normalized.clone())
            {
                if previous != normalized {
                    out.record(
                        "E940",
                        [("where", location.clone()), ("path", path.to_string())],
                    );
                }
            }
        }
    }
}

fn check_version_sequence(
    check: &mut InventoryCheck,
    versions: &Value,
    out: &mut ValidationOutcome,
) {
    let location = check.location.clone();
    let Some(versions) = versions.as_object() else {
        out.record("E310", [("where", location)]);
        return;
    };
    let names: Vec<&str> = versions.keys().map(String::as_str).collect();
    let sequence = validate_sequence(&names);
    for violation in &sequence.violations {
        match violation {
            SequenceViolation::Unparseable { name } => out.record(
                "E942",
                [("where", location.clone()), ("name", name.clone())],
            ),
            SequenceViolation::MissingFirst => out.record("E311", [("where", location.clone())]),
            SequenceViolation::Gap { missing } => out.record(
                "E312",
                [
                    ("where", location.clone()),
                    ("missing", format!("v{missing}")),
                ],
            ),
            SequenceViolation::Duplicate { first, second } => out.record(
                "E939",
                [
                    ("where", location.clone()),
                    ("first", first.clone()),
                    ("second", second.clone()),
                ],
            ),
            SequenceViolation::MixedPadding {
                name,
                expected_width,
            } => out.record(
                "E938",
                [
                    ("where", location.clone()),
                    ("version", name.clone()),
                    ("width", expected_width.to_string()),
                ],
            ),
            SequenceViolation::ZeroPadded { width } => out.record(
                "W203",
                [("where", location.clone()), ("width", width.to_string())],
            ),
        }
    }
    check.all_versions = sequence.versions;
}

fn check_versions(
    check: &InventoryCheck,
    versions: &Value,
    out: &mut ValidationOutcome,
) -> BTreeSet<String> {
    let location = &check.location;
    let mut digests_used = BTreeSet::new();
    for version in &check.all_versions {
        let name = version.to_string();
        let Some(block) = versions.get(&name) else {
            continue;
        };
        if !block.is_object() {
            out.record(
                "E943",
                [("where", location.clone()), ("version", name.clone())],
            );
            continue;
        }

        check_created(block, location, &name, out);

        match block.get("state") {
            None => out.record(
                "E410",
                [("where", location.clone()), ("version", name.clone())],
            ),
            Some(state) => {
                digests_used.extend(check_state_block(check, state, &name, out));
            }
        }

        match block.get("message") {
            None => out.record(
                "W201",
                [("where", location.clone()), ("version", name.clone())],
            ),
            Some(message) if !message.is_string() => out.record(
                "E403",
                [("where", location.clone()), ("version", name.clone())],
            ),
            Some(_) => {}
        }

        check_user(block, location, &name, out);
    }
    digests_used
}

fn check_created(block: &Value, location: &str, version: &str, out: &mut ValidationOutcome) {
    let Some(created) = block.get("created").and_then(|c| c.as_str()) else {
        out.record("E401", [("where", location), ("version", version)]);
        return;
    };
    if chrono::DateTime::parse_from_rfc3339(created).is_ok() {
        return;
    }
    // A timestamp that parses without a timezone or without seconds is a
    // warning; anything else is an error.
    let naive_ok = NaiveDateTime::parse_from_str(created, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(created, "%Y-%m-%dT%H:%M:%S%.f"))
        .is_ok();
    if naive_ok {
        out.record("W208", [("where", location), ("version", version)]);
        return;
    }
    if NaiveDateTime::parse_from_str(created, "%Y-%m-%dT%H:%M").is_ok() {
        out.record("W208", [("where", location), ("version", version)]);
        out.record("W209", [("where", location), ("version", version)]);
        return;
    }
    out.record(
        "E402",
        [
            ("where", location.to_string()),
            ("version", version.to_string()),
            ("description", created.to_string()),
        ],
    );
}

fn check_user(block: &Value, location: &str, version: &str, out: &mut ValidationOutcome) {
    match block.get("user") {
        None => out.record("W202", [("where", location), ("version", version)]),
        Some(user) => match user.as_object() {
            None => out.record("E404", [("where", location), ("version", version)]),
            Some(user) => {
                if !user.get("name").map(|n| n.is_string()).unwrap_or(false) {
                    out.record("E405", [("where", location), ("version", version)]);
                }
                match user.get("address") {
                    None => out.record("W210", [("where", location), ("version", version)]),
                    Some(address) if !address.is_string() => {
                        out.record("E406", [("where", location), ("version", version)])
                    }
                    Some(_) => {}
                }
            }
        },
    }
}

/// Check one state block; returns the digests it references.
fn check_state_block(
    check: &InventoryCheck,
    state: &Value,
    version: &str,
    out: &mut ValidationOutcome,
) -> BTreeSet<String> {
    let location = &check.location;
    let mut digests = BTreeSet::new();
    let Some(state) = state.as_object() else {
        out.record(
            "E912",
            [("where", location.clone()), ("version", version.to_string())],
        );
        return digests;
    };

    let mut logical_paths: Vec<String> = Vec::new();
    for (digest, paths) in state {
        if !digest_has_valid_form(digest, check.digest_algorithm) {
            out.record(
                "E305",
                [("where", location.clone()), ("digest", digest.clone())],
            );
            continue;
        }
        digests.insert(digest.to_lowercase());
        let Some(paths) = as_string_array(paths) else {
            out.record(
                "E912",
                [("where", location.clone()), ("version", version.to_string())],
            );
            continue;
        };
        for path in paths {
            if validate_logical_path(path).is_err() {
                out.record(
                    "E944",
                    [
                        ("where", location.clone()),
                        ("version", version.to_string()),
                        ("path", path.to_string()),
                    ],
                );
                continue;
            }
            if logical_paths.iter().any(|p| p == path) {
                out.record(
                    "E915",
                    [
                        ("where", location.clone()),
                        ("version", version.to_string()),
                        ("path", path.to_string()),
                    ],
                );
            }
            logical_paths.push(path.to_string());
        }
    }

    for collision in detect_collisions(logical_paths.iter().map(String::as_str)) {
        match collision {
            PathCollision::CaseFold { first, second } => out.record(
                "E916",
                [
                    ("where", location.clone()),
                    ("version", version.to_string()),
                    ("first", first),
                    ("second", second),
                ],
            ),
            PathCollision::AncestorOverlap {
                ancestor,
                descendant,
            } => out.record(
                "E917",
                [
                    ("where", location.clone()),
                    ("version", version.to_string()),
                    ("ancestor", ancestor),
                    ("descendant", descendant),
                ],
            ),
        }
    }

    digests
}

fn check_head(check: &mut InventoryCheck, value: &Value, out: &mut ValidationOutcome) {
    let location = check.location.clone();
    let Some(head) = value.get("head") else {
        out.record("E106", [("where", location)]);
        return;
    };
    let declared = head.as_str().and_then(|h| h.parse::<VersionNum>().ok());
    check.head = declared;
    if let Some(max) = check.all_versions.last() {
        if declared != Some(*max) {
            out.record(
                "E914",
                [
                    ("where", location),
                    ("got", render(head)),
                    ("expected", max.to_string()),
                ],
            );
        }
    }
}

fn check_digests_present_and_used(
    check: &InventoryCheck,
    digests_used: &BTreeSet<String>,
    out: &mut ValidationOutcome,
) {
    let manifest_digests: BTreeSet<&String> = check.manifest_files.values().collect();

    for digest in digests_used {
        if !manifest_digests.contains(digest) {
            out.record(
                "E913",
                [
                    ("where", check.location.clone()),
                    ("version", "???".to_string()),
                    ("digest", digest.clone()),
                ],
            );
        }
    }

    let unused: Vec<&str> = manifest_digests
        .iter()
        .filter(|d| !digests_used.contains(d.as_str()))
        .map(|d| d.as_str())
        .collect();
    if !unused.is_empty() {
        out.record(
            "E302",
            [
                ("where", check.location.clone()),
                ("digests", unused.join(", ")),
            ],
        );
    }
}

fn check_fixity(check: &InventoryCheck, fixity: &Value, out: &mut ValidationOutcome) {
    let location = &check.location;
    let Some(fixity) = fixity.as_object() else {
        out.record("E919", [("where", location.clone())]);
        return;
    };
    for (algorithm, digests) in fixity {
        let known = DigestAlgorithm::from_str(algorithm).ok();
        if known.is_none() {
            out.record(
                "W211",
                [
                    ("where", location.clone()),
                    ("algorithm", algorithm.clone()),
                ],
            );
        }
        let Some(digests) = digests.as_object() else {
            out.record("E919", [("where", location.clone())]);
            continue;
        };
        for (digest, paths) in digests {
            if let Some(alg) = known {
                if !digest_has_valid_form(digest, alg) {
                    out.record("E919", [("where", location.clone())]);
                    continue;
                }
            }
            let Some(paths) = as_string_array(paths) else {
                out.record("E919", [("where", location.clone())]);
                continue;
            };
            for path in paths {
                if !check.manifest_files.contains_key(path) {
                    out.record(
                        "E920",
                        [("where", location.clone()), ("path", path.to_string())],
                    );
                }
            }
        }
    }
}

fn digest_has_valid_form(digest: &str, alg: DigestAlgorithm) -> bool {
    digest.len() == alg.hex_len() && digest.bytes().all(|b| b.is_ascii_hexdigit())
}

fn as_string_array(value: &Value) -> Option<Vec<&str>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str())
        .collect::<Option<Vec<&str>>>()
}

fn render(value: &Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}
