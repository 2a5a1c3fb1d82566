//! build
//!
//! Creation of OCFL objects and accretion of new versions.
//!
//! # Architecture
//!
//! Every mutation is staged in a scratch directory next to the target and
//! lands with `rename`, so a crash never leaves a half-written object or
//! version behind. For a new version the version directory is renamed
//! into place first and the root inventory swapped last; the inventory
//! swap is the commit point.
//!
//! Content is addressed by digest: a source file whose digest already
//! appears in the manifest stores no new bytes, only a state entry. The
//! byte-compare guard against digest collisions is unconditional, even
//! for strong algorithms; a collision aborts the whole operation because
//! silently mapping two different byte streams to one stored file would
//! corrupt history.
//!
//! Concurrent writers to one object are the caller's problem: the object
//! directory must have a single writer at a time. Readers are safe at any
//! point because of the rename ordering.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Utc};
use tempfile::{NamedTempFile, TempDir};
use thiserror::Error;

use crate::core::digest::{digest_bytes, digest_file, DigestAlgorithm, DigestError};
use crate::core::inventory::{
    DigestMap, Inventory, InventoryError, User, VersionEntry, DEFAULT_CONTENT_DIRECTORY,
    INVENTORY_FILENAME, SPEC_TYPE_1_0,
};
use crate::core::object_paths::{ObjectPaths, OBJECT_DECLARATION};
use crate::core::paths::{detect_collisions, validate_logical_path, PathCollision, PathError};
use crate::core::versions::VersionNum;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid logical path {path}: {source}")]
    InvalidLogicalPath { path: String, source: PathError },

    #[error("logical path {path} supplied more than once")]
    DuplicateLogicalPath { path: String },

    #[error("logical paths {first} and {second} conflict")]
    LogicalPathConflict { first: String, second: String },

    #[error("content directory name {name} is not a single safe path segment")]
    InvalidContentDirectory { name: String },

    #[error("object directory {path} already exists")]
    ObjectExists { path: String },

    #[error("no OCFL object at {path}")]
    MissingObject { path: String },

    /// The version number no longer fits the object's zero-padding width.
    /// Writing it anyway would change the naming convention mid-sequence.
    #[error("version v{version} does not fit the zero-padding width of {padding} digits")]
    PaddingExhausted { version: u32, padding: usize },

    /// Two different byte streams produced the same digest. Storing either
    /// would silently alias the other, so the operation is aborted.
    #[error("digest collision on {digest}: stored {existing} differs from incoming {incoming}")]
    ContentCollision {
        digest: String,
        existing: String,
        incoming: String,
    },

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    Digest(#[from] DigestError),

    #[error("i/o failure at {path}: {source}")]
    Io { path: String, source: io::Error },
}

/// Metadata recorded in the version block being written.
#[derive(Debug, Clone, Default)]
pub struct VersionMetadata {
    /// Creation timestamp; now() when absent.
    pub created: Option<DateTime<FixedOffset>>,
    pub message: Option<String>,
    pub user: Option<User>,
}

impl VersionMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn user(mut self, name: impl Into<String>, address: Option<String>) -> Self {
        self.user = Some(User {
            name: name.into(),
            address,
        });
        self
    }

    pub fn created(mut self, created: DateTime<FixedOffset>) -> Self {
        self.created = Some(created);
        self
    }
}

/// One file going into a version: where it lives now and the logical path
/// it should have in the version state.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub logical_path: String,
    pub path: PathBuf,
}

impl SourceFile {
    pub fn new(logical_path: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            logical_path: logical_path.into(),
            path: path.into(),
        }
    }
}

/// Builds OCFL objects: `create` for v1, `add_version` for accretion.
#[derive(Debug, Clone)]
pub struct ObjectBuilder {
    digest_algorithm: DigestAlgorithm,
    content_directory: String,
    padding: usize,
    fixity: Vec<DigestAlgorithm>,
}

impl Default for ObjectBuilder {
    fn default() -> Self {
        Self {
            digest_algorithm: DigestAlgorithm::Sha512,
            content_directory: DEFAULT_CONTENT_DIRECTORY.to_string(),
            padding: 0,
            fixity: Vec::new(),
        }
    }
}

impl ObjectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Primary digest algorithm for a newly created object. Existing
    /// objects keep the algorithm their inventory declares.
    pub fn digest_algorithm(mut self, alg: DigestAlgorithm) -> Self {
        self.digest_algorithm = alg;
        self
    }

    pub fn content_directory(mut self, name: impl Into<String>) -> Self {
        self.content_directory = name.into();
        self
    }

    /// Zero-padding width for version names; 0 means unpadded.
    pub fn padding(mut self, padding: usize) -> Self {
        self.padding = padding;
        self
    }

    /// Additional algorithms recorded in the fixity block for every new
    /// content file.
    pub fn fixity(mut self, algs: impl IntoIterator<Item = DigestAlgorithm>) -> Self {
        self.fixity = algs.into_iter().collect();
        self
    }

    /// Create a new object at `objdir` with `sources` as version 1.
    ///
    /// The object is staged in a scratch directory beside `objdir` and
    /// moved into place with one rename.
    pub fn create(
        &self,
        id: &str,
        sources: &[SourceFile],
        metadata: VersionMetadata,
        objdir: &Path,
    ) -> Result<Inventory, BuildError> {
        if objdir.exists() {
            return Err(BuildError::ObjectExists {
                path: objdir.display().to_string(),
            });
        }
        check_content_directory(&self.content_directory)?;
        check_sources(sources)?;

        let version = VersionNum::with_padding(1, self.padding);
        if !version.fits_padding() {
            return Err(BuildError::PaddingExhausted {
                version: version.num,
                padding: version.padding,
            });
        }
        let plan = self.plan_version(None, sources, version)?;
        let content_directory = if self.content_directory == DEFAULT_CONTENT_DIRECTORY {
            None
        } else {
            Some(self.content_directory.clone())
        };
        let mut versions = BTreeMap::new();
        versions.insert(version, version_entry(metadata, plan.state));
        let inventory = Inventory {
            id: id.to_string(),
            spec_type: SPEC_TYPE_1_0.to_string(),
            digest_algorithm: self.digest_algorithm,
            head: version,
            content_directory,
            manifest: plan.manifest,
            versions,
            fixity: self.compute_fixity(None, &plan.new_content)?,
        };

        let parent = object_parent(objdir)?;
        let staging = scratch_dir(parent)?;
        let obj_stage = staging.path().join("object");
        let io_err = io_error_for(&obj_stage);

        fs::create_dir(&obj_stage).map_err(&io_err)?;
        let decl_body = format!("{}\n", &OBJECT_DECLARATION["0=".len()..]);
        fs::write(ObjectPaths::new(&obj_stage).declaration(), decl_body).map_err(&io_err)?;
        stage_content(&obj_stage, &plan.new_content)?;
        write_inventory_files(&inventory, &obj_stage)?;
        write_inventory_files(&inventory, &obj_stage.join(version.to_string()))?;

        fs::rename(&obj_stage, objdir).map_err(io_error_for(objdir))?;
        Ok(inventory)
    }

    /// Add a new version to the object at `objdir`.
    ///
    /// The version directory is renamed into place first; swapping the
    /// root inventory is the commit point, so a reader never observes a
    /// head without its content.
    pub fn add_version(
        &self,
        objdir: &Path,
        sources: &[SourceFile],
        metadata: VersionMetadata,
    ) -> Result<Inventory, BuildError> {
        let inventory_path = ObjectPaths::new(objdir).inventory();
        if !inventory_path.is_file() {
            return Err(BuildError::MissingObject {
                path: objdir.display().to_string(),
            });
        }
        check_sources(sources)?;

        let bytes = fs::read(&inventory_path).map_err(io_error_for(&inventory_path))?;
        let mut inventory = Inventory::parse(&bytes)?;
        let version = inventory.head.next();
        if !version.fits_padding() {
            return Err(BuildError::PaddingExhausted {
                version: version.num,
                padding: version.padding,
            });
        }
        let plan = self.plan_version(Some((&inventory, objdir)), sources, version)?;

        let fixity = self.compute_fixity(inventory.fixity.take(), &plan.new_content)?;
        inventory.manifest = plan.manifest;
        inventory
            .versions
            .insert(version, version_entry(metadata, plan.state));
        inventory.head = version;
        inventory.fixity = fixity;

        let parent = object_parent(objdir)?;
        let staging = scratch_dir(parent)?;
        let version_stage = staging.path().join(version.to_string());
        fs::create_dir(&version_stage).map_err(io_error_for(&version_stage))?;
        stage_content(staging.path(), &plan.new_content)?;
        write_inventory_files(&inventory, &version_stage)?;

        let version_dir = objdir.join(version.to_string());
        fs::rename(&version_stage, &version_dir).map_err(io_error_for(&version_dir))?;
        write_inventory_atomic(&inventory, objdir)?;
        Ok(inventory)
    }

    /// Digest sources and split them into state entries, manifest
    /// additions, and the files that actually need storing.
    fn plan_version(
        &self,
        existing: Option<(&Inventory, &Path)>,
        sources: &[SourceFile],
        version: VersionNum,
    ) -> Result<VersionPlan, BuildError> {
        let (alg, content_dir, mut manifest) = match existing {
            Some((inv, _)) => (
                inv.digest_algorithm,
                inv.content_directory().to_string(),
                inv.manifest.clone(),
            ),
            None => (
                self.digest_algorithm,
                self.content_directory.clone(),
                DigestMap::new(),
            ),
        };

        let mut ordered: Vec<&SourceFile> = sources.iter().collect();
        ordered.sort_by(|a, b| a.logical_path.cmp(&b.logical_path));

        let mut state = DigestMap::new();
        let mut new_content: Vec<(String, PathBuf)> = Vec::new();
        let mut new_by_digest: BTreeMap<String, PathBuf> = BTreeMap::new();
        for source in ordered {
            let digest = digest_file(alg, &source.path)?;

            if let Some((inv, objdir)) = existing {
                if let Some(stored) = inv.content_paths_for(&digest).and_then(|p| p.first()) {
                    // Digest already stored; prove byte identity before
                    // reusing it.
                    self.guard_collision(&digest, &objdir.join(stored), stored, source)?;
                    state.entry(digest).or_default().push(source.logical_path.clone());
                    continue;
                }
            }
            if let Some(first) = new_by_digest.get(&digest) {
                let existing_path = first.display().to_string();
                self.guard_collision(&digest, first, &existing_path, source)?;
                state.entry(digest).or_default().push(source.logical_path.clone());
                continue;
            }

            let content_path = format!("{version}/{content_dir}/{}", source.logical_path);
            manifest.insert(digest.clone(), vec![content_path.clone()]);
            new_by_digest.insert(digest.clone(), source.path.clone());
            new_content.push((content_path, source.path.clone()));
            state.entry(digest).or_default().push(source.logical_path.clone());
        }
        Ok(VersionPlan {
            state,
            manifest,
            new_content,
        })
    }

    fn guard_collision(
        &self,
        digest: &str,
        stored: &Path,
        stored_label: &str,
        source: &SourceFile,
    ) -> Result<(), BuildError> {
        if files_identical(stored, &source.path)? {
            Ok(())
        } else {
            Err(BuildError::ContentCollision {
                digest: digest.to_string(),
                existing: stored_label.to_string(),
                incoming: source.logical_path.clone(),
            })
        }
    }

    /// Fixity digests for the newly stored files, merged into any
    /// existing fixity block.
    fn compute_fixity(
        &self,
        existing: Option<BTreeMap<String, DigestMap>>,
        new_content: &[(String, PathBuf)],
    ) -> Result<Option<BTreeMap<String, DigestMap>>, BuildError> {
        let mut fixity = existing.unwrap_or_default();
        for alg in &self.fixity {
            let entry = fixity.entry(alg.name().to_string()).or_default();
            for (content_path, source) in new_content {
                let digest = digest_file(*alg, source)?;
                entry.entry(digest).or_default().push(content_path.clone());
            }
        }
        if fixity.is_empty() {
            Ok(None)
        } else {
            Ok(Some(fixity))
        }
    }
}

struct VersionPlan {
    state: DigestMap,
    manifest: DigestMap,
    new_content: Vec<(String, PathBuf)>,
}

fn version_entry(metadata: VersionMetadata, state: DigestMap) -> VersionEntry {
    VersionEntry {
        created: metadata
            .created
            .unwrap_or_else(|| Utc::now().fixed_offset()),
        message: metadata.message,
        user: metadata.user,
        state,
    }
}

fn check_sources(sources: &[SourceFile]) -> Result<(), BuildError> {
    let mut seen: Vec<&str> = Vec::new();
    for source in sources {
        validate_logical_path(&source.logical_path).map_err(|source_err| {
            BuildError::InvalidLogicalPath {
                path: source.logical_path.clone(),
                source: source_err,
            }
        })?;
        if seen.contains(&source.logical_path.as_str()) {
            return Err(BuildError::DuplicateLogicalPath {
                path: source.logical_path.clone(),
            });
        }
        seen.push(&source.logical_path);
    }
    if let Some(collision) = detect_collisions(seen.iter().copied()).into_iter().next() {
        let (first, second) = match collision {
            PathCollision::CaseFold { first, second } => (first, second),
            PathCollision::AncestorOverlap {
                ancestor,
                descendant,
            } => (ancestor, descendant),
        };
        return Err(BuildError::LogicalPathConflict { first, second });
    }
    Ok(())
}

fn check_content_directory(name: &str) -> Result<(), BuildError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\');
    if bad {
        Err(BuildError::InvalidContentDirectory {
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}

fn object_parent(objdir: &Path) -> Result<&Path, BuildError> {
    let parent = match objdir.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !parent.is_dir() {
        fs::create_dir_all(parent).map_err(io_error_for(parent))?;
    }
    Ok(parent)
}

fn scratch_dir(parent: &Path) -> Result<TempDir, BuildError> {
    tempfile::Builder::new()
        .prefix(".ocfl-staging-")
        .tempdir_in(parent)
        .map_err(io_error_for(parent))
}

/// Copy planned content into `base` under its content paths.
fn stage_content(base: &Path, new_content: &[(String, PathBuf)]) -> Result<(), BuildError> {
    for (content_path, source) in new_content {
        let dest = base.join(content_path);
        if let Some(dir) = dest.parent() {
            fs::create_dir_all(dir).map_err(io_error_for(dir))?;
        }
        fs::copy(source, &dest).map_err(io_error_for(&dest))?;
    }
    Ok(())
}

/// Write inventory.json and its sidecar into `dir`.
fn write_inventory_files(inventory: &Inventory, dir: &Path) -> Result<(), BuildError> {
    if !dir.is_dir() {
        fs::create_dir_all(dir).map_err(io_error_for(dir))?;
    }
    let bytes = inventory.to_json_bytes()?;
    let inv_path = dir.join(INVENTORY_FILENAME);
    fs::write(&inv_path, &bytes).map_err(io_error_for(&inv_path))?;
    let digest = digest_bytes(inventory.digest_algorithm, &bytes);
    let sidecar_path = dir.join(inventory.sidecar_name());
    fs::write(&sidecar_path, format!("{digest} {INVENTORY_FILENAME}\n"))
        .map_err(io_error_for(&sidecar_path))?;
    Ok(())
}

/// Replace the root inventory and sidecar via temp file + rename.
fn write_inventory_atomic(inventory: &Inventory, objdir: &Path) -> Result<(), BuildError> {
    let bytes = inventory.to_json_bytes()?;
    let digest = digest_bytes(inventory.digest_algorithm, &bytes);
    let paths = ObjectPaths::new(objdir);
    persist_atomic(objdir, &paths.inventory(), &bytes)?;
    persist_atomic(
        objdir,
        &paths.sidecar(inventory.digest_algorithm),
        format!("{digest} {INVENTORY_FILENAME}\n").as_bytes(),
    )
}

fn persist_atomic(dir: &Path, dest: &Path, bytes: &[u8]) -> Result<(), BuildError> {
    let mut tmp = NamedTempFile::new_in(dir).map_err(io_error_for(dir))?;
    tmp.write_all(bytes).map_err(io_error_for(dest))?;
    tmp.persist(dest)
        .map_err(|err| BuildError::Io {
            path: dest.display().to_string(),
            source: err.error,
        })?;
    Ok(())
}

/// Streaming byte comparison, cheap length check first.
fn files_identical(a: &Path, b: &Path) -> Result<bool, BuildError> {
    let len_a = fs::metadata(a).map_err(io_error_for(a))?.len();
    let len_b = fs::metadata(b).map_err(io_error_for(b))?.len();
    if len_a != len_b {
        return Ok(false);
    }
    let mut reader_a = BufReader::new(File::open(a).map_err(io_error_for(a))?);
    let mut reader_b = BufReader::new(File::open(b).map_err(io_error_for(b))?);
    let mut buf_a = [0u8; 64 * 1024];
    let mut buf_b = [0u8; 64 * 1024];
    loop {
        let n = read_full(&mut reader_a, &mut buf_a).map_err(io_error_for(a))?;
        let m = read_full(&mut reader_b, &mut buf_b).map_err(io_error_for(b))?;
        if n != m || buf_a[..n] != buf_b[..m] {
            return Ok(false);
        }
        if n == 0 {
            return Ok(true);
        }
    }
}

/// Read as much as fits in `buf`, stopping only at EOF.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

fn io_error_for(path: &Path) -> impl Fn(io::Error) -> BuildError + '_ {
    move |source| BuildError::Io {
        path: path.display().to_string(),
        source,
    }
}
