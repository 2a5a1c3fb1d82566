//! ocflkit - validate and build OCFL preservation storage
//!
//! ocflkit is a library and single-binary tool for the Oxford Common File
//! Layout: versioned, content-addressed object storage on a plain
//! filesystem. It validates objects and whole storage roots against the
//! OCFL 1.0 rules, creates new objects, and accretes versions onto
//! existing ones.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates)
//! - [`validate`] - Error-collecting object and storage root validation
//! - [`build`] - Object creation and version accretion, staged + renamed
//! - [`store`] - Storage root layout policies and initialization
//! - [`codes`] - Validation code catalog and outcome accumulator
//! - [`core`] - Domain types: digests, paths, versions, the inventory
//! - [`ui`] - Terminal output utilities
//!
//! # Correctness Invariants
//!
//! 1. Validation collects every finding; it never stops at the first
//!    problem, and only an untrustworthy inventory aborts an object
//! 2. Stored content is immutable: a new version adds files and a new
//!    inventory, it never rewrites an existing version directory
//! 3. Every mutation is staged in scratch space and lands by rename, so
//!    readers never observe a half-written object
//! 4. Content claimed as identical by digest is byte-compared before it
//!    is deduplicated

pub mod build;
pub mod cli;
pub mod codes;
pub mod core;
pub mod store;
pub mod ui;
pub mod validate;
