//! validate
//!
//! Validation of OCFL objects and storage roots.
//!
//! # Architecture
//!
//! Validation is error-collecting: every violated rule becomes one coded
//! record in a [`crate::codes::ValidationOutcome`] and checking continues,
//! maximizing diagnostic yield. Only two conditions short-circuit an
//! object: a missing inventory and a sidecar digest mismatch, because
//! nothing downstream can be trusted without the inventory.
//!
//! - [`inventory_check`] - structural + prior-version inventory checks
//! - [`object`] - the per-object stage machine
//! - [`root`] - storage root enumeration and aggregation

pub mod inventory_check;
pub mod object;
pub mod root;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

/// Errors for conditions where validation cannot even start.
///
/// Expected violations never surface here; they are outcome records.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: String,
        source: std::io::Error,
    },
}

/// Options shared by the object and root validators.
#[derive(Debug, Clone, Copy)]
pub struct ValidateOptions {
    /// Accept any registered digest algorithm as the primary one.
    pub lax_digests: bool,
    /// Recompute content digests. Disabling skips the expensive stage but
    /// still checks file presence and orphans.
    pub check_digests: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            lax_digests: false,
            check_digests: true,
        }
    }
}

/// Cooperative cancellation checked between validation stages.
///
/// Cancelling returns the partial outcome accumulated so far, marked
/// incomplete, rather than discarding it.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request termination at the next stage boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
