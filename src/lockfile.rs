//! The installed-package ledger (tooth.lock)
//!
//! One lock document per working directory records which package+variant
//! combinations are currently installed, each entry carrying the full
//! manifest it was installed from. The lock is loaded at the start of every
//! mutating operation and persisted at its end, per package rather than per
//! batch, so an interrupted multi-package run leaves a ledger consistent
//! with the work actually completed.

use crate::manifest::PackageManifest;
use crate::specifier::PackageIdentifier;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Lock schema version.
pub const LOCK_FORMAT_VERSION: u32 = 3;

/// Lock schema identity. Own namespace, distinct from the manifest's.
pub const LOCK_FORMAT_UUID: &str = "c9cb4f80-1e11-4b31-a5f2-4b2f6dee0e3f";

/// One installed package+variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockEntry {
    pub package: PackageManifest,
    pub variant_label: String,
    pub locked: bool,
}

/// The whole lock document.
///
/// Invariant: at most one entry per (tooth, variant_label) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageLock {
    pub format_version: u32,
    pub format_uuid: String,
    pub locks: Vec<LockEntry>,
}

impl PackageLock {
    pub fn new() -> Self {
        Self {
            format_version: LOCK_FORMAT_VERSION,
            format_uuid: LOCK_FORMAT_UUID.to_string(),
            locks: Vec::new(),
        }
    }

    /// Load the lock document, or an empty default when the file is absent.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::new());
        }

        let bytes = fs::read(path)?;
        let lock: PackageLock = serde_json::from_slice(&bytes)
            .map_err(|e| Error::Other(format!("failed to decode tooth.lock: {}", e)))?;

        if lock.format_version != LOCK_FORMAT_VERSION || lock.format_uuid != LOCK_FORMAT_UUID {
            return Err(Error::Other(format!(
                "tooth.lock has unsupported format {}/{}",
                lock.format_version, lock.format_uuid
            )));
        }

        Ok(lock)
    }

    /// Persist the lock document as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path.as_ref(), serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    /// Manifest installed for the given package+variant, if any.
    pub fn installed_manifest(&self, identifier: &PackageIdentifier) -> Option<&PackageManifest> {
        self.locks
            .iter()
            .find(|entry| {
                entry.package.tooth == identifier.tooth
                    && entry.variant_label == identifier.variant_label
            })
            .map(|entry| &entry.package)
    }

    /// Record an installed package+variant, replacing any previous entry for
    /// the same identity so the one-entry-per-pair invariant holds.
    pub fn add_entry(&mut self, package: PackageManifest, variant_label: &str, locked: bool) {
        self.locks.retain(|entry| {
            !(entry.package.tooth == package.tooth && entry.variant_label == variant_label)
        });
        self.locks.push(LockEntry {
            package,
            variant_label: variant_label.to_string(),
            locked,
        });
    }

    /// Drop the entry for a package+variant. Returns whether one existed.
    pub fn remove_entry(&mut self, identifier: &PackageIdentifier) -> bool {
        let before = self.locks.len();
        self.locks.retain(|entry| {
            !(entry.package.tooth == identifier.tooth
                && entry.variant_label == identifier.variant_label)
        });
        self.locks.len() != before
    }
}

impl Default for PackageLock {
    fn default() -> Self {
        Self::new()
    }
}
