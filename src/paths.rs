//! Deterministic path computation for caches, manifests and lock files
//!
//! Everything here is purely syntactic: no path touches the filesystem.
//! Cache entries for arbitrary URLs and package names become single
//! directory names through percent-escaping, which keeps them filesystem-legal
//! and collision-resistant:
//!
//! ```text
//! <cache_root>/assets/https%3A%2F%2Fexample.com%2Fasset%3Fv%3D1/
//! <cache_root>/packages/example.com%2Fpkg%400.1.0/
//! ```

use crate::manifest::{Placement, PlacementKind, MANIFEST_FILE_NAME};
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Fixed lock filename inside a working directory.
pub const LOCK_FILE_NAME: &str = "tooth.lock";

/// Percent-escape a string into a single safe path segment.
///
/// Every character outside the unreserved set (letters, digits, `-`, `.`,
/// `_`, `~`) becomes `%XX` with uppercase hex. Deterministic and purely
/// syntactic; `""` stays `""`.
pub fn escape(text: &str) -> String {
    urlencoding::encode(text).into_owned()
}

/// Computes filesystem locations from a working directory and an optional
/// cache root. Cache-derived paths fail with [`Error::CacheNotConfigured`]
/// until a cache root is provided.
#[derive(Debug, Clone)]
pub struct PathResolver {
    working_dir: PathBuf,
    cache_root: Option<PathBuf>,
}

impl PathResolver {
    pub fn new(working_dir: impl Into<PathBuf>, cache_root: Option<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            cache_root,
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// The configured cache root, verbatim.
    pub fn base_cache_dir(&self) -> Result<&Path> {
        self.cache_root
            .as_deref()
            .ok_or(Error::CacheNotConfigured)
    }

    pub fn base_asset_cache_dir(&self) -> Result<PathBuf> {
        Ok(self.base_cache_dir()?.join("assets"))
    }

    pub fn base_package_cache_dir(&self) -> Result<PathBuf> {
        Ok(self.base_cache_dir()?.join("packages"))
    }

    /// Cache directory for a downloaded asset URL.
    pub fn asset_cache_dir(&self, url: &str) -> Result<PathBuf> {
        Ok(self.base_asset_cache_dir()?.join(escape(url)))
    }

    /// Cache directory for a package payload, keyed by specifier text.
    pub fn package_cache_dir(&self, name: &str) -> Result<PathBuf> {
        Ok(self.base_package_cache_dir()?.join(escape(name)))
    }

    /// tooth.json in the working directory.
    pub fn manifest_path(&self) -> PathBuf {
        self.working_dir.join(MANIFEST_FILE_NAME)
    }

    /// tooth.lock in the working directory.
    pub fn lock_path(&self) -> PathBuf {
        self.working_dir.join(LOCK_FILE_NAME)
    }

    /// Destination of a file-source entry under a placement rule, relative
    /// to the working directory. `None` means the entry does not fall under
    /// the rule and is skipped, which is not an error.
    pub fn placement_relative_path(place: &Placement, entry_key: &str) -> Option<String> {
        match place.kind {
            PlacementKind::File => {
                if entry_key == place.src {
                    Some(place.dest.clone())
                } else {
                    None
                }
            }
            PlacementKind::Dir => {
                let src = place.src.trim_end_matches('/');
                let remainder = if src.is_empty() {
                    entry_key
                } else {
                    entry_key.strip_prefix(src)?.strip_prefix('/')?
                };

                if remainder.is_empty() {
                    return None;
                }

                if place.dest.is_empty() {
                    Some(remainder.to_string())
                } else {
                    Some(format!("{}/{}", place.dest.trim_end_matches('/'), remainder))
                }
            }
        }
    }
}
