//! toothpm - a manifest-driven package manager
//!
//! toothpm installs, uninstalls, and tracks versioned packages ("teeth")
//! described by declarative JSON manifests. It provides:
//!
//! - Per-package variant selection by label and target platform
//! - Asset fetching and caching for tar/tar.gz/zip archives, standalone
//!   files, and a package's own payload
//! - Lifecycle scripts around install and uninstall
//! - Dependency-aware ordering of multi-package batches
//! - A per-working-directory installation ledger (`tooth.lock`)
//!
//! # Examples
//!
//! ```no_run
//! use toothpm::{AssetCache, Config, PackageInstaller, PathResolver, ShellScriptRunner};
//! use toothpm::installer::InstallOptions;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?;
//! let paths = PathResolver::new(std::env::current_dir()?, Some(config.cache_root()?));
//! let cache = AssetCache::new(paths.clone());
//! let runner = ShellScriptRunner;
//! let installer = PackageInstaller::new(&paths, &cache, &runner);
//!
//! let manifest = toothpm::batch::manifest_from_archive("pkg.tar.gz".as_ref())?;
//! installer.install(&manifest, "", &InstallOptions::default())?;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`manifest`] - Parse, validate, and query tooth.json manifests
//! - [`specifier`] - Package identifier and specifier text forms
//! - [`lockfile`] - Manage tooth.lock, the installed-package ledger
//! - [`paths`] - Deterministic cache and working-directory locations
//! - [`topo`] - Dependency-aware ordering of batch operations
//! - [`source`] - Uniform read access to archives, files, and directories
//! - [`cache`] - Download-if-not-cached asset acquisition
//! - [`installer`] - Per-package install and uninstall state machines
//! - [`batch`] - Multi-package orchestration
//! - [`platform`] - Target-platform identification
//! - [`config`] - User configuration management
//! - [`error`] - Error types and result handling

pub mod batch;
pub mod cache;
pub mod config;
pub mod error;
pub mod installer;
pub mod lockfile;
pub mod manifest;
pub mod paths;
pub mod platform;
pub mod source;
pub mod specifier;
pub mod topo;

pub use cache::AssetCache;
pub use config::Config;
pub use error::{Error, Result};
pub use installer::{
    InstallOptions, PackageInstaller, ScriptRunner, ShellScriptRunner, UninstallOptions,
};
pub use lockfile::{LockEntry, PackageLock};
pub use manifest::{
    Asset, AssetKind, Info, PackageManifest, Placement, PlacementKind, Scripts, Variant,
    MANIFEST_FILE_NAME,
};
pub use paths::{PathResolver, LOCK_FILE_NAME};
pub use source::{ArchiveFileSource, ArchiveFormat, DirFileSource, FileSource, StandaloneFileSource};
pub use specifier::{PackageIdentifier, PackageSpecifier};
pub use topo::{TopoItem, TopoSortedList};
