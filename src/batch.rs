//! Multi-package orchestration
//!
//! Sequencing layer above [`PackageInstaller`]: reads manifests out of a set
//! of package archives, orders the batch dependencies-first, and drives the
//! per-package engine one item at a time. The lock file is persisted by each
//! per-package step, so a mid-batch failure leaves it consistent with the
//! work actually completed.

use crate::cache::AssetCache;
use crate::installer::{InstallOptions, PackageInstaller, UninstallOptions};
use crate::lockfile::PackageLock;
use crate::manifest::{PackageManifest, MANIFEST_FILE_NAME};
use crate::paths::PathResolver;
use crate::source::{ArchiveFileSource, ArchiveFormat};
use crate::specifier::{PackageIdentifier, PackageSpecifier};
use crate::topo::{TopoItem, TopoSortedList};
use crate::{Error, Result};
use semver::VersionReq;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// One archive queued for installation, with its manifest already read and
/// its payload staged in the package cache.
struct QueuedInstall {
    manifest: PackageManifest,
    variant_label: String,
    platform: String,
}

impl TopoItem for QueuedInstall {
    fn identifier(&self) -> PackageIdentifier {
        PackageIdentifier::new(self.manifest.tooth.clone(), self.variant_label.clone())
    }

    fn dependencies(&self) -> BTreeMap<PackageIdentifier, VersionReq> {
        variant_dependencies(&self.manifest, &self.variant_label, &self.platform)
    }
}

/// An installed package queued for removal.
struct QueuedUninstall {
    identifier: PackageIdentifier,
    dependencies: BTreeMap<PackageIdentifier, VersionReq>,
}

impl TopoItem for QueuedUninstall {
    fn identifier(&self) -> PackageIdentifier {
        self.identifier.clone()
    }

    fn dependencies(&self) -> BTreeMap<PackageIdentifier, VersionReq> {
        self.dependencies.clone()
    }
}

fn variant_dependencies(
    manifest: &PackageManifest,
    variant_label: &str,
    platform: &str,
) -> BTreeMap<PackageIdentifier, VersionReq> {
    let Some(variant) = manifest.get_specified_variant(variant_label, platform) else {
        return BTreeMap::new();
    };

    variant
        .dependencies
        .iter()
        .filter_map(|(text, req)| {
            text.parse::<PackageIdentifier>()
                .ok()
                .map(|identifier| (identifier, req.clone()))
        })
        .collect()
}

/// Archive format inferred from the file name.
pub fn archive_format(path: &Path) -> Result<ArchiveFormat> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        Ok(ArchiveFormat::Tgz)
    } else if name.ends_with(".tar") {
        Ok(ArchiveFormat::Tar)
    } else if name.ends_with(".zip") {
        Ok(ArchiveFormat::Zip)
    } else {
        Err(Error::AssetResolution(format!(
            "cannot infer archive format of '{}'; expected .tar, .tar.gz, .tgz or .zip",
            path.display()
        )))
    }
}

/// Read and validate the manifest stored inside a package archive.
pub fn manifest_from_archive(path: &Path) -> Result<PackageManifest> {
    let format = archive_format(path)?;
    let source = ArchiveFileSource::new(path, format);
    let bytes = source.read(MANIFEST_FILE_NAME)?.ok_or_else(|| {
        Error::InvalidManifest(format!(
            "archive '{}' does not contain {}",
            path.display(),
            MANIFEST_FILE_NAME
        ))
    })?;
    PackageManifest::from_json_bytes(&bytes)
}

/// Install a batch of package archives, dependencies first. Edges are
/// restricted to packages present in the batch; dependencies on anything
/// else are the caller's concern.
pub fn install_all(
    installer: &PackageInstaller<'_>,
    cache: &AssetCache,
    platform: &str,
    archives: &[PathBuf],
    variant_label: &str,
    opts: &InstallOptions,
) -> Result<()> {
    let mut queue = TopoSortedList::new();

    for archive in archives {
        let manifest = manifest_from_archive(archive)?;
        let specifier = PackageSpecifier::new(
            manifest.tooth.clone(),
            variant_label,
            manifest.version.clone(),
        );

        // Seeding the cache is safe under dry run; the working directory
        // and lock stay untouched.
        cache.add_package_payload(&specifier, archive, archive_format(archive)?)?;

        queue.add(QueuedInstall {
            manifest,
            variant_label: variant_label.to_string(),
            platform: platform.to_string(),
        })?;
    }

    for item in queue.iter() {
        installer.install(&item.manifest, &item.variant_label, opts)?;
    }

    Ok(())
}

/// Uninstall a batch of installed packages, dependents first. Identifiers
/// with no lock entry are skipped with a warning. Returns how many packages
/// were actually processed.
pub fn uninstall_all(
    paths: &PathResolver,
    installer: &PackageInstaller<'_>,
    platform: &str,
    identifiers: &[PackageIdentifier],
    opts: &UninstallOptions,
) -> Result<usize> {
    let lock = PackageLock::load(paths.lock_path())?;
    let mut queue = TopoSortedList::new();

    for identifier in identifiers {
        let Some(manifest) = lock.installed_manifest(identifier) else {
            warn!(package = %identifier, "not installed, skipping");
            continue;
        };

        queue.add(QueuedUninstall {
            identifier: identifier.clone(),
            dependencies: variant_dependencies(manifest, &identifier.variant_label, platform),
        })?;
    }

    let processed = queue.len();

    // Reverse of install order: dependents come out before their
    // dependencies.
    for item in queue.iter().rev() {
        installer.uninstall(&item.identifier, opts)?;
    }

    Ok(processed)
}
