//! Install and uninstall workflows for a single package
//!
//! [`PackageInstaller`] drives the per-package state machines:
//!
//! install: check existing → select variant → pre-install scripts → place
//! assets → install scripts → update lock → post-install scripts.
//!
//! uninstall: check installed → pre-uninstall scripts → uninstall scripts →
//! remove assets → update lock → post-uninstall scripts.
//!
//! There is no rollback: a failing state aborts the remaining states of the
//! current package and leaves earlier side effects in place. The lock file
//! is re-read and persisted within each operation, never batched.

use crate::cache::AssetCache;
use crate::lockfile::PackageLock;
use crate::manifest::PackageManifest;
use crate::paths::PathResolver;
use crate::platform;
use crate::specifier::{PackageIdentifier, PackageSpecifier};
use crate::{Error, Result};
use std::fs;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

/// Runs one lifecycle command in a working directory, blocking until the
/// process exits.
pub trait ScriptRunner {
    fn run(&self, command: &str, working_dir: &Path) -> Result<()>;
}

/// Production runner: hands the command string to the platform shell.
pub struct ShellScriptRunner;

impl ScriptRunner for ShellScriptRunner {
    fn run(&self, command: &str, working_dir: &Path) -> Result<()> {
        let status = if cfg!(windows) {
            Command::new("cmd")
                .args(["/C", command])
                .current_dir(working_dir)
                .status()?
        } else {
            Command::new("sh")
                .args(["-c", command])
                .current_dir(working_dir)
                .status()?
        };

        if status.success() {
            Ok(())
        } else {
            Err(Error::ScriptFailed {
                command: command.to_string(),
                status: status.to_string(),
            })
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InstallOptions {
    /// Perform reads, checks and logging only; no mutation of any kind.
    pub dry_run: bool,
    pub ignore_scripts: bool,
    /// Mark the lock entry as explicitly requested rather than pulled in
    /// as a dependency.
    pub locked: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UninstallOptions {
    pub dry_run: bool,
    pub ignore_scripts: bool,
}

pub struct PackageInstaller<'a> {
    paths: &'a PathResolver,
    cache: &'a AssetCache,
    runner: &'a dyn ScriptRunner,
    platform: String,
}

impl<'a> PackageInstaller<'a> {
    pub fn new(paths: &'a PathResolver, cache: &'a AssetCache, runner: &'a dyn ScriptRunner) -> Self {
        Self {
            paths,
            cache,
            runner,
            platform: platform::identifier(),
        }
    }

    /// Override the platform used for variant selection.
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// Install one package at the requested variant.
    pub fn install(
        &self,
        manifest: &PackageManifest,
        variant_label: &str,
        opts: &InstallOptions,
    ) -> Result<()> {
        let specifier = PackageSpecifier::new(
            manifest.tooth.clone(),
            variant_label,
            manifest.version.clone(),
        );
        let identifier = specifier.identifier();

        // Same version installed: no-op. Different version: refuse; there is
        // no implicit upgrade path.
        let lock = PackageLock::load(self.paths.lock_path())?;
        if let Some(installed) = lock.installed_manifest(&identifier) {
            if installed.version == manifest.version {
                info!(package = %specifier, "already installed, skipping");
                return Ok(());
            }
            return Err(Error::VersionConflict {
                specifier: identifier.to_string(),
                installed: installed.version.clone(),
            });
        }

        let variant = manifest
            .get_specified_variant(variant_label, &self.platform)
            .ok_or_else(|| Error::VariantNotFound {
                label: variant_label.to_string(),
                platform: self.platform.clone(),
            })?;

        self.run_scripts(&variant.scripts.pre_install, opts.dry_run, opts.ignore_scripts)?;

        // Place files. An existing destination is always fatal; foreign
        // files are never overwritten silently.
        for asset in &variant.assets {
            let source = self.cache.resolve(asset, &specifier)?;

            for key in source.entries()? {
                for place in &asset.place {
                    let Some(rel) = PathResolver::placement_relative_path(place, &key) else {
                        continue;
                    };

                    let dest = self.paths.working_dir().join(&rel);
                    if dest.exists() {
                        return Err(Error::FileConflict(dest));
                    }

                    debug!(entry = %key, dest = %dest.display(), "placing file");

                    if !opts.dry_run {
                        if let Some(parent) = dest.parent() {
                            fs::create_dir_all(parent)?;
                        }
                        let bytes = source.read(&key)?.ok_or_else(|| {
                            Error::AssetResolution(format!("entry '{}' vanished from source", key))
                        })?;
                        fs::write(&dest, bytes)?;
                    }
                }
            }
        }

        self.run_scripts(&variant.scripts.install, opts.dry_run, opts.ignore_scripts)?;

        if !opts.dry_run {
            let mut lock = PackageLock::load(self.paths.lock_path())?;
            lock.add_entry(manifest.clone(), variant_label, opts.locked);
            lock.save(self.paths.lock_path())?;
        }

        self.run_scripts(&variant.scripts.post_install, opts.dry_run, opts.ignore_scripts)?;

        info!(package = %specifier, "installed");
        Ok(())
    }

    /// Uninstall one package+variant. Not installed is a logged no-op.
    pub fn uninstall(&self, identifier: &PackageIdentifier, opts: &UninstallOptions) -> Result<()> {
        let lock = PackageLock::load(self.paths.lock_path())?;
        let Some(manifest) = lock.installed_manifest(identifier).cloned() else {
            info!(package = %identifier, "not installed, skipping");
            return Ok(());
        };

        let specifier = PackageSpecifier::new(
            manifest.tooth.clone(),
            identifier.variant_label.clone(),
            manifest.version.clone(),
        );

        let variant = manifest
            .get_specified_variant(&identifier.variant_label, &self.platform)
            .ok_or_else(|| Error::VariantNotFound {
                label: identifier.variant_label.clone(),
                platform: self.platform.clone(),
            })?;

        self.run_scripts(&variant.scripts.pre_uninstall, opts.dry_run, opts.ignore_scripts)?;
        self.run_scripts(&variant.scripts.uninstall, opts.dry_run, opts.ignore_scripts)?;

        // Remove placed files, except preserved destinations, plus the
        // asset's explicit remove list.
        for asset in &variant.assets {
            let source = self.cache.resolve(asset, &specifier)?;

            for key in source.entries()? {
                for place in &asset.place {
                    let Some(rel) = PathResolver::placement_relative_path(place, &key) else {
                        continue;
                    };

                    if asset.preserve.contains(&rel) {
                        debug!(dest = %rel, "preserved, not removing");
                        continue;
                    }

                    self.remove_placed(&rel, opts.dry_run)?;
                }
            }

            for rel in &asset.remove {
                self.remove_placed(rel, opts.dry_run)?;
            }
        }

        if !opts.dry_run {
            let mut lock = PackageLock::load(self.paths.lock_path())?;
            lock.remove_entry(identifier);
            lock.save(self.paths.lock_path())?;
        }

        self.run_scripts(&variant.scripts.post_uninstall, opts.dry_run, opts.ignore_scripts)?;

        info!(package = %specifier, "uninstalled");
        Ok(())
    }

    fn run_scripts(&self, commands: &[String], dry_run: bool, ignore_scripts: bool) -> Result<()> {
        if ignore_scripts {
            return Ok(());
        }

        for command in commands {
            debug!(command = %command, "running script");
            if !dry_run {
                self.runner.run(command, self.paths.working_dir())?;
            }
        }

        Ok(())
    }

    fn remove_placed(&self, rel: &str, dry_run: bool) -> Result<()> {
        let dest = self.paths.working_dir().join(rel);
        debug!(dest = %dest.display(), "removing file");

        if dry_run {
            return Ok(());
        }

        if dest.is_file() {
            fs::remove_file(&dest)?;
        }

        self.prune_empty_ancestors(&dest);
        Ok(())
    }

    // Delete now-empty ancestor directories upward, stopping at (and never
    // deleting) the working directory itself.
    fn prune_empty_ancestors(&self, path: &Path) {
        let working_dir = self.paths.working_dir();
        let mut current = path.parent();

        while let Some(dir) = current {
            if !dir.starts_with(working_dir) || dir == working_dir {
                break;
            }

            let is_empty = fs::read_dir(dir)
                .map(|mut entries| entries.next().is_none())
                .unwrap_or(false);
            if is_empty {
                let _ = fs::remove_dir(dir);
            }

            current = dir.parent();
        }
    }
}
