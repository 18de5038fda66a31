//! Test utilities and helpers for toothpm integration tests.
//!
//! Provides isolated working/cache/config directories and builders for
//! package archives used as install inputs.

use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use toothpm::{PackageLock, PathResolver};

/// Isolated test environment: a working directory, a cache root, and a
/// config directory, all inside one temp dir.
pub struct TestProject {
    pub temp_dir: TempDir,
    pub working_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub config_dir: PathBuf,
}

impl TestProject {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let working_dir = temp_dir.path().join("work");
        let cache_dir = temp_dir.path().join("cache");
        let config_dir = temp_dir.path().join(".toothpm");

        fs::create_dir_all(&working_dir).expect("Failed to create working directory");
        fs::create_dir_all(&config_dir).expect("Failed to create config directory");

        Self {
            temp_dir,
            working_dir,
            cache_dir,
            config_dir,
        }
    }

    pub fn paths(&self) -> PathResolver {
        PathResolver::new(&self.working_dir, Some(self.cache_dir.clone()))
    }

    pub fn read_lock(&self) -> PackageLock {
        PackageLock::load(self.paths().lock_path()).expect("Failed to load lock")
    }

    /// Write a config.toml pointing at this project's cache root.
    pub fn write_config(&self) {
        let content = format!(
            "[cache]\nroot = \"{}\"\n\n[download]\nshow_progress = false\n",
            self.cache_dir.display()
        );
        fs::write(self.config_dir.join("config.toml"), content).expect("Failed to write config");
    }

    /// Build a tar package archive containing a manifest and payload files.
    pub fn write_package_archive(
        &self,
        file_name: &str,
        manifest: serde_json::Value,
        files: &[(&str, &[u8])],
    ) -> PathBuf {
        let manifest_text = manifest.to_string();
        let mut entries: Vec<(&str, &[u8])> = vec![("tooth.json", manifest_text.as_bytes())];
        entries.extend_from_slice(files);

        let mut builder = tar::Builder::new(Vec::new());
        for (name, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_path(name).expect("Failed to set tar path");
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, name, content)
                .expect("Failed to append tar entry");
        }

        let path = self.temp_dir.path().join(file_name);
        fs::write(&path, builder.into_inner().expect("Failed to finish tar"))
            .expect("Failed to write archive");
        path
    }
}

/// A minimal valid manifest document.
pub fn manifest_json(tooth: &str, version: &str, variants: serde_json::Value) -> serde_json::Value {
    json!({
        "format_version": 3,
        "format_uuid": "289f771f-2c9a-4d73-9f3f-8492495a924d",
        "tooth": tooth,
        "version": version,
        "variants": variants
    })
}

/// A manifest whose single default variant places its own payload.
pub fn self_placing_manifest(
    tooth: &str,
    version: &str,
    placements: &[(&str, &str)],
) -> serde_json::Value {
    let place: Vec<serde_json::Value> = placements
        .iter()
        .map(|(src, dest)| json!({ "type": "file", "src": src, "dest": dest }))
        .collect();

    manifest_json(
        tooth,
        version,
        json!([{
            "assets": [{ "type": "self", "place": place }]
        }]),
    )
}

/// Recursively snapshot a directory as (relative path, bytes) pairs.
pub fn snapshot_dir(root: &Path) -> Vec<(String, Vec<u8>)> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<(String, Vec<u8>)>) {
        let mut entries: Vec<_> = fs::read_dir(dir)
            .expect("Failed to read dir")
            .map(|e| e.expect("Failed to read entry").path())
            .collect();
        entries.sort();
        for path in entries {
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                let rel = path
                    .strip_prefix(root)
                    .expect("Entry outside root")
                    .to_string_lossy()
                    .into_owned();
                out.push((rel, fs::read(&path).expect("Failed to read file")));
            }
        }
    }

    let mut out = Vec::new();
    walk(root, root, &mut out);
    out
}
