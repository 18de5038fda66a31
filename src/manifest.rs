//! Manifest handling for tooth.json documents
//!
//! This module provides the data model for tooth package manifests.
//! Manifests are immutable once decoded: [`PackageManifest::from_json_bytes`]
//! validates the whole document and either returns a fully-valid manifest or
//! a descriptive error, never a partially-valid value.
//!
//! # Examples
//!
//! ```
//! use toothpm::PackageManifest;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manifest = PackageManifest::from_json_bytes(br#"{
//!     "format_version": 3,
//!     "format_uuid": "289f771f-2c9a-4d73-9f3f-8492495a924d",
//!     "tooth": "example.com/pkg",
//!     "version": "1.0.0",
//!     "variants": []
//! }"#)?;
//!
//! assert_eq!(manifest.tooth, "example.com/pkg");
//! # Ok(())
//! # }
//! ```

use crate::{platform, Error, Result};
use regex::Regex;
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Fixed manifest filename inside a working directory or package archive.
pub const MANIFEST_FILE_NAME: &str = "tooth.json";

/// Manifest schema version; decoding fails on any other value.
pub const MANIFEST_FORMAT_VERSION: u32 = 3;

/// Manifest schema identity; decoding fails on any other value.
pub const MANIFEST_FORMAT_UUID: &str = "289f771f-2c9a-4d73-9f3f-8492495a924d";

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9-]+(:[a-z0-9-]+)?$").unwrap())
}

fn script_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9]+(_[a-z0-9]+)*$").unwrap())
}

/// A tooth package manifest (tooth.json).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageManifest {
    pub format_version: u32,

    pub format_uuid: String,

    /// Package path, e.g. "example.com/some-pkg".
    pub tooth: String,

    /// Strict semantic version.
    pub version: Version,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<Info>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<Variant>,
}

/// Human-oriented package metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Info {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// A platform/label-scoped subset of a package's assets, dependencies and
/// scripts. An empty label is the default variant; an empty platform matches
/// every platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Variant {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub platform: String,

    /// Package identifier text -> version range.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, VersionReq>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assets: Vec<Asset>,

    #[serde(default, skip_serializing_if = "Scripts::is_empty")]
    pub scripts: Scripts,
}

/// How an asset's payload is obtained and unpacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// The package's own archived payload, looked up in the package cache
    /// by identity rather than via `urls`.
    #[serde(rename = "self")]
    SelfPackage,
    Tar,
    Tgz,
    Zip,
    Uncompressed,
}

/// A declared bundle of files with placement and removal rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(rename = "type")]
    pub kind: AssetKind,

    /// Ordered candidate source URLs. Required unless `kind` is `self`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub place: Vec<Placement>,

    /// Destination paths exempt from removal on uninstall.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preserve: Vec<String>,

    /// Extra working-directory-relative paths deleted on uninstall.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementKind {
    File,
    Dir,
}

/// Maps file-source entries to destination paths under the working directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    #[serde(rename = "type")]
    pub kind: PlacementKind,

    /// Source path (`file`) or source directory prefix (`dir`) inside the
    /// asset's file source.
    pub src: String,

    /// Destination path relative to the working directory.
    pub dest: String,
}

/// Lifecycle hook lists.
///
/// Besides the fixed hooks, a scripts object may carry arbitrary extra keys.
/// Keys that match the script-name grammar and map to an array of strings
/// are exposed through [`Scripts::additional_scripts`]; everything else is
/// silently ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Scripts {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre_install: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub install: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_install: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre_pack: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_pack: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre_uninstall: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uninstall: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_uninstall: Vec<String>,

    /// Unrecognized fields, captured raw and projected at read time.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Scripts {
    pub fn is_empty(&self) -> bool {
        self.pre_install.is_empty()
            && self.install.is_empty()
            && self.post_install.is_empty()
            && self.pre_pack.is_empty()
            && self.post_pack.is_empty()
            && self.pre_uninstall.is_empty()
            && self.uninstall.is_empty()
            && self.post_uninstall.is_empty()
            && self.extra.is_empty()
    }

    /// Extra hooks whose key matches the script-name grammar and whose value
    /// is an array of strings. Anything else in `extra` is skipped.
    pub fn additional_scripts(&self) -> BTreeMap<String, Vec<String>> {
        let mut scripts = BTreeMap::new();

        for (key, value) in &self.extra {
            if !script_name_regex().is_match(key) {
                continue;
            }

            let Some(items) = value.as_array() else {
                continue;
            };

            let Some(commands) = items
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect::<Option<Vec<String>>>()
            else {
                continue;
            };

            scripts.insert(key.clone(), commands);
        }

        scripts
    }
}

impl PackageManifest {
    /// Decode and validate a manifest document.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self> {
        let manifest: PackageManifest = serde_json::from_slice(bytes)
            .map_err(|e| Error::InvalidManifest(format!("failed to decode tooth.json: {}", e)))?;

        manifest.validate()?;

        Ok(manifest)
    }

    /// Encode the manifest as pretty-printed JSON.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// First variant whose label equals the requested label and whose
    /// platform is empty or equals `platform`. Declaration order is the
    /// documented tie-break.
    pub fn get_specified_variant(&self, label: &str, platform: &str) -> Option<&Variant> {
        self.variants
            .iter()
            .find(|v| v.label == label && platform::matches(&v.platform, platform))
    }

    fn validate(&self) -> Result<()> {
        if self.format_version != MANIFEST_FORMAT_VERSION {
            return Err(Error::InvalidManifest(format!(
                "format_version is {}, expected {}",
                self.format_version, MANIFEST_FORMAT_VERSION
            )));
        }

        if self.format_uuid != MANIFEST_FORMAT_UUID {
            return Err(Error::InvalidManifest(format!(
                "format_uuid is '{}', expected '{}'",
                self.format_uuid, MANIFEST_FORMAT_UUID
            )));
        }

        if self.tooth.is_empty() {
            return Err(Error::InvalidManifest("tooth path is empty".to_string()));
        }

        if let Some(tags) = self.info.as_ref().and_then(|i| i.tags.as_ref()) {
            for tag in tags {
                if !tag_regex().is_match(tag) {
                    return Err(Error::InvalidManifest(format!("tag '{}' is invalid", tag)));
                }
            }
        }

        for asset in self.variants.iter().flat_map(|v| v.assets.iter()) {
            if asset.kind != AssetKind::SelfPackage && asset.urls.is_empty() {
                return Err(Error::InvalidManifest(format!(
                    "asset of type {:?} declares no urls",
                    asset.kind
                )));
            }
        }

        Ok(())
    }
}
