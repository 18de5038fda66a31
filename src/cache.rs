//! Asset acquisition and caching
//!
//! [`AssetCache`] turns an asset declaration into a locally-available
//! [`FileSource`], downloading remote archives into the cache on first use
//! and reusing them afterwards. Cache locations come from [`PathResolver`];
//! the cache itself holds no identity scheme of its own.
//!
//! Two invariants:
//! - at most one in-flight fetch per distinct URL (concurrent callers wait
//!   on the single download instead of duplicating work);
//! - a cache entry is either absent or complete (downloads land in a `.part`
//!   sibling and are renamed into place).

use crate::manifest::{Asset, AssetKind};
use crate::paths::PathResolver;
use crate::source::{ArchiveFileSource, ArchiveFormat, DirFileSource, FileSource, StandaloneFileSource};
use crate::specifier::PackageSpecifier;
use crate::{Error, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use url::Url;

/// Name of the cached payload inside a per-URL asset cache directory.
const CACHED_FILE_NAME: &str = "file";

pub struct AssetCache {
    paths: PathResolver,
    client: reqwest::blocking::Client,
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    /// Draw a progress bar while downloading.
    pub show_progress: bool,
}

impl AssetCache {
    pub fn new(paths: PathResolver) -> Self {
        Self {
            paths,
            client: reqwest::blocking::Client::new(),
            in_flight: Mutex::new(HashMap::new()),
            show_progress: false,
        }
    }

    /// Resolve an asset declaration to a concrete file source.
    pub fn resolve(&self, asset: &Asset, specifier: &PackageSpecifier) -> Result<FileSource> {
        match asset.kind {
            AssetKind::SelfPackage => {
                let dir = self.paths.package_cache_dir(&specifier.to_string())?;
                if !dir.is_dir() {
                    return Err(Error::AssetResolution(format!(
                        "package payload for {} is not cached",
                        specifier
                    )));
                }
                Ok(FileSource::Dir(DirFileSource::new(dir)))
            }
            AssetKind::Tar | AssetKind::Tgz | AssetKind::Zip => {
                let (path, _) = self.downloaded_file(&asset.urls)?;
                let format = match asset.kind {
                    AssetKind::Tar => ArchiveFormat::Tar,
                    AssetKind::Tgz => ArchiveFormat::Tgz,
                    _ => ArchiveFormat::Zip,
                };
                Ok(FileSource::Archive(ArchiveFileSource::new(path, format)))
            }
            AssetKind::Uncompressed => {
                let (path, url) = self.downloaded_file(&asset.urls)?;
                Ok(FileSource::Standalone(StandaloneFileSource::new(
                    path,
                    standalone_key(&url),
                )))
            }
        }
    }

    /// Seed the package cache with an installed package's own payload so
    /// that `self` assets can resolve by identity later.
    pub fn add_package_payload(
        &self,
        specifier: &PackageSpecifier,
        archive: &Path,
        format: ArchiveFormat,
    ) -> Result<()> {
        let target = self.paths.package_cache_dir(&specifier.to_string())?;
        if target.is_dir() {
            debug!(specifier = %specifier, "package payload already cached");
            return Ok(());
        }

        let staging = sibling_part_path(&target);
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;

        match format {
            ArchiveFormat::Zip => {
                let mut zip = zip::ZipArchive::new(File::open(archive)?)?;
                zip.extract(&staging)?;
            }
            ArchiveFormat::Tar | ArchiveFormat::Tgz => {
                let file = File::open(archive)?;
                let reader: Box<dyn io::Read> = match format {
                    ArchiveFormat::Tgz => Box::new(flate2::read::GzDecoder::new(file)),
                    _ => Box::new(file),
                };
                tar::Archive::new(reader).unpack(&staging)?;
            }
        }

        fs::rename(&staging, &target)?;
        info!(specifier = %specifier, "cached package payload");
        Ok(())
    }

    /// Cached file for the first usable URL of an ordered candidate list,
    /// downloading it when not cached yet. Returns the path and the URL the
    /// payload was cached under.
    fn downloaded_file(&self, urls: &[String]) -> Result<(PathBuf, String)> {
        if urls.is_empty() {
            return Err(Error::AssetResolution(
                "asset declares no source URLs".to_string(),
            ));
        }

        let mut last_error = None;
        for url in urls {
            match self.download_if_not_cached(url) {
                Ok(path) => return Ok((path, url.clone())),
                Err(e) => {
                    debug!(url = %url, error = %e, "asset candidate failed");
                    last_error = Some(e);
                }
            }
        }

        Err(Error::AssetResolution(format!(
            "no usable source among {} candidate URLs: {}",
            urls.len(),
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    /// Fetch a URL into the asset cache unless a completed copy is present.
    pub fn download_if_not_cached(&self, url: &str) -> Result<PathBuf> {
        let dir = self.paths.asset_cache_dir(url)?;
        let cached = dir.join(CACHED_FILE_NAME);

        if cached.is_file() {
            return Ok(cached);
        }

        // One fetch per URL; late arrivals wait, then reuse the fresh copy.
        let slot = {
            let mut map = self
                .in_flight
                .lock()
                .map_err(|_| Error::Other("asset cache lock poisoned".to_string()))?;
            map.entry(url.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _fetch_guard = slot
            .lock()
            .map_err(|_| Error::Other("asset fetch lock poisoned".to_string()))?;

        if cached.is_file() {
            return Ok(cached);
        }

        fs::create_dir_all(&dir)?;
        let part = dir.join(format!("{}.part", CACHED_FILE_NAME));

        match local_source_path(url) {
            Some(local) => {
                debug!(url = %url, "copying local asset into cache");
                fs::copy(&local, &part)?;
            }
            None => {
                info!(url = %url, "downloading asset");
                self.fetch_to(url, &part)?;
            }
        }

        fs::rename(&part, &cached)?;
        Ok(cached)
    }

    fn fetch_to(&self, url: &str, dest: &Path) -> Result<()> {
        let response = self.client.get(url).send()?;

        if !response.status().is_success() {
            return Err(Error::AssetResolution(format!(
                "download of {} failed: HTTP {}",
                url,
                response.status()
            )));
        }

        let mut out = File::create(dest)?;

        if self.show_progress {
            let bar = match response.content_length() {
                Some(len) => {
                    let bar = ProgressBar::new(len);
                    bar.set_style(
                        ProgressStyle::default_bar()
                            .template("[{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
                            .unwrap_or_else(|_| ProgressStyle::default_bar())
                            .progress_chars("#>-"),
                    );
                    bar
                }
                None => ProgressBar::new_spinner(),
            };
            bar.set_message(url.to_string());
            let mut reader = bar.wrap_read(response);
            io::copy(&mut reader, &mut out)?;
            bar.finish_and_clear();
        } else {
            let mut reader = response;
            io::copy(&mut reader, &mut out)?;
        }

        Ok(())
    }
}

/// Local filesystem path behind a URL, when it is not a network source.
fn local_source_path(url: &str) -> Option<PathBuf> {
    match Url::parse(url) {
        Ok(parsed) if parsed.scheme() == "file" => parsed.to_file_path().ok(),
        Ok(_) => None,
        // Not a URL at all; treat it as a plain path.
        Err(_) => Some(PathBuf::from(url)),
    }
}

/// Entry key for an uncompressed asset: the URL's file-name segment.
fn standalone_key(url: &str) -> String {
    let trimmed = url.split(['?', '#']).next().unwrap_or(url);
    trimmed
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(CACHED_FILE_NAME)
        .to_string()
}

fn sibling_part_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cache_in(dir: &Path) -> AssetCache {
        AssetCache::new(PathResolver::new(dir, Some(dir.join("cache"))))
    }

    #[test]
    fn test_standalone_key() {
        assert_eq!(standalone_key("https://example.com/a/tool.bin"), "tool.bin");
        assert_eq!(standalone_key("https://example.com/a/tool.bin?v=1"), "tool.bin");
        assert_eq!(standalone_key("https://example.com/"), "file");
    }

    #[test]
    fn test_local_source_path() {
        assert_eq!(
            local_source_path("file:///tmp/a.tar"),
            Some(PathBuf::from("/tmp/a.tar"))
        );
        assert_eq!(
            local_source_path("relative/a.tar"),
            Some(PathBuf::from("relative/a.tar"))
        );
        assert_eq!(local_source_path("https://example.com/a.tar"), None);
    }

    #[test]
    fn test_download_served_once() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/asset.tar")
            .with_status(200)
            .with_body("payload")
            .expect(1)
            .create();

        let dir = TempDir::new().unwrap();
        let cache = cache_in(dir.path());
        let url = format!("{}/asset.tar", server.url());

        let first = cache.download_if_not_cached(&url).unwrap();
        let second = cache.download_if_not_cached(&url).unwrap();

        assert_eq!(first, second);
        assert_eq!(fs::read(&first).unwrap(), b"payload");
        mock.assert();
    }

    #[test]
    fn test_concurrent_requests_download_once() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/asset.tar")
            .with_status(200)
            .with_body("payload")
            .expect(1)
            .create();

        let dir = TempDir::new().unwrap();
        let cache = Arc::new(cache_in(dir.path()));
        let url = format!("{}/asset.tar", server.url());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let url = url.clone();
                std::thread::spawn(move || cache.download_if_not_cached(&url).unwrap())
            })
            .collect();

        let paths: Vec<PathBuf> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        // Every caller sees the same completed cache entry, and the server
        // was hit exactly once.
        assert!(paths.iter().all(|p| p == &paths[0]));
        assert_eq!(fs::read(&paths[0]).unwrap(), b"payload");
        mock.assert();
    }

    #[test]
    fn test_download_failure_is_asset_resolution_error() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/missing.tar")
            .with_status(404)
            .create();

        let dir = TempDir::new().unwrap();
        let cache = cache_in(dir.path());
        let url = format!("{}/missing.tar", server.url());

        let err = cache.download_if_not_cached(&url).unwrap_err();
        assert!(matches!(err, Error::AssetResolution(_)));
        assert!(!dir.path().join("cache").join("assets").join("file").exists());
    }

    #[test]
    fn test_local_file_copied_into_cache() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("asset.bin");
        fs::write(&source, b"local payload").unwrap();

        let cache = cache_in(dir.path());
        let cached = cache
            .download_if_not_cached(source.to_str().unwrap())
            .unwrap();

        assert_eq!(fs::read(&cached).unwrap(), b"local payload");
        assert!(cached.starts_with(dir.path().join("cache").join("assets")));
    }

    #[test]
    fn test_resolve_requires_urls() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(dir.path());

        let asset = Asset {
            kind: AssetKind::Tgz,
            urls: vec![],
            place: vec![],
            preserve: vec![],
            remove: vec![],
        };
        let specifier: PackageSpecifier = "example.com/pkg@1.0.0".parse().unwrap();

        let err = cache.resolve(&asset, &specifier).unwrap_err();
        assert!(matches!(err, Error::AssetResolution(_)));
    }

    #[test]
    fn test_resolve_self_requires_cached_payload() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(dir.path());
        let specifier: PackageSpecifier = "example.com/pkg@1.0.0".parse().unwrap();

        let asset = Asset {
            kind: AssetKind::SelfPackage,
            urls: vec![],
            place: vec![],
            preserve: vec![],
            remove: vec![],
        };
        assert!(cache.resolve(&asset, &specifier).is_err());
    }
}
