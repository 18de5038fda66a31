//! Polymorphic file sources
//!
//! Assets resolve to a [`FileSource`]: a uniform "enumerate entries, read an
//! entry" view over an archive (tar, tar.gz, zip), a standalone cached file,
//! or a directory tree. Entry keys are `/`-separated paths relative to the
//! source root; directory entries are not surfaced.

use crate::{Error, Result};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

/// A locally-available set of files backing one asset.
#[derive(Debug)]
pub enum FileSource {
    Archive(ArchiveFileSource),
    Standalone(StandaloneFileSource),
    Dir(DirFileSource),
}

impl FileSource {
    /// Keys of all file entries in this source.
    pub fn entries(&self) -> Result<Vec<String>> {
        match self {
            FileSource::Archive(s) => s.entries(),
            FileSource::Standalone(s) => s.entries(),
            FileSource::Dir(s) => s.entries(),
        }
    }

    /// Contents of the entry with the given key, or `None` when the key is
    /// not present in this source.
    pub fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self {
            FileSource::Archive(s) => s.read(key),
            FileSource::Standalone(s) => s.read(key),
            FileSource::Dir(s) => s.read(key),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Tar,
    Tgz,
    Zip,
}

/// An archive file presented entry-by-entry, regardless of format.
#[derive(Debug)]
pub struct ArchiveFileSource {
    path: PathBuf,
    format: ArchiveFormat,
}

fn normalize_key(raw: &str) -> String {
    raw.trim_start_matches("./").trim_end_matches('/').to_string()
}

impl ArchiveFileSource {
    pub fn new(path: impl Into<PathBuf>, format: ArchiveFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    fn open_tar(&self) -> Result<tar::Archive<Box<dyn Read>>> {
        let file = File::open(&self.path)?;
        let reader: Box<dyn Read> = match self.format {
            ArchiveFormat::Tar => Box::new(file),
            ArchiveFormat::Tgz => Box::new(GzDecoder::new(file)),
            ArchiveFormat::Zip => unreachable!("zip archives are not tar-backed"),
        };
        Ok(tar::Archive::new(reader))
    }

    pub fn entries(&self) -> Result<Vec<String>> {
        match self.format {
            ArchiveFormat::Zip => {
                let mut archive = zip::ZipArchive::new(File::open(&self.path)?)?;
                let mut keys = Vec::new();
                for i in 0..archive.len() {
                    let entry = archive.by_index(i)?;
                    if entry.is_file() {
                        keys.push(normalize_key(entry.name()));
                    }
                }
                Ok(keys)
            }
            _ => {
                let mut archive = self.open_tar()?;
                let mut keys = Vec::new();
                for entry in archive.entries()? {
                    let entry = entry?;
                    if entry.header().entry_type().is_file() {
                        keys.push(normalize_key(&entry.path()?.to_string_lossy()));
                    }
                }
                Ok(keys)
            }
        }
    }

    pub fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.format {
            ArchiveFormat::Zip => {
                let mut archive = zip::ZipArchive::new(File::open(&self.path)?)?;
                // Members may be stored with a "./" prefix; look up by the
                // normalized name `entries` reported.
                let stored = archive
                    .file_names()
                    .find(|name| !name.ends_with('/') && normalize_key(name) == key)
                    .map(str::to_string);
                let Some(stored) = stored else {
                    return Ok(None);
                };

                let mut entry = archive.by_name(&stored)?;
                let mut bytes = Vec::new();
                entry.read_to_end(&mut bytes)?;
                Ok(Some(bytes))
            }
            _ => {
                // Tar has no random access; rescan for the requested key.
                let mut archive = self.open_tar()?;
                for entry in archive.entries()? {
                    let mut entry = entry?;
                    if !entry.header().entry_type().is_file() {
                        continue;
                    }
                    if normalize_key(&entry.path()?.to_string_lossy()) == key {
                        let mut bytes = Vec::new();
                        entry.read_to_end(&mut bytes)?;
                        return Ok(Some(bytes));
                    }
                }
                Ok(None)
            }
        }
    }
}

/// A single cached file; its key is the original file name.
#[derive(Debug)]
pub struct StandaloneFileSource {
    path: PathBuf,
    key: String,
}

impl StandaloneFileSource {
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
        }
    }

    pub fn entries(&self) -> Result<Vec<String>> {
        Ok(vec![self.key.clone()])
    }

    pub fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if key == self.key {
            Ok(Some(fs::read(&self.path)?))
        } else {
            Ok(None)
        }
    }
}

/// A directory tree, enumerated recursively with relative keys.
#[derive(Debug)]
pub struct DirFileSource {
    root: PathBuf,
}

impl DirFileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn entries(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        collect_keys(&self.root, "", &mut keys)?;
        keys.sort();
        Ok(keys)
    }

    pub fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.root.join(key);
        if path.is_file() {
            Ok(Some(fs::read(path)?))
        } else {
            Ok(None)
        }
    }
}

fn collect_keys(dir: &Path, prefix: &str, keys: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name
            .to_str()
            .ok_or_else(|| Error::Other(format!("non-UTF8 file name under {}", dir.display())))?;
        let key = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", prefix, name)
        };

        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_keys(&entry.path(), &key, keys)?;
        } else if file_type.is_file() {
            keys.push(key);
        }
    }
    Ok(())
}
