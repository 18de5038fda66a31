use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Version parsing error: {0}")]
    SemVer(#[from] semver::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Cache directory is not configured\n\n\
             Hint: set the cache root in ~/.toothpm/config.toml:\n\n\
             [cache]\n\
             root = \"/path/to/cache\"")]
    CacheNotConfigured,

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Invalid package specifier '{0}'")]
    InvalidSpecifier(String),

    #[error("Package does not contain variant '{label}' for platform {platform}")]
    VariantNotFound { label: String, platform: String },

    #[error("Package {specifier} is already installed with version {installed}\n\n\
             Hint: uninstall the existing version first:\n\
             toothpm uninstall {specifier}")]
    VersionConflict {
        specifier: String,
        installed: semver::Version,
    },

    #[error("File {0} already exists and would be overwritten")]
    FileConflict(PathBuf),

    #[error("Failed to resolve asset: {0}")]
    AssetResolution(String),

    #[error("Dependency cycle detected:\n\n  {0}\n\n\
             These packages depend on each other in a loop.\n\
             One of them needs to drop its dependency to break the cycle.")]
    DependencyCycle(String),

    #[error("Script '{command}' exited with {status}")]
    ScriptFailed { command: String, status: String },

    #[error("{0}")]
    Other(String),
}
