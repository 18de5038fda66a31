//! User configuration management
//!
//! Configuration is stored in TOML format at `~/.toothpm/config.toml`.
//!
//! # Examples
//!
//! ```no_run
//! use toothpm::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?;
//! println!("Cache root: {}", config.cache.root);
//! # Ok(())
//! # }
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// User configuration file (`~/.toothpm/config.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Download settings
    #[serde(default)]
    pub download: DownloadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache root directory. `~` and environment variables are expanded.
    #[serde(default = "default_cache_root")]
    pub root: String,
}

fn default_cache_root() -> String {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("~/.cache"))
        .join("toothpm")
        .to_string_lossy()
        .into_owned()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: default_cache_root(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Show a progress bar on downloads
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,
}

fn default_show_progress() -> bool {
    true
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            show_progress: default_show_progress(),
        }
    }
}

impl Config {
    /// Get the default config file path
    ///
    /// Uses TOOTHPM_CONFIG_DIR if set, otherwise ~/.toothpm/config.toml
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(config_dir) = std::env::var("TOOTHPM_CONFIG_DIR") {
            return Ok(PathBuf::from(config_dir).join("config.toml"));
        }

        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| Error::Other("Could not find home directory".to_string()))?;

        Ok(PathBuf::from(home).join(".toothpm").join("config.toml"))
    }

    /// Load config from file, or create default if it doesn't exist
    ///
    /// Environment variable overrides:
    /// - `TOOTHPM_CACHE_DIR`: Overrides `cache.root`
    /// - `TOOTHPM_CONFIG_DIR`: Overrides the config directory location
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;

        let mut config = if !path.exists() {
            Self::default()
        } else {
            let content = fs::read_to_string(&path)?;
            toml::from_str(&content)?
        };

        if let Ok(root) = std::env::var("TOOTHPM_CACHE_DIR") {
            if !root.is_empty() {
                config.cache.root = root;
            }
        }

        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Cache root with `~` and environment variables expanded.
    pub fn cache_root(&self) -> Result<PathBuf> {
        if self.cache.root.is_empty() {
            return Err(Error::CacheNotConfigured);
        }
        let expanded = shellexpand::full(&self.cache.root)
            .map_err(|e| Error::Other(format!("bad cache root: {}", e)))?;
        Ok(PathBuf::from(expanded.into_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_cache_root() {
        let config = Config::default();
        assert!(!config.cache.root.is_empty());
        assert!(config.cache.root.ends_with("toothpm"));
        assert!(config.download.show_progress);
    }

    #[test]
    fn test_cache_root_expansion() {
        let mut config = Config::default();
        config.cache.root = "~/caches/toothpm".to_string();
        let root = config.cache_root().unwrap();
        assert!(!root.to_string_lossy().contains('~'));
        assert!(root.ends_with("caches/toothpm"));
    }

    #[test]
    fn test_empty_cache_root_is_configuration_error() {
        let mut config = Config::default();
        config.cache.root = String::new();
        assert!(matches!(config.cache_root(), Err(Error::CacheNotConfigured)));
    }

    #[test]
    fn test_config_round_trip() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.cache.root, config.cache.root);
    }
}
