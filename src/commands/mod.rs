pub mod install;
pub mod list;
pub mod uninstall;

use anyhow::Result;
use std::env;
use toothpm::{AssetCache, Config, PathResolver};

/// Collaborators shared by every command: config, path resolution for the
/// current working directory, and the asset cache.
pub(crate) fn workspace() -> Result<(Config, PathResolver, AssetCache)> {
    let config = Config::load()?;
    let paths = PathResolver::new(env::current_dir()?, Some(config.cache_root()?));
    let mut cache = AssetCache::new(paths.clone());
    cache.show_progress = config.download.show_progress;
    Ok((config, paths, cache))
}
