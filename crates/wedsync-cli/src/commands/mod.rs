pub mod config;
pub mod conflicts;

use std::path::{Path, PathBuf};
use wedsync_core::{ConfigError, EngineConfig};

/// Resolve the config file location from `--config` or the default.
pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => EngineConfig::default_path(),
    }
}

/// Load the engine config, treating a missing file as defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<EngineConfig, ConfigError> {
    EngineConfig::load_from(&config_path(explicit)?)
}
