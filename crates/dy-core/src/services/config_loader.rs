use std::path::Path;

use crate::error::{PlatformError, Result};
use crate::models::PlatformConfig;

pub const CONFIG_FILENAME: &str = ".dockyard.yaml";
pub const DEBUG_LOG_FILENAME: &str = ".dockyard-debug.log";

pub fn load(root: &Path) -> Result<PlatformConfig> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Err(PlatformError::ConfigNotFound(config_path));
    }
    if !config_path.is_file() {
        return Err(PlatformError::InvalidConfig(format!(
            "{} is not a regular file",
            config_path.display()
        )));
    }
    let contents = std::fs::read_to_string(&config_path)?;
    // An empty file deserializes to null rather than an empty mapping.
    if contents.trim().is_empty() {
        return Ok(PlatformConfig::default());
    }
    let config: PlatformConfig = serde_yaml::from_str(&contents)
        .map_err(|e| PlatformError::InvalidConfig(e.to_string()))?;
    if config.base_port == 0 {
        return Err(PlatformError::InvalidConfig(
            "base_port must be greater than zero".into(),
        ));
    }
    if config.registry_file.trim().is_empty() {
        return Err(PlatformError::InvalidConfig(
            "registry_file must not be empty".into(),
        ));
    }
    Ok(config)
}

/// Like [`load`], but a missing config file yields the defaults.
pub fn load_or_default(root: &Path) -> Result<PlatformConfig> {
    match load(root) {
        Ok(config) => Ok(config),
        Err(PlatformError::ConfigNotFound(path)) => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(PlatformConfig::default())
        }
        Err(e) => Err(e),
    }
}
