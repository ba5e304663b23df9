//! Configuration file handling
//!
//! The file is optional TOML; every field has a default, so an empty file
//! and no file at all behave the same.

mod bridge;

pub use bridge::{
    AgentConfig, BridgeConfig, RelayConfig, DEFAULT_CONFIG_TOML, DEFAULT_SOCKET_NAME,
};

use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Directory holding the gpg-bridge config file
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gpg-bridge")
}

/// Default config file location
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Load a bridge configuration file
pub fn load_config(path: &Path) -> Result<BridgeConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound(path.to_path_buf())
        } else {
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let config = toml::from_str(&content)?;
    tracing::debug!("Loaded config from {:?}", path);
    Ok(config)
}

/// Write the commented default config file, creating parent directories
///
/// An existing file is only replaced when `force` is set.
pub fn write_default_config(path: &Path, force: bool) -> Result<(), ConfigError> {
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists(path.to_path_buf()));
    }

    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, DEFAULT_CONFIG_TOML).map_err(write_err)
}
