//! Config command implementations

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::output::{format_config, print_info, print_success, print_warning};
use gb_core::config::{self, BridgeConfig};
use gb_core::ConfigError;

/// Command-line values that take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct AgentOverrides {
    pub gnupg_dir: Option<PathBuf>,
    pub socket_name: Option<String>,
}

/// Build the effective configuration
///
/// An explicit `--config` file must exist and parse. The default file is
/// optional; if it is unreadable the defaults are used with a warning.
/// Command-line overrides are applied last.
pub fn resolve_config(
    config_path: Option<&PathBuf>,
    overrides: &AgentOverrides,
) -> Result<BridgeConfig> {
    let mut config: BridgeConfig = match config_path {
        Some(path) => config::load_config(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => {
            let default_path = config::default_config_path();
            if default_path.exists() {
                config::load_config(&default_path).unwrap_or_else(|e| {
                    tracing::warn!("Failed to load config from {:?}: {}", default_path, e);
                    BridgeConfig::default()
                })
            } else {
                tracing::debug!("Using default configuration");
                BridgeConfig::default()
            }
        }
    };

    overrides.apply(&mut config);
    Ok(config)
}

impl AgentOverrides {
    fn apply(&self, config: &mut BridgeConfig) {
        if let Some(dir) = &self.gnupg_dir {
            config.agent.gnupg_dir = Some(dir.clone());
        }
        if let Some(name) = &self.socket_name {
            config.agent.socket_name = name.clone();
        }
    }
}

/// Show the effective configuration
pub fn config_show(config_path: Option<&PathBuf>, overrides: &AgentOverrides) -> Result<()> {
    let path = target_path(config_path);
    let config = if path.exists() {
        print_info(&format!("Configuration file: {:?}", path));
        resolve_config(Some(&path), overrides)?
    } else {
        print_warning(&format!("No configuration file found at {:?}", path));
        print_info("Showing built-in defaults");
        let mut config = BridgeConfig::default();
        overrides.apply(&mut config);
        config
    };

    println!("{}", format_config(&config));
    Ok(())
}

/// Print the configuration file path
pub fn config_path(config_path: Option<&PathBuf>) {
    println!("{}", target_path(config_path).display());
}

/// Write a default configuration file
pub fn config_init(config_path: Option<&PathBuf>, force: bool) -> Result<()> {
    let path = target_path(config_path);

    match config::write_default_config(&path, force) {
        Ok(()) => {
            print_success(&format!("Created configuration file: {:?}", path));
            Ok(())
        }
        Err(e @ ConfigError::AlreadyExists(_)) => {
            print_info("Use --force to overwrite");
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

fn target_path(config_path: Option<&PathBuf>) -> PathBuf {
    config_path
        .cloned()
        .unwrap_or_else(config::default_config_path)
}
