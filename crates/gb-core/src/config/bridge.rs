//! Bridge configuration

use serde::Deserialize;
use std::path::PathBuf;

use crate::error::ConfigError;

/// File name gpg-agent uses for its standard socket
pub const DEFAULT_SOCKET_NAME: &str = "S.gpg-agent";

/// Commented config file written by `config init`
///
/// `gnupg_dir` stays commented out so the home-relative default keeps
/// following the user.
pub const DEFAULT_CONFIG_TOML: &str = r#"# gpg-bridge configuration

[agent]
# GnuPG home directory holding the agent's socket files
# (defaults to <home>/AppData/Local/gnupg)
# gnupg_dir = "/mnt/c/Users/me/AppData/Local/gnupg"

# Name of the socket descriptor file inside gnupg_dir
socket_name = "S.gpg-agent"

[relay]
# Relay both directions at once instead of reading stdin to EOF first
duplex = false
"#;

/// Top-level configuration file layout
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Where to find the agent's connection descriptor
    pub agent: AgentConfig,

    /// How to relay the standard streams
    pub relay: RelayConfig,
}

/// Location of the agent's connection descriptor
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// GnuPG home directory of the agent
    ///
    /// Defaults to `<home>/AppData/Local/gnupg`, where gpg4win keeps its
    /// socket files.
    pub gnupg_dir: Option<PathBuf>,

    /// Socket (descriptor) file name inside `gnupg_dir`
    pub socket_name: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            gnupg_dir: default_gnupg_dir(),
            socket_name: DEFAULT_SOCKET_NAME.to_string(),
        }
    }
}

impl AgentConfig {
    /// Full path of the descriptor file
    pub fn socket_path(&self) -> Result<PathBuf, ConfigError> {
        let dir = self.gnupg_dir.as_ref().ok_or_else(|| {
            ConfigError::MissingField(
                "agent.gnupg_dir (home directory could not be determined)".to_string(),
            )
        })?;

        if self.socket_name.is_empty() {
            return Err(ConfigError::MissingField("agent.socket_name".to_string()));
        }

        Ok(dir.join(&self.socket_name))
    }
}

/// Stream relay options
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Relay both directions concurrently instead of draining stdin first
    pub duplex: bool,
}

fn default_gnupg_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join("AppData").join("Local").join("gnupg"))
}
