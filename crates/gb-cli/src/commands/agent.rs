//! One-shot agent commands

use anyhow::{Context, Result};

use gb_core::config::BridgeConfig;
use gb_core::AgentClient;
use gb_protocol::Command;

/// Print the agent's version string
pub async fn version_command(config: &BridgeConfig) -> Result<()> {
    let path = config.agent.socket_path()?;

    let version = AgentClient::new()
        .version(&path)
        .await
        .with_context(|| format!("Failed to query gpg-agent version via {:?}", path))?;

    println!("{}", version);
    Ok(())
}

/// Send a single command line and print the agent's reply
///
/// An `ERR` reply is reported as a failure.
pub async fn query_command(config: &BridgeConfig, line: &str) -> Result<()> {
    let path = config.agent.socket_path()?;
    let command = Command::Raw(line.to_string());

    let response = AgentClient::new()
        .query(&path, &command)
        .await
        .with_context(|| format!("Failed to send {:?} via {:?}", line, path))?;

    if response.is_error() {
        anyhow::bail!("gpg-agent rejected {:?}: {}", line, response.payload);
    }

    println!("{} {}", response.tag, response.payload);
    Ok(())
}
