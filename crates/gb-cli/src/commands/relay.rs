//! Relay stdin/stdout through the agent connection

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use gb_core::config::BridgeConfig;
use gb_core::{AgentClient, RelayMode, StreamBridge};

/// Bridge the process's standard streams to gpg-agent
///
/// `duplex` forces concurrent relaying even if the config file does not
/// enable it. Cancelling `cancel` aborts the relay and closes the session.
pub async fn relay_command(
    config: &BridgeConfig,
    duplex: bool,
    cancel: CancellationToken,
) -> Result<()> {
    let path = config.agent.socket_path()?;
    let mode = if duplex || config.relay.duplex {
        RelayMode::Duplex
    } else {
        RelayMode::Sequential
    };

    let bridge = StreamBridge::new(mode).with_cancellation(cancel);
    let mut stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();

    let stats = AgentClient::new()
        .relay(&path, &bridge, &mut stdin, &mut stdout)
        .await
        .with_context(|| format!("Relay via {:?} failed", path))?;

    tracing::info!(
        sent = stats.sent,
        received = stats.received,
        "Relay finished"
    );
    Ok(())
}
