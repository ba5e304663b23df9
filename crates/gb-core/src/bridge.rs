//! Relay between the local standard streams and an agent session
//!
//! The default [`RelayMode::Sequential`] relay first drains local input into
//! the agent, then forwards everything the agent sends until it closes the
//! connection. It assumes local input reaches EOF once the caller is done
//! (e.g. a redirected stdin), and can stall if the agent needs to reply
//! before that.
//!
//! [`RelayMode::Duplex`] runs both directions at once on the current task.
//! The agent closing its side, or an error in either direction, ends the
//! relay and tears the other direction down.

use std::io;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::error::BridgeError;
use crate::session::Session;
use crate::traits::AgentStream;

/// How the two relay directions are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelayMode {
    /// Local input to EOF, then agent output to EOF
    #[default]
    Sequential,
    /// Both directions concurrently
    Duplex,
}

/// Byte counts of a finished relay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelayStats {
    /// Bytes forwarded from local input to the agent
    pub sent: u64,
    /// Bytes forwarded from the agent to local output
    pub received: u64,
}

/// Relays bytes between a local reader/writer pair and an agent session
#[derive(Debug, Clone, Default)]
pub struct StreamBridge {
    mode: RelayMode,
    cancel: CancellationToken,
}

impl StreamBridge {
    /// Create a bridge with the given scheduling mode
    pub fn new(mode: RelayMode) -> Self {
        Self {
            mode,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop the relay when `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Scheduling mode of this bridge
    pub fn mode(&self) -> RelayMode {
        self.mode
    }

    /// Relay until done, then close the session
    ///
    /// The session is closed on every exit path. Once the relay itself has
    /// finished, a failing shutdown is only logged.
    pub async fn relay<S, I, O>(
        &self,
        session: &mut Session<S>,
        input: &mut I,
        output: &mut O,
    ) -> Result<RelayStats, BridgeError>
    where
        S: AgentStream,
        I: AsyncRead + Unpin,
        O: AsyncWrite + Unpin,
    {
        let result = tokio::select! {
            result = self.run(session, input, output) => result,
            _ = self.cancel.cancelled() => {
                tracing::debug!("Relay cancelled");
                Err(io::Error::new(io::ErrorKind::Interrupted, "relay cancelled").into())
            }
        };

        if let Err(e) = session.close().await {
            tracing::debug!("Error closing gpg-agent session: {}", e);
        }
        result
    }

    async fn run<S, I, O>(
        &self,
        session: &mut Session<S>,
        input: &mut I,
        output: &mut O,
    ) -> Result<RelayStats, BridgeError>
    where
        S: AgentStream,
        I: AsyncRead + Unpin,
        O: AsyncWrite + Unpin,
    {
        match self.mode {
            RelayMode::Sequential => relay_sequential(session, input, output).await,
            RelayMode::Duplex => relay_duplex(session, input, output).await,
        }
    }
}

async fn relay_sequential<S, I, O>(
    session: &mut Session<S>,
    input: &mut I,
    output: &mut O,
) -> Result<RelayStats, BridgeError>
where
    S: AgentStream,
    I: AsyncRead + Unpin,
    O: AsyncWrite + Unpin,
{
    let conn = session.authenticated_connection()?;

    let sent = tokio::io::copy(input, conn).await?;
    conn.flush().await?;
    tracing::debug!(bytes = sent, "Local input exhausted");

    // `conn` is the session's BufReader, so already-buffered bytes go first
    let received = tokio::io::copy_buf(conn, output).await?;
    output.flush().await?;
    tracing::debug!(bytes = received, "gpg-agent closed the connection");

    Ok(RelayStats { sent, received })
}

async fn relay_duplex<S, I, O>(
    session: &mut Session<S>,
    input: &mut I,
    output: &mut O,
) -> Result<RelayStats, BridgeError>
where
    S: AgentStream,
    I: AsyncRead + Unpin,
    O: AsyncWrite + Unpin,
{
    let conn = session.take_connection()?;
    let (mut agent_rx, mut agent_tx) = tokio::io::split(conn);

    let mut sent = None;
    let received = {
        let upstream = async {
            let sent = tokio::io::copy(input, &mut agent_tx).await?;
            agent_tx.flush().await?;
            Ok::<u64, io::Error>(sent)
        };
        let downstream = async {
            let received = tokio::io::copy(&mut agent_rx, output).await?;
            output.flush().await?;
            Ok::<u64, io::Error>(received)
        };
        tokio::pin!(upstream, downstream);

        // Local EOF only stops the upstream copy; the agent closing ends both
        loop {
            tokio::select! {
                result = &mut upstream, if sent.is_none() => {
                    let bytes = result?;
                    tracing::debug!(bytes, "Local input exhausted");
                    sent = Some(bytes);
                }
                result = &mut downstream => {
                    let bytes = result?;
                    tracing::debug!(bytes, "gpg-agent closed the connection");
                    break bytes;
                }
            }
        }
    };

    // `take_connection` already marked the session closed
    let mut conn = agent_rx.unsplit(agent_tx);
    if let Err(e) = conn.shutdown().await {
        tracing::debug!("Error shutting down agent connection: {}", e);
    }

    Ok(RelayStats {
        sent: sent.unwrap_or(0),
        received,
    })
}
