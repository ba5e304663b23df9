//! Entry point tying descriptor, connector and session together

use std::path::Path;

use tokio::io::{AsyncRead, AsyncWrite};

use gb_protocol::{Command, ConnectionDescriptor, Response};

use crate::bridge::{RelayStats, StreamBridge};
use crate::command::CommandChannel;
use crate::connector::TcpDialer;
use crate::error::BridgeError;
use crate::session::Session;
use crate::traits::{AgentStream, DescriptorOpener, Dialer, FsOpener};

/// Client for the gpg-agent behind a connection descriptor
///
/// The file-opening and dialing strategies are injected at construction, so
/// tests can run the whole sequence against in-memory fakes.
#[derive(Debug, Clone, Default)]
pub struct AgentClient<O = FsOpener, D = TcpDialer> {
    opener: O,
    dialer: D,
}

impl AgentClient {
    /// Client reading descriptors from disk and dialing loopback TCP
    pub fn new() -> Self {
        Self::default()
    }
}

impl<O: DescriptorOpener, D: Dialer> AgentClient<O, D> {
    /// Client with custom opening and dialing strategies
    pub fn with_parts(opener: O, dialer: D) -> Self {
        Self { opener, dialer }
    }

    /// Read and parse the descriptor at `path`
    pub async fn read_descriptor(&self, path: &Path) -> Result<ConnectionDescriptor, BridgeError> {
        tracing::debug!("Reading connection descriptor from {:?}", path);
        let mut reader = self.opener.open(path).await?;
        Ok(ConnectionDescriptor::read_from(&mut reader).await?)
    }

    /// Connect to the agent and complete the handshake
    ///
    /// On a failed handshake the connection is closed before the error is
    /// returned.
    pub async fn connect(&self, path: &Path) -> Result<Session<D::Stream>, BridgeError> {
        let descriptor = self.read_descriptor(path).await?;
        let stream = self.dialer.dial(descriptor.port).await?;

        let mut session = Session::new(stream, descriptor.token);
        if let Err(e) = session.authenticate().await {
            if let Err(close_err) = session.close().await {
                tracing::debug!("Error closing rejected session: {}", close_err);
            }
            return Err(e);
        }

        Ok(session)
    }

    /// Send one single-line command and return the parsed reply
    pub async fn query(&self, path: &Path, command: &Command) -> Result<Response, BridgeError> {
        let mut session = self.connect(path).await?;
        let result = match CommandChannel::new(&mut session) {
            Ok(channel) => channel.query(command).await,
            Err(e) => Err(e),
        };
        finish(session, result).await
    }

    /// Ask the agent for its version string
    pub async fn version(&self, path: &Path) -> Result<String, BridgeError> {
        let mut session = self.connect(path).await?;
        let result = match CommandChannel::new(&mut session) {
            Ok(channel) => channel.version().await,
            Err(e) => Err(e),
        };
        finish(session, result).await
    }

    /// Relay `input`/`output` through a fresh authenticated session
    pub async fn relay<I, W>(
        &self,
        path: &Path,
        bridge: &StreamBridge,
        input: &mut I,
        output: &mut W,
    ) -> Result<RelayStats, BridgeError>
    where
        I: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut session = self.connect(path).await?;
        tracing::debug!(mode = ?bridge.mode(), "Starting relay");
        bridge.relay(&mut session, input, output).await
    }
}

/// Close the session and hand back the exchange result
///
/// The exchange is already complete at this point, so a failing shutdown is
/// only logged.
async fn finish<S: AgentStream, T>(
    mut session: Session<S>,
    result: Result<T, BridgeError>,
) -> Result<T, BridgeError> {
    if let Err(e) = session.close().await {
        tracing::debug!("Error closing gpg-agent session: {}", e);
    }
    result
}
