//! Single-line command/response exchange on an authenticated session

use gb_protocol::{Command, ProtocolError, Response};

use crate::error::BridgeError;
use crate::session::Session;
use crate::traits::AgentStream;

/// Thin request/response helper borrowing an authenticated session
pub struct CommandChannel<'a, S> {
    session: &'a mut Session<S>,
}

impl<'a, S: AgentStream> CommandChannel<'a, S> {
    /// Attach to a session that has completed the handshake
    pub fn new(session: &'a mut Session<S>) -> Result<Self, BridgeError> {
        if !session.is_authenticated() {
            return Err(ProtocolError::NotAuthenticated.into());
        }
        Ok(Self { session })
    }

    /// Send one command and parse the single response line
    pub async fn request(&mut self, command: &Command) -> Result<Response, BridgeError> {
        let line = self.exchange(command).await?;
        Ok(Response::parse(&line)?)
    }

    /// Send one command, say goodbye, then parse the response
    ///
    /// `BYE` goes out right after the response line is read, before it is
    /// parsed, so the agent is released even if the reply is malformed.
    pub async fn query(mut self, command: &Command) -> Result<Response, BridgeError> {
        let line = self.exchange(command).await?;
        self.bye().await;
        Ok(Response::parse(&line)?)
    }

    /// Ask the agent for its version string
    ///
    /// An `ERR` reply is returned as [`ProtocolError::AgentError`].
    pub async fn version(self) -> Result<String, BridgeError> {
        let response = self.query(&Command::version()).await?;
        if response.is_error() {
            return Err(ProtocolError::AgentError(response.payload).into());
        }
        tracing::debug!(version = %response.payload, "gpg-agent version");
        Ok(response.payload)
    }

    /// Signal end of session; failures are logged, never returned
    pub async fn bye(&mut self) {
        let line = format!("{}\n", Command::Bye);
        if let Err(e) = self.session.write_all(line.as_bytes()).await {
            tracing::warn!("Failed to send BYE to gpg-agent: {}", e);
        }
    }

    async fn exchange(&mut self, command: &Command) -> Result<String, BridgeError> {
        let line = command.to_line()?;
        tracing::debug!(command = %command, "Sending command to gpg-agent");
        self.session.write_all(line.as_bytes()).await?;

        let response = self.session.read_line().await?;
        if response.is_empty() {
            return Err(ProtocolError::EmptyResponse.into());
        }
        Ok(String::from_utf8_lossy(&response).into_owned())
    }
}
