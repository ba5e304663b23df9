//! Agent session and handshake
//!
//! A [`Session`] owns the connection to the agent for its whole lifetime.
//! The connection is wrapped in a single `BufReader` so bytes the agent sends
//! right after a line (e.g. the start of a relayed reply) are never lost
//! between the handshake, the command channel and the stream bridge.

use std::fmt;
use std::io;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};

use gb_protocol::{ProtocolError, GREETING, MAX_LINE_LEN, TOKEN_LEN};

use crate::error::BridgeError;
use crate::traits::AgentStream;

/// An open connection to the agent plus its authentication state
pub struct Session<S> {
    conn: Option<BufReader<S>>,
    token: [u8; TOKEN_LEN],
    authenticated: bool,
}

impl<S: AgentStream> Session<S> {
    /// Wrap a freshly opened connection
    pub fn new(stream: S, token: [u8; TOKEN_LEN]) -> Self {
        Self {
            conn: Some(BufReader::new(stream)),
            token,
            authenticated: false,
        }
    }

    /// Whether the handshake has completed
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Whether the connection has been released
    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    /// Perform the one-shot token handshake
    ///
    /// Writes the raw token, then expects the agent's greeting line verbatim.
    /// Any other reply is an authentication failure carrying what was read.
    pub async fn authenticate(&mut self) -> Result<(), BridgeError> {
        if self.authenticated {
            return Err(ProtocolError::AlreadyAuthenticated.into());
        }

        let token = self.token;
        let conn = self.connection()?;
        conn.write_all(&token).await?;
        conn.flush().await?;

        let reply = read_bounded_line(conn).await?;

        if reply != GREETING {
            let received = String::from_utf8_lossy(&reply).into_owned();
            tracing::debug!(received = %received.trim_end(), "Handshake rejected");
            return Err(BridgeError::Authentication { received });
        }

        tracing::debug!("Authenticated with gpg-agent");
        self.authenticated = true;
        Ok(())
    }

    /// Write raw bytes to the agent and flush
    pub(crate) async fn write_all(&mut self, bytes: &[u8]) -> Result<(), BridgeError> {
        let conn = self.authenticated_connection()?;
        conn.write_all(bytes).await?;
        conn.flush().await?;
        Ok(())
    }

    /// Read one `\n`-terminated line (shorter if the agent closes first)
    pub(crate) async fn read_line(&mut self) -> Result<Vec<u8>, BridgeError> {
        let conn = self.authenticated_connection()?;
        Ok(read_bounded_line(conn).await?)
    }

    /// Connection of an authenticated session
    pub(crate) fn authenticated_connection(&mut self) -> Result<&mut BufReader<S>, BridgeError> {
        if !self.authenticated {
            return Err(ProtocolError::NotAuthenticated.into());
        }
        self.connection()
    }

    /// Take the connection out of an authenticated session
    ///
    /// The session counts as closed afterwards; the caller becomes
    /// responsible for shutting the connection down.
    pub(crate) fn take_connection(&mut self) -> Result<BufReader<S>, BridgeError> {
        self.authenticated_connection()?;
        self.conn.take().ok_or_else(|| closed().into())
    }

    fn connection(&mut self) -> Result<&mut BufReader<S>, BridgeError> {
        self.conn.as_mut().ok_or_else(|| closed().into())
    }

    /// Shut down and release the connection
    ///
    /// Safe to call more than once; only the first call touches the
    /// connection.
    pub async fn close(&mut self) -> io::Result<()> {
        match self.conn.take() {
            Some(mut conn) => {
                tracing::debug!("Closing gpg-agent session");
                let result = conn.shutdown().await;
                drop(conn);
                result
            }
            None => Ok(()),
        }
    }
}

impl<S> fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.authenticated)
            .field("closed", &self.conn.is_none())
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Read up to and including `\n`, stopping after [`MAX_LINE_LEN`] bytes
async fn read_bounded_line<S: AgentStream>(conn: &mut BufReader<S>) -> io::Result<Vec<u8>> {
    let mut line = Vec::new();
    (&mut *conn)
        .take(MAX_LINE_LEN as u64)
        .read_until(b'\n', &mut line)
        .await?;
    Ok(line)
}

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "session is closed")
}
