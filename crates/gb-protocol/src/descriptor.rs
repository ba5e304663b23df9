//! Connection descriptor published by the agent
//!
//! On hosts without Unix domain sockets, gpg-agent emulates its socket with a
//! small file holding the TCP port it listens on and a per-instance nonce:
//!
//! ```text
//! <decimal port>\n<16 raw token bytes>
//! ```

use std::fmt;
use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::error::DescriptorError;

/// Length of the authentication token in bytes
pub const TOKEN_LEN: usize = 16;

/// Longest valid port line: five digits plus `\r\n`
const MAX_PORT_LINE: u64 = 7;

/// Port and token needed to open an authenticated agent session
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    /// TCP port on the loopback interface
    pub port: u16,
    /// Nonce written verbatim as the first bytes of every connection
    pub token: [u8; TOKEN_LEN],
}

impl ConnectionDescriptor {
    /// Create a descriptor from its parts
    pub fn new(port: u16, token: [u8; TOKEN_LEN]) -> Self {
        Self { port, token }
    }

    /// Parse a descriptor from a buffered byte source
    ///
    /// Reads the `\n`-terminated port line (a `\r` before the newline is
    /// accepted), then exactly [`TOKEN_LEN`] raw bytes. Anything after the
    /// token is left unread.
    pub async fn read_from<R>(reader: &mut R) -> Result<Self, DescriptorError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut line = Vec::with_capacity(MAX_PORT_LINE as usize);
        (&mut *reader)
            .take(MAX_PORT_LINE)
            .read_until(b'\n', &mut line)
            .await?;

        if line.last() != Some(&b'\n') {
            if line.len() as u64 == MAX_PORT_LINE {
                return Err(DescriptorError::PortLineTooLong {
                    line: String::from_utf8_lossy(&line).into_owned(),
                });
            }
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "descriptor ended before the port line terminator",
            )
            .into());
        }
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }

        let text = String::from_utf8_lossy(&line);
        let port = text
            .parse::<u16>()
            .map_err(|source| DescriptorError::InvalidPort {
                line: text.to_string(),
                source,
            })?;

        let mut token = [0u8; TOKEN_LEN];
        reader.read_exact(&mut token).await?;

        tracing::trace!(port, "Parsed connection descriptor");

        Ok(Self { port, token })
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("port", &self.port)
            .field("token", &"<redacted>")
            .finish()
    }
}
