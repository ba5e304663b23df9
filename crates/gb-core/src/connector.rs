//! Outbound TCP connector
//!
//! gpg-agent's socket emulation only listens on the loopback interface, so
//! the connector never dials anything but `127.0.0.1`.

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;

use crate::error::BridgeError;
use crate::traits::Dialer;

/// How long to wait for the agent to accept a connection
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Dials the agent over loopback TCP
#[derive(Debug, Clone)]
pub struct TcpDialer {
    timeout: Duration,
}

impl TcpDialer {
    /// Create a dialer with the standard connect timeout
    pub fn new() -> Self {
        Self {
            timeout: CONNECT_TIMEOUT,
        }
    }

    /// Connect timeout applied to every dial
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for TcpDialer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Dialer for TcpDialer {
    type Stream = TcpStream;

    async fn dial(&self, port: u16) -> Result<TcpStream, BridgeError> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        tracing::debug!("Connecting to gpg-agent at {}", addr);

        let stream = tokio::time::timeout(self.timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| BridgeError::Connection {
                address: addr.to_string(),
                source: io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("timed out after {:?}", self.timeout),
                ),
            })?
            .map_err(|source| BridgeError::Connection {
                address: addr.to_string(),
                source,
            })?;

        // The handshake and command lines are tiny; don't let Nagle hold them back.
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!("Failed to set TCP_NODELAY: {}", e);
        }

        tracing::debug!("Connected to gpg-agent at {}", addr);
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_dial_connects_to_loopback_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let accept = tokio::spawn(async move { listener.accept().await.map(|(_, peer)| peer) });

        let stream = TcpDialer::new().dial(port).await.unwrap();
        let peer = accept.await.unwrap().unwrap();

        assert_eq!(stream.local_addr().unwrap(), peer);
    }

    #[tokio::test]
    async fn test_dial_refused_is_connection_error() {
        // Bind then drop to find a port that is very likely closed
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let err = TcpDialer::new().dial(port).await.unwrap_err();
        match err {
            BridgeError::Connection { address, .. } => {
                assert_eq!(address, format!("127.0.0.1:{}", port));
            }
            other => panic!("Expected Connection error, got {:?}", other),
        }
    }

    #[test]
    fn test_default_timeout() {
        assert_eq!(TcpDialer::default().timeout(), Duration::from_secs(3));
    }
}
