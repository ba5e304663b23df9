//! Connection capability traits

use std::io;
use std::path::Path;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncRead, AsyncWrite};

use crate::error::BridgeError;

/// Minimal duplex byte stream a session runs over
///
/// A session only ever reads, writes and shuts down its connection, so any
/// async byte stream qualifies: a `TcpStream` in production, an in-memory
/// `tokio::io::duplex` pipe in tests.
pub trait AgentStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> AgentStream for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

/// Opens a connection to the agent's port
#[async_trait]
pub trait Dialer: Send + Sync {
    /// The stream type produced by this dialer
    type Stream: AgentStream;

    /// Connect to the agent listening on `port`
    async fn dial(&self, port: u16) -> Result<Self::Stream, BridgeError>;
}

/// Opens the byte source holding the agent's connection descriptor
#[async_trait]
pub trait DescriptorOpener: Send + Sync {
    /// Open `path` for buffered reading
    async fn open(&self, path: &Path) -> io::Result<Box<dyn AsyncBufRead + Unpin + Send>>;
}

/// Reads descriptors from the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsOpener;

#[async_trait]
impl DescriptorOpener for FsOpener {
    async fn open(&self, path: &Path) -> io::Result<Box<dyn AsyncBufRead + Unpin + Send>> {
        let file = tokio::fs::File::open(path).await?;
        Ok(Box::new(tokio::io::BufReader::new(file)))
    }
}
