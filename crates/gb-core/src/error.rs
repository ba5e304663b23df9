//! Core error types for gpg-bridge

use gb_protocol::{DescriptorError, ProtocolError};
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for a bridge session
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Byte source or sink failure, including early end of input
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Descriptor port line is not a valid port number
    #[error("Format error: {0}")]
    Format(DescriptorError),

    /// Dial failure or connect timeout
    #[error("Connection error: could not connect to {address}: {source}")]
    Connection {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Handshake reply did not match the expected greeting
    #[error("Authentication failed: unexpected reply from gpg-agent: {received:?}")]
    Authentication { received: String },

    /// Malformed response or out-of-order protocol use
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl From<DescriptorError> for BridgeError {
    fn from(err: DescriptorError) -> Self {
        match err {
            DescriptorError::Io(e) => BridgeError::Io(e),
            other => BridgeError::Format(other),
        }
    }
}

impl BridgeError {
    /// Whether the error stems from a cancelled relay
    pub fn is_interrupted(&self) -> bool {
        matches!(self, BridgeError::Io(e) if e.kind() == std::io::ErrorKind::Interrupted)
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Config file exists but could not be read
    #[error("Failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file or its directory could not be written
    #[error("Failed to write config {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Refused to replace an existing config file
    #[error("Config file already exists: {0}")]
    AlreadyExists(PathBuf),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(String),
}
