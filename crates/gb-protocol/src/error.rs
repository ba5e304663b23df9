//! Protocol error types

use thiserror::Error;

/// Errors raised while parsing the agent's connection descriptor
#[derive(Error, Debug)]
pub enum DescriptorError {
    /// The first line is not a decimal port number
    #[error("Invalid port line {line:?}: {source}")]
    InvalidPort {
        line: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// No newline within the longest possible port line
    #[error("Port line too long: {line:?}")]
    PortLineTooLong { line: String },

    /// The byte source failed or ended early
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Violations of the line-oriented command/response exchange
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Response line has no space between status tag and payload
    #[error("Malformed response (no tag separator): {line:?}")]
    MissingSeparator { line: String },

    /// Connection closed before any response byte arrived
    #[error("Agent closed the connection without responding")]
    EmptyResponse,

    /// Command would not fit on a single protocol line
    #[error("Command must be a single non-empty line: {0:?}")]
    InvalidCommand(String),

    /// Agent answered with an `ERR` line
    #[error("gpg-agent returned an error: {0}")]
    AgentError(String),

    /// Operation requires a completed handshake
    #[error("Session is not authenticated")]
    NotAuthenticated,

    /// Handshake attempted twice on the same connection
    #[error("Session is already authenticated")]
    AlreadyAuthenticated,
}
