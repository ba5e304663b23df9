//! gb-core: Session handling for gpg-bridge
//!
//! This crate opens an authenticated connection to gpg-agent's TCP socket
//! emulation and either runs a single command against it or relays a local
//! byte stream through it.

pub mod bridge;
pub mod client;
pub mod command;
pub mod config;
pub mod connector;
pub mod error;
pub mod session;
pub mod traits;

pub use bridge::{RelayMode, RelayStats, StreamBridge};
pub use client::AgentClient;
pub use command::CommandChannel;
pub use connector::{TcpDialer, CONNECT_TIMEOUT};
pub use error::{BridgeError, ConfigError};
pub use session::Session;
