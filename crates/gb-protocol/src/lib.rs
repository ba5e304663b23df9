//! gb-protocol: Wire format for gpg-bridge
//!
//! This crate defines the connection descriptor published by gpg-agent and
//! the handful of line-oriented messages exchanged over the agent's TCP
//! socket emulation.

pub mod descriptor;
pub mod error;
pub mod message;

pub use descriptor::{ConnectionDescriptor, TOKEN_LEN};
pub use error::{DescriptorError, ProtocolError};
pub use message::{Command, Response, GREETING, MAX_LINE_LEN};
