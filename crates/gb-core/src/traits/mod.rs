//! Core trait definitions

mod connection;

pub use connection::{AgentStream, DescriptorOpener, Dialer, FsOpener};
