//! gb-cli: Command-line interface for gpg-bridge
//!
//! Provides the `gpg-bridge` binary, which relays its standard streams to
//! gpg-agent or runs single diagnostic queries against it.

pub mod commands;
pub mod output;
