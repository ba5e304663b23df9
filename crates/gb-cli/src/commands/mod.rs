//! CLI command implementations

mod agent;
mod config;
mod relay;

pub use agent::{query_command, version_command};
pub use config::{config_init, config_path, config_show, resolve_config, AgentOverrides};
pub use relay::relay_command;
