//! gpg-bridge CLI
//!
//! Relays stdin/stdout to a gpg-agent that exposes its socket as a loopback
//! TCP port plus a descriptor file (e.g. gpg4win seen from WSL), and offers
//! a few one-shot diagnostics against the same agent.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gb_core::BridgeError;
use gpg_bridge::commands::{self, AgentOverrides};
use gpg_bridge::output::print_error;

/// Exit status after Ctrl+C / SIGTERM, as shells report it
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser)]
#[command(name = "gpg-bridge")]
#[command(author, version, about = "Bridge stdin/stdout to gpg-agent's TCP socket")]
#[command(propagate_version = true)]
struct Cli {
    /// GnuPG home directory holding the agent's socket files
    #[arg(long, global = true, env = "GPG_BRIDGE_BASE_PATH", value_name = "DIR")]
    gpg_base_path: Option<PathBuf>,

    /// Socket descriptor file name inside the GnuPG home directory
    #[arg(long, global = true, value_name = "NAME")]
    gpg_socket_name: Option<String>,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Relay stdin to the agent and its replies to stdout (default)
    Relay {
        /// Relay both directions concurrently
        #[arg(long)]
        duplex: bool,
    },

    /// Print the agent's version
    Version,

    /// Send a single Assuan command line and print the reply
    Query {
        /// Command line to send, e.g. "GETINFO pid"
        command: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Show config file path
    Path,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    // stdout carries relayed bytes, so logs go to stderr
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) if is_interrupted(&e) => {
            tracing::info!("Interrupted");
            EXIT_INTERRUPTED
        }
        Err(e) => {
            print_error(&format!("{:#}", e));
            1
        }
    };

    // Exit directly: a pending blocking stdin read would otherwise hold up
    // runtime shutdown.
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<()> {
    let overrides = AgentOverrides {
        gnupg_dir: cli.gpg_base_path,
        socket_name: cli.gpg_socket_name,
    };
    let command = cli.command.unwrap_or(Commands::Relay { duplex: false });

    match command {
        Commands::Relay { duplex } => {
            let config = commands::resolve_config(cli.config.as_ref(), &overrides)?;
            let cancel = CancellationToken::new();
            spawn_signal_handler(cancel.clone());
            commands::relay_command(&config, duplex, cancel).await?;
        }

        Commands::Version => {
            let config = commands::resolve_config(cli.config.as_ref(), &overrides)?;
            commands::version_command(&config).await?;
        }

        Commands::Query { command } => {
            let config = commands::resolve_config(cli.config.as_ref(), &overrides)?;
            commands::query_command(&config, &command).await?;
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                commands::config_show(cli.config.as_ref(), &overrides)?;
            }
            ConfigAction::Path => {
                commands::config_path(cli.config.as_ref());
            }
            ConfigAction::Init { force } => {
                commands::config_init(cli.config.as_ref(), force)?;
            }
        },
    }

    Ok(())
}

/// Cancel `cancel` on Ctrl+C or SIGTERM
fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    tracing::warn!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            result = ctrl_c => {
                if let Err(e) = result {
                    tracing::warn!("Failed to listen for Ctrl+C: {}", e);
                    return;
                }
                tracing::debug!("Received Ctrl+C, cancelling relay");
            }
            _ = terminate => {
                tracing::debug!("Received SIGTERM, cancelling relay");
            }
        }

        cancel.cancel();
    });
}

fn is_interrupted(err: &anyhow::Error) -> bool {
    err.downcast_ref::<BridgeError>()
        .map_or(false, BridgeError::is_interrupted)
}
