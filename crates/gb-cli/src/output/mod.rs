//! Output formatting utilities for the CLI
//!
//! stdout belongs to the relayed byte stream whenever the bridge runs, so
//! every diagnostic helper here writes to stderr. Only `config` subcommands
//! print their results to stdout.

use std::path::Path;

use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use tabled::{settings::Style, Table, Tabled};

use gb_core::config::BridgeConfig;

/// Format the effective configuration as a two-column table
///
/// Unresolvable values (e.g. a missing home directory) are shown as `-`.
pub fn format_config(config: &BridgeConfig) -> String {
    #[derive(Tabled)]
    struct SettingRow {
        #[tabled(rename = "SETTING")]
        key: &'static str,
        #[tabled(rename = "VALUE")]
        value: String,
    }

    let rows = vec![
        SettingRow {
            key: "agent.gnupg_dir",
            value: display_path(config.agent.gnupg_dir.as_deref()),
        },
        SettingRow {
            key: "agent.socket_name",
            value: config.agent.socket_name.clone(),
        },
        SettingRow {
            key: "agent.socket_path",
            value: display_path(config.agent.socket_path().ok().as_deref()),
        },
        SettingRow {
            key: "relay.duplex",
            value: config.relay.duplex.to_string(),
        },
    ];

    Table::new(rows).with(Style::rounded()).to_string()
}

fn display_path(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Print a success message with a green checkmark
///
/// Used for config file changes; goes to stderr like every other status line.
pub fn print_success(msg: &str) {
    print_tagged(Color::Green, "✓", msg);
}

/// Print an error message with a red cross
///
/// The binary reports every failed command through this before exiting.
pub fn print_error(msg: &str) {
    print_tagged(Color::Red, "✗", msg);
}

/// Print a warning with a yellow warning sign
pub fn print_warning(msg: &str) {
    print_tagged(Color::Yellow, "⚠", msg);
}

/// Print an informational hint with a cyan info sign
pub fn print_info(msg: &str) {
    print_tagged(Color::Cyan, "ℹ", msg);
}

/// Write `<symbol> <msg>` to stderr, coloring only the symbol
///
/// Write failures are ignored; there is nowhere left to report them.
fn print_tagged(color: Color, symbol: &str, msg: &str) {
    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(color),
        Print(symbol),
        ResetColor,
        Print(format!(" {}\n", msg))
    );
}
