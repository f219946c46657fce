//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Stream screen-edge colors to an LED strip over a serial link
#[derive(Parser, Debug)]
#[command(name = "ambilight-stream")]
#[command(version, about = "Screen-to-LED ambient lighting over serial", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Capture the screen and stream colors until Ctrl+C
    #[command(after_help = "EXAMPLES:
    ambilight-stream run
    ambilight-stream run --port /dev/ttyUSB0
    ambilight-stream run -c ~/ambilight.toml --verbose")]
    Run {
        /// Serial port (overrides serial.port from the config file)
        #[arg(long, short)]
        port: Option<String>,
    },
    /// List available serial ports
    ListPorts,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// Show effective configuration
    Show,
    /// Create default config file
    Init,
    /// Print the config file path
    Path,
}
