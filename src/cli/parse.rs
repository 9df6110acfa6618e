//! CLI parse: clap types for drivesync. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Drivesync CLI - mirror local trees into a remote folder store
#[derive(Parser)]
#[command(name = "drivesync")]
#[command(about = "Incrementally upload local file trees to a remote folder store")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    #[arg(long, default_value = "config.yml")]
    pub conf: PathBuf,

    /// Enable debug logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// The command to run; `sync` when none is given.
    pub fn selected_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Sync)
    }
}

#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Upload new and changed files for every configured root (default)
    Sync,
    /// Verify every configured local path exists
    Check,
    /// Show the recorded upload history
    History {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}
