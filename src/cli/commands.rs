use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::recovery::ErrorCategory;

#[derive(Parser)]
#[command(name = "recovery-pilot")]
#[command(author, version, about = "Automatic error-recovery orchestrator", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Path to the TOML configuration file
    #[arg(
        long,
        global = true,
        env = "RECOVERY_PILOT_CONFIG",
        default_value = "recovery-pilot.toml"
    )]
    pub config: PathBuf,
}

/// Output format for CLI results.
/// - Text: Human-readable text output (default)
/// - Json: One JSON document per result
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run recoveries against a scripted environment
    Simulate {
        /// Error category (network, rate_limit, server, ...)
        #[arg(long)]
        category: ErrorCategory,

        /// HTTP status code attached to the error
        #[arg(long)]
        status_code: Option<u16>,

        /// Server-provided wait for rate-limit errors
        #[arg(long)]
        retry_after_ms: Option<u64>,

        /// Start with the network reported as down
        #[arg(long)]
        offline: bool,

        /// Bring the network back after this many milliseconds
        #[arg(long, requires = "offline")]
        online_after_ms: Option<u64>,

        /// Number of concurrent recovery calls
        #[arg(long, default_value = "1")]
        calls: u32,
    },

    /// Classify an error message
    Classify {
        /// Raw error message
        message: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Check the configuration file for invalid values
    Validate,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
