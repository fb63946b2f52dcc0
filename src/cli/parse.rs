//! CLI parse: clap types for snapcat. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// snapcat - snapshot catalog differencing and dirtab rules
#[derive(Parser, Debug)]
#[command(name = "snapcat", version)]
#[command(about = "Diff directory snapshots with Merkle pruning and evaluate dirtab path rules")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (where snapcat.toml is looked up)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(long, default_value = "false")]
    pub verbose: bool,

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

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a directory and print its root hash
    Hash {
        /// Directory to scan
        dir: PathBuf,
    },
    /// Scan two directories and report what changed between them
    Diff {
        /// Directory holding the old state
        old: PathBuf,
        /// Directory holding the new state
        new: PathBuf,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Dirtab rule files
    Dirtab {
        #[command(subcommand)]
        command: DirtabCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum DirtabCommands {
    /// Parse a rule file and report rule counts, errors and validity
    Check {
        file: PathBuf,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Evaluate catalog paths against a rule file
    Match {
        file: PathBuf,
        /// Absolute catalog paths, e.g. /usr/local
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Re-evaluate paths whenever the rule file changes
    Watch {
        file: PathBuf,
        #[arg(required = true)]
        paths: Vec<String>,
        /// Exit after this many reloads (default: run until interrupted)
        #[arg(long)]
        max_reloads: Option<usize>,
    },
}
