//! Command names used in log records.

use crate::cli::parse::{Commands, DirtabCommands};

/// Dotted command name, e.g. "dirtab.check"
pub fn command_name(command: &Commands) -> String {
    match command {
        Commands::Hash { .. } => "hash".to_string(),
        Commands::Diff { .. } => "diff".to_string(),
        Commands::Dirtab { command } => format!("dirtab.{}", dirtab_command_name(command)),
    }
}

pub fn dirtab_command_name(command: &DirtabCommands) -> &'static str {
    match command {
        DirtabCommands::Check { .. } => "check",
        DirtabCommands::Match { .. } => "match",
        DirtabCommands::Watch { .. } => "watch",
    }
}
