//! CLI domain: parse, route, help, output, and presentation only.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{Cli, Commands, DirtabCommands, OutputFormat};
pub use presentation::{
    format_check_json, format_check_text, format_diff_json, format_diff_text, format_match_text,
    DiffReport,
};
pub use route::RunContext;
