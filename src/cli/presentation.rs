//! CLI presentation: text and json formatters per command family.

mod diff;
mod dirtab;

pub use diff::{format_diff_json, format_diff_text, DiffReport};
pub use dirtab::{
    format_check_json, format_check_text, format_match_text, format_reload_text,
};

use crate::error::ApiError;
use owo_colors::OwoColorize;

/// Section heading with bold/underline
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

pub(crate) fn to_json_string(value: &serde_json::Value) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::ConfigError(format!("Failed to render json: {}", e)))
}
