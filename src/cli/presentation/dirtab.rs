//! Dirtab presentation: check summaries and per-path verdicts.

use super::{format_section_heading, to_json_string};
use crate::catalog::CatalogPath;
use crate::dirtab::Dirtab;
use crate::error::ApiError;
use chrono::{SecondsFormat, Utc};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use std::path::Path;

pub fn format_check_text(file: &Path, dirtab: &Dirtab) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n",
        format_section_heading(&format!("Dirtab {}", file.display()))
    ));

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Rules", "Positive", "Negative", "Valid"]);
    table.add_row(vec![
        dirtab.rule_count().to_string(),
        dirtab.positive_rule_count().to_string(),
        dirtab.negative_rule_count().to_string(),
        if dirtab.is_valid() { "yes" } else { "no" }.to_string(),
    ]);
    out.push_str(&format!("{}\n", table));

    if !dirtab.errors().is_empty() {
        out.push_str(&format!("\nErrors ({}):", dirtab.errors().len()));
        for e in dirtab.errors() {
            out.push_str(&format!("\n  - {}", e));
        }
        out.push('\n');
    }
    if !dirtab.contradictions().is_empty() {
        out.push_str(&format!(
            "\nContradicting rules ({}):",
            dirtab.contradictions().len()
        ));
        for pattern in dirtab.contradictions() {
            out.push_str(&format!("\n  - {} is both selected and excluded", pattern));
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}

pub fn format_check_json(file: &Path, dirtab: &Dirtab) -> Result<String, ApiError> {
    let rules: Vec<serde_json::Value> = dirtab
        .rules()
        .iter()
        .map(|r| {
            serde_json::json!({
                "line": r.line,
                "pattern": r.pattern.as_str(),
                "polarity": r.polarity,
            })
        })
        .collect();
    let errors: Vec<serde_json::Value> = dirtab
        .errors()
        .iter()
        .map(|e| serde_json::json!({ "line": e.line(), "message": e.to_string() }))
        .collect();

    let value = serde_json::json!({
        "file": file.display().to_string(),
        "valid": dirtab.is_valid(),
        "rule_count": dirtab.rule_count(),
        "positive_rule_count": dirtab.positive_rule_count(),
        "negative_rule_count": dirtab.negative_rule_count(),
        "rules": rules,
        "errors": errors,
        "contradictions": dirtab.contradictions(),
    });
    to_json_string(&value)
}

/// One row per path with its verdict
pub fn format_match_text(dirtab: &Dirtab, paths: &[CatalogPath]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Path", "Selected"]);
    for path in paths {
        let verdict = if dirtab.is_matching(path) { "yes" } else { "no" };
        table.add_row(vec![path.to_string(), verdict.to_string()]);
    }
    let mut out = table.to_string();
    if !dirtab.is_valid() {
        out.push_str(&format!(
            "\n{} rule set is invalid, see `snapcat dirtab check`",
            "warning:".yellow()
        ));
    }
    out
}

/// Verdicts printed after the rule file was reloaded
pub fn format_reload_text(reload: usize, dirtab: &Dirtab, paths: &[CatalogPath]) -> String {
    format!(
        "{} reload #{} at {}\n{}",
        format_section_heading("Dirtab changed"),
        reload,
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        format_match_text(dirtab, paths)
    )
}
