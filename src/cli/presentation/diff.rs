//! Diff presentation: colored change list with a summary table, or a json report.

use super::{format_section_heading, to_json_string};
use crate::catalog::DirectoryEntry;
use crate::diff::{DiffEvent, DiffStats};
use crate::error::ApiError;
use crate::types::{hash_to_hex, Hash};
use chrono::{SecondsFormat, Utc};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Everything one `diff` command produced
pub struct DiffReport {
    pub old_root: Hash,
    pub new_root: Hash,
    pub events: Vec<DiffEvent>,
    pub stats: DiffStats,
}

pub fn format_diff_text(report: &DiffReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", format_section_heading("Changes")));

    if report.events.is_empty() {
        out.push_str("  No differences\n");
    }
    for event in &report.events {
        let line = match event {
            DiffEvent::Add { path, entry, .. } => {
                format!("{} {} ({})", "+".green(), path, entry.kind.as_str())
            }
            DiffEvent::Remove { path, entry } => {
                format!("{} {} ({})", "-".red(), path, entry.kind.as_str())
            }
            DiffEvent::Modify { path, old, new } => {
                format!("{} {} [{}]", "~".yellow(), path, describe_modification(old, new))
            }
        };
        out.push_str(&format!("  {}\n", line));
    }

    out.push_str(&format!("\n{}\n", format_section_heading("Summary")));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Added", "Removed", "Modified", "Pruned dirs", "Listed dirs"]);
    table.add_row(vec![
        report.stats.added.to_string(),
        report.stats.removed.to_string(),
        report.stats.modified.to_string(),
        report.stats.pruned.to_string(),
        report.stats.directories_visited.to_string(),
    ]);
    out.push_str(&format!("{}\n", table));
    out.push_str(&format!(
        "  Old root: {}\n  New root: {}",
        hash_to_hex(&report.old_root),
        hash_to_hex(&report.new_root)
    ));
    out
}

pub fn format_diff_json(report: &DiffReport) -> Result<String, ApiError> {
    let value = serde_json::json!({
        "generated_at": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "old_root": hash_to_hex(&report.old_root),
        "new_root": hash_to_hex(&report.new_root),
        "stats": report.stats,
        "events": report.events,
    });
    to_json_string(&value)
}

/// Which fields differ, e.g. "size 3 -> 5, content"
fn describe_modification(old: &DirectoryEntry, new: &DirectoryEntry) -> String {
    if old.kind != new.kind {
        return format!("{} -> {}", old.kind.as_str(), new.kind.as_str());
    }
    let mut parts = Vec::new();
    if old.size != new.size {
        parts.push(format!("size {} -> {}", old.size, new.size));
    }
    if old.content_hash != new.content_hash {
        parts.push("content".to_string());
    }
    if old.mode != new.mode {
        parts.push(format!("mode {:o} -> {:o}", old.mode, new.mode));
    }
    if old.symlink != new.symlink {
        parts.push("target".to_string());
    }
    if parts.is_empty() {
        "metadata".to_string()
    } else {
        parts.join(", ")
    }
}
