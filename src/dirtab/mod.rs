//! Dirtab: path rules naming sub-catalog candidates
//!
//! A dirtab file is line oriented:
//!
//! ```text
//! # comment
//! /usr/*            positive rule
//! ! /usr/.svn       negative rule
//! ```
//!
//! A path is selected when it matches at least one positive rule and no
//! negative rule. Malformed lines are dropped and reported; a pattern listed
//! with both polarities makes the set invalid. An invalid set can still be
//! queried.

pub mod glob;

pub use glob::GlobPattern;

use crate::error::{RuleError, StorageError};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

/// Whether a rule selects or excludes paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
}

/// One parsed dirtab line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub pattern: GlobPattern,
    pub polarity: Polarity,
    /// 1-based line number in the source text
    pub line: usize,
}

/// Parsed, immutable rule set
#[derive(Debug, Clone, Default)]
pub struct Dirtab {
    rules: Vec<Rule>,
    errors: Vec<RuleError>,
    contradictions: Vec<String>,
}

impl Dirtab {
    /// Parse dirtab text; never fails, see `is_valid` and `errors`
    pub fn parse(text: &str) -> Self {
        let mut rules = Vec::new();
        let mut errors = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (polarity, pattern) = match line.strip_prefix('!') {
                Some(rest) => (Polarity::Negative, rest.trim_start()),
                None => (Polarity::Positive, line),
            };

            match GlobPattern::parse(pattern, line_no) {
                Ok(pattern) => rules.push(Rule {
                    pattern,
                    polarity,
                    line: line_no,
                }),
                Err(e) => {
                    warn!(error = %e, "Dropping malformed dirtab rule");
                    errors.push(e);
                }
            }
        }

        let contradictions = find_contradictions(&rules);
        for pattern in &contradictions {
            warn!(pattern = %pattern, "Dirtab pattern is both selected and excluded");
        }

        let dirtab = Self {
            rules,
            errors,
            contradictions,
        };
        debug!(
            positive = dirtab.positive_rule_count(),
            negative = dirtab.negative_rule_count(),
            valid = dirtab.is_valid(),
            "Parsed dirtab"
        );
        dirtab
    }

    /// Read and parse a dirtab file
    pub fn from_file(path: &Path) -> Result<Self, StorageError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to read dirtab {}: {}", path.display(), e),
            ))
        })?;
        Ok(Self::parse(&text))
    }

    /// False if any line failed to parse or a pattern has both polarities
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.contradictions.is_empty()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn positive_rule_count(&self) -> usize {
        self.positive_rules().count()
    }

    pub fn negative_rule_count(&self) -> usize {
        self.negative_rules().count()
    }

    /// All rules in file order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn positive_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| r.polarity == Polarity::Positive)
    }

    pub fn negative_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| r.polarity == Polarity::Negative)
    }

    /// Lines that were dropped
    pub fn errors(&self) -> &[RuleError] {
        &self.errors
    }

    /// Patterns that appear with both polarities
    pub fn contradictions(&self) -> &[String] {
        &self.contradictions
    }

    /// True if `path` matches a positive rule and no negative rule
    pub fn is_matching(&self, path: impl AsRef<str>) -> bool {
        let path = path.as_ref();
        self.positive_rules().any(|r| r.pattern.matches(path))
            && !self.negative_rules().any(|r| r.pattern.matches(path))
    }
}

fn find_contradictions(rules: &[Rule]) -> Vec<String> {
    let positive: HashSet<&str> = rules
        .iter()
        .filter(|r| r.polarity == Polarity::Positive)
        .map(|r| r.pattern.as_str())
        .collect();

    let mut seen = HashSet::new();
    rules
        .iter()
        .filter(|r| r.polarity == Polarity::Negative)
        .map(|r| r.pattern.as_str())
        .filter(|p| positive.contains(p) && seen.insert(*p))
        .map(str::to_string)
        .collect()
}
