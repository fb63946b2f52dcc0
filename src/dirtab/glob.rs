//! Path glob patterns for dirtab rules
//!
//! - `*` matches any run of characters except `/`
//! - `?` matches exactly one character except `/`
//! - `\` escapes one of the special characters `\`, `*`, `?`
//!
//! A pattern always matches the whole path. Because wildcards never cross a
//! `/`, the literal slashes of a pattern line up one-to-one with the slashes of
//! a matching path, so matching is done segment by segment.

use crate::error::RuleError;
use std::fmt;

/// Characters that may follow a backslash
const SPECIAL_CHARS: &[char] = &['\\', '*', '?'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Literal(char),
    AnyRun,
    AnyOne,
}

/// A validated glob pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobPattern {
    source: String,
    /// Tokens between literal slashes
    segments: Vec<Vec<Token>>,
}

impl GlobPattern {
    /// Validate and compile a pattern; `line` is only used for error reporting
    pub fn parse(source: &str, line: usize) -> Result<Self, RuleError> {
        let mut segments = vec![Vec::new()];
        let mut chars = source.chars().enumerate();

        while let Some((idx, c)) = chars.next() {
            let token = match c {
                '\\' => match chars.next() {
                    Some((_, escaped)) if SPECIAL_CHARS.contains(&escaped) => Token::Literal(escaped),
                    Some((_, found)) => {
                        return Err(RuleError::InvalidEscape {
                            line,
                            column: idx + 1,
                            found,
                        })
                    }
                    None => return Err(RuleError::DanglingEscape { line }),
                },
                '*' => Token::AnyRun,
                '?' => Token::AnyOne,
                '/' => {
                    segments.push(Vec::new());
                    continue;
                }
                other => Token::Literal(other),
            };
            if let Some(current) = segments.last_mut() {
                current.push(token);
            }
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// The pattern text as written in the rule file
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True if the pattern contains no wildcard
    pub fn is_literal(&self) -> bool {
        self.segments
            .iter()
            .flatten()
            .all(|t| matches!(t, Token::Literal(_)))
    }

    /// Full-string match of `path` against the pattern
    pub fn matches(&self, path: &str) -> bool {
        let mut parts = path.split('/');
        for segment in &self.segments {
            match parts.next() {
                Some(part) => {
                    let text: Vec<char> = part.chars().collect();
                    if !match_segment(segment, &text) {
                        return false;
                    }
                }
                None => return false,
            }
        }
        parts.next().is_none()
    }
}

impl fmt::Display for GlobPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Wildcard match of one slash-free segment
///
/// Greedy with backtracking to the most recent `*` only, which is sufficient
/// inside a segment and keeps matching linear in practice.
fn match_segment(tokens: &[Token], text: &[char]) -> bool {
    let (mut p, mut t) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        match tokens.get(p) {
            Some(Token::AnyRun) => {
                star = Some((p + 1, t));
                p += 1;
                continue;
            }
            Some(Token::AnyOne) => {
                p += 1;
                t += 1;
                continue;
            }
            Some(Token::Literal(c)) if *c == text[t] => {
                p += 1;
                t += 1;
                continue;
            }
            _ => {}
        }

        match star {
            Some((resume, start)) => {
                star = Some((resume, start + 1));
                p = resume;
                t = start + 1;
            }
            None => return false,
        }
    }

    tokens[p..].iter().all(|t| *t == Token::AnyRun)
}
