//! Error types for catalog differencing, dirtab rules and the surrounding tooling.

use crate::catalog::CatalogPath;
use thiserror::Error;

/// Filesystem scanning errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A catalog store could not resolve a root or a path
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("No catalog for root hash {0}")]
    RootNotFound(String),

    #[error("Path not found in catalog: {0}")]
    PathNotFound(CatalogPath),

    #[error("Not a directory: {0}")]
    NotADirectory(CatalogPath),

    #[error("Catalog fetch failed for {path}: {reason}")]
    Unavailable { path: CatalogPath, reason: String },
}

/// Failure of a whole `TreeDiffer::compute` call
#[derive(Debug, Error)]
pub enum DiffError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Diff sink failed: {0}")]
    Sink(String),
}

/// A single malformed line in a dirtab rule file
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("line {line}: '\\{found}' at column {column} does not escape a special character")]
    InvalidEscape {
        line: usize,
        column: usize,
        found: char,
    },

    #[error("line {line}: pattern ends with a dangling escape")]
    DanglingEscape { line: usize },
}

impl RuleError {
    /// 1-based line number in the rule file
    pub fn line(&self) -> usize {
        match self {
            RuleError::InvalidEscape { line, .. } | RuleError::DanglingEscape { line } => *line,
        }
    }
}

/// Background file watcher errors
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Watcher error: {0}")]
    Notify(#[from] notify::Error),

    #[error("Failed to spawn watcher thread: {0}")]
    Spawn(std::io::Error),

    #[error("Watcher thread exited before signalling readiness")]
    Handshake,
}

/// Top-level errors for configuration and command execution
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Fetch error: {0}")]
    FetchError(#[from] FetchError),

    #[error("Diff error: {0}")]
    DiffError(#[from] DiffError),

    #[error("Watch error: {0}")]
    WatchError(#[from] WatchError),

    #[error("Rule file error: {0}")]
    RuleFile(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
