//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{ApiError, DiffError, FetchError};

/// Map domain errors to a single line for stderr
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::DiffError(DiffError::Fetch(FetchError::RootNotFound(root))) => {
            format!("error: snapshot {} is not loaded", root)
        }
        ApiError::RuleFile(msg) => format!("error: {}", msg),
        other => format!("error: {}", other),
    }
}
