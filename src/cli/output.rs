//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{ApiError, MergeError, TreeError};

/// Map domain errors to a message for CLI output, with a hint where the fix
/// lives in a declaration file.
pub fn map_error(e: &ApiError) -> String {
    let hint = match e {
        ApiError::Merge(MergeError::StrategyConflict { .. }) => {
            Some("declare the same strategy in every listed file, or remove all but one")
        }
        ApiError::Merge(MergeError::UnknownStrategy { .. }) => {
            Some("valid strategies: override, merge, list-append, shell-merge, pipe (compose)")
        }
        ApiError::Tree(TreeError::Collision { .. }) => {
            Some("rename or remove all but one of the listed sources")
        }
        _ => None,
    };
    match hint {
        Some(hint) => format!("Error: {}\nhint: {}", e, hint),
        None => format!("Error: {}", e),
    }
}
