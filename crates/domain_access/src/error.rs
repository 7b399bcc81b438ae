//! Access domain errors

use thiserror::Error;

/// Errors that can occur in the access domain
#[derive(Debug, Error)]
pub enum AccessError {
    /// Stored permission list is not a JSON array of strings
    #[error("Malformed permission list: {0}")]
    MalformedPermissions(#[from] serde_json::Error),

    /// Role name is blank or already taken
    #[error("Invalid role: {0}")]
    InvalidRole(String),
}
