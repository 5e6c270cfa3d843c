//! Validation errors for core lmsx types.
//!
//! Subprocess and resolution errors live in `lmsx-export`; configuration
//! loading errors live in `lmsx-config`. The binary converges them with `anyhow`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// The deployment identity is empty or not shaped like `host.domain`.
    #[error("Invalid deployment identity '{value}': {reason}")]
    InvalidIdentity { value: String, reason: String },

    /// A table export spec cannot be used safely.
    #[error("Invalid table spec '{table}': {reason}")]
    InvalidTable { table: String, reason: String },

    /// A rendered output path escapes the report root.
    #[error("Output path '{path}' must stay inside the report root")]
    PathEscapesRoot { path: String },
}
