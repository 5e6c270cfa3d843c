//! Export error types.

use std::path::PathBuf;

use lmsx_core::CoreError;
use thiserror::Error;

/// Why a single pipeline step failed.
#[derive(Debug, Error)]
pub enum StepError {
    /// The program could not be started at all.
    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited unsuccessfully.
    #[error("'{program}' exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: String,
        stderr: String,
    },

    /// Local filesystem work around a step failed.
    #[error("io error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Program output was not what the step expected.
    #[error("unexpected output from '{program}': {reason}")]
    Output { program: String, reason: String },

    /// A value the step needs was never resolved.
    #[error("missing {0}")]
    Missing(&'static str),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// A value the configuration resolver could not determine.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("unresolved {field}: {reason}")]
    Unresolved { field: &'static str, reason: String },

    #[error("multiple buckets match the {kind} pattern: {}", .candidates.join(", "))]
    AmbiguousBucket {
        kind: &'static str,
        candidates: Vec<String>,
    },

    #[error("bucket listing failed: {0}")]
    Listing(#[source] StepError),

    #[error("invalid bucket pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Errors that stop a run before any step executes.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Diagnostic mode refuses to start with unresolved values.
    #[error("{} configuration value(s) unresolved: {}", .0.len(), join_errors(.0))]
    Unresolved(Vec<ResolveError>),

    #[error(transparent)]
    Core(#[from] CoreError),
}

fn join_errors(errors: &[ResolveError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
