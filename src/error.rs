//! Fatal error taxonomy for workspace loading and scheduling.
//!
//! Per-unit checker failures and fix conflicts are not errors in this sense;
//! they are recorded on results and surfaced through the summary and the
//! aggregate exit code.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("compile database not found: {0}")]
    NotFound(PathBuf),

    #[error("compile database {path} is malformed: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("no valid compile units found under {0}")]
    EmptyWorkspace(PathBuf),

    #[error("failed to build worker pool: {0}")]
    Pool(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
