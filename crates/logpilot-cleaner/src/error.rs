//! Error types for cleanup coordination

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while registering runners or cleaning log directories
#[derive(Error, Debug)]
pub enum CleanerError {
    /// Filesystem error on a log directory or log file
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path the operation was applied to
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A policy with deletion disabled was offered for registration
    #[error("Deletion is disabled for {0}; nothing to register")]
    DeletionDisabled(PathBuf),

    /// A done marker named a file outside the registered log directory
    #[error("{file} is outside log directory {log_dir}")]
    OutsideLogDir {
        /// File named by the done marker
        file: PathBuf,
        /// Log directory of the registration
        log_dir: PathBuf,
    },

    /// Worker error (tokio runtime issues)
    #[error("Worker error: {0}")]
    Worker(String),
}
