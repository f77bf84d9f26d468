//! Error types for the manager

use logpilot_runner::RunnerError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the manager
///
/// Per-file failures (a bad configuration, a runner that fails to start)
/// are logged and isolated; only the variants returned by
/// [`crate::Manager::new`] and [`crate::Manager::watch`] reach the caller.
#[derive(Error, Debug)]
pub enum ManagerError {
    /// Manager configuration is structurally invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Manager configuration file is not valid TOML
    #[error("Failed to parse manager config TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// Directory or file access failure
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path the operation was applied to
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A runner could not be built or started
    #[error("Runner lifecycle error for {path}: {source}")]
    Lifecycle {
        /// Configuration file of the runner
        path: PathBuf,
        /// What went wrong
        #[source]
        source: RunnerError,
    },

    /// A background task did not stop within the grace period
    #[error("Shutdown timed out: {0}")]
    ShutdownTimeout(String),

    /// `watch` was called a second time
    #[error("Manager is already watching; directories are fixed once watching starts")]
    AlreadyWatching,

    /// The manager has been stopped
    #[error("Manager has been stopped")]
    Stopped,
}
