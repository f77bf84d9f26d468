//! Error types for runner configuration and lifecycle

use logpilot_cleaner::CleanerError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while parsing a runner configuration or driving a runner
#[derive(Error, Debug)]
pub enum RunnerError {
    /// Configuration file is not valid JSON or has the wrong shape
    #[error("Failed to parse runner config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// A field is present but its value is unusable
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Field name as written in the file
        field: String,
        /// What is wrong with it
        reason: String,
    },

    /// The parsed configuration violates a structural invariant
    #[error("Invalid runner config: {0}")]
    Invalid(String),

    /// The log directory does not exist (yet)
    #[error("Log directory {0} does not exist")]
    LogDirNotFound(PathBuf),

    /// Filesystem error
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path the operation was applied to
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Start was called on a runner that already left the created state
    #[error("Runner {0} cannot be started twice")]
    AlreadyStarted(String),

    /// Cleanup coordination error
    #[error("Cleaner error: {0}")]
    Cleaner(#[from] CleanerError),
}

impl RunnerError {
    /// Whether this error means "retry once the log directory appears"
    pub fn is_log_dir_missing(&self) -> bool {
        matches!(self, RunnerError::LogDirNotFound(_))
    }

    /// Whether this error comes from the configuration itself
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            RunnerError::Parse(_)
                | RunnerError::MissingField(_)
                | RunnerError::InvalidValue { .. }
                | RunnerError::Invalid(_)
        )
    }
}
