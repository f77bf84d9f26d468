//! Runner and runner-factory seams used by the manager

use crate::RunnerError;
use async_trait::async_trait;
use logpilot_cleaner::CleanerHandle;
use logpilot_domain::{CleanupPolicy, RunnerConfig};
use std::path::Path;

/// Lifecycle state of a runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerStatus {
    /// Built from a configuration, not started yet
    Created,
    /// Background work active
    Running,
    /// Torn down; resources released
    Stopped,
}

impl RunnerStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RunnerStatus::Created => "created",
            RunnerStatus::Running => "running",
            RunnerStatus::Stopped => "stopped",
        }
    }
}

/// One configuration-driven collection pipeline
///
/// The manager owns each runner exclusively, keyed by the configuration
/// file that produced it.
#[async_trait]
pub trait Runner: Send + Sync {
    /// Runner name from its configuration
    fn name(&self) -> &str;

    /// Canonical log directory the runner consumes
    fn log_dir(&self) -> &Path;

    /// Deletion policy the runner declares for its log directory
    fn cleanup_policy(&self) -> CleanupPolicy;

    /// Current lifecycle state
    fn status(&self) -> RunnerStatus;

    /// Start background work.
    ///
    /// `cleaner` is the runner's registration with its directory's clean
    /// queue, present only when the runner's policy enables deletion.
    async fn start(&mut self, cleaner: Option<CleanerHandle>) -> Result<(), RunnerError>;

    /// Stop background work; calling it again is a no-op
    async fn stop(&mut self);
}

/// Builds runners from parsed configurations
pub trait RunnerFactory: Send + Sync {
    /// Build (but do not start) a runner.
    ///
    /// Returns [`RunnerError::LogDirNotFound`] when the log directory does
    /// not exist yet, so the caller can retry later.
    fn create(&self, config: RunnerConfig) -> Result<Box<dyn Runner>, RunnerError>;
}
