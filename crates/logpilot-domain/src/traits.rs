//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::RunnerConfig;

/// Trait for turning configuration-file bytes into a [`RunnerConfig`]
///
/// Implemented by the infrastructure layer (logpilot-runner).
/// Implementations must be deterministic and side-effect free, and must
/// never hand back a partially populated config: any malformed input is an
/// error.
pub trait ConfigParser {
    /// Error type for parse failures
    type Error;

    /// Parse one configuration file's contents
    fn parse(&self, bytes: &[u8]) -> Result<RunnerConfig, Self::Error>;
}
