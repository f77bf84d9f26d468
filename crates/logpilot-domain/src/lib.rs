//! Logpilot Domain Layer
//!
//! This crate holds the model shared by every other logpilot crate. It has
//! no external dependencies and defines the value objects and trait
//! interfaces the infrastructure layers build on.
//!
//! ## Key Concepts
//!
//! - **RunnerConfig**: One parsed configuration file, describing a single
//!   collection pipeline (the "runner")
//! - **CleanupPolicy**: Whether and how fully-consumed log files are deleted
//! - **Canonical paths**: Log directories are keyed by their resolved,
//!   absolute path so that two configurations naming the same directory
//!   differently share one cleanup queue
//!
//! ## Architecture
//!
//! - No external crate dependencies
//! - Configuration *syntax* lives in `logpilot-runner`; this crate only sees
//!   the validated structure through the [`traits::ConfigParser`] seam

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod path;
pub mod policy;
pub mod traits;

// Re-exports for convenience
pub use config::{BatchSettings, ReaderSettings, RunnerConfig};
pub use path::{absolute_path, canonical_path, resolve_path};
pub use policy::CleanupPolicy;
