//! Logpilot Cleaner
//!
//! Shared cleanup coordination for log directories read by several runners.
//!
//! # Overview
//!
//! Every canonical log directory that at least one deleting runner reads
//! gets a [`CleanQueue`]. The queue tracks:
//! - **Cleaner count**: how many registered runners depend on the directory
//! - **Done markers**: which of those runners have finished with each file
//! - **Policy**: the most conservative merge of the runners' policies
//!
//! A file becomes deletable only once *every currently registered* runner
//! has marked it done. Deletion happens on the queue's periodic cycle
//! ([`CleanerWorker`]), never inline with a mark, and a retention window
//! (reserved file count and size) is applied on top of the acknowledgment
//! check.
//!
//! # Usage
//!
//! ```no_run
//! use logpilot_cleaner::CleanerRegistry;
//! use logpilot_domain::CleanupPolicy;
//! use std::path::Path;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = CleanerRegistry::new();
//! let policy = CleanupPolicy { delete_enable: true, ..Default::default() };
//!
//! let handle = registry.register(Path::new("/var/log/app"), policy)?;
//! handle.mark_done(Path::new("/var/log/app/app.log.1"))?;
//!
//! // ... once the runner stops
//! registry.deregister(&handle);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod error;
mod metrics;
mod queue;
mod registry;
mod worker;

pub use error::CleanerError;
pub use metrics::CleanerMetrics;
pub use queue::{CleanQueue, SweepReport};
pub use registry::{CleanerHandle, CleanerRegistry};
pub use worker::CleanerWorker;
