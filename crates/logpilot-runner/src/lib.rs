//! Logpilot Runner
//!
//! Everything the manager needs to know about a single collection pipeline:
//!
//! - **Configuration files**: [`JsonConfigParser`] turns one JSON file into a
//!   validated [`logpilot_domain::RunnerConfig`]
//! - **Lifecycle**: the [`Runner`] and [`RunnerFactory`] seams; a runner is
//!   created, started once, and stopped once
//! - **Cleanup participation**: [`LogDirRunner`] forwards the reader's done
//!   markers to its log directory's clean queue via [`DoneTracker`]
//!
//! # Usage
//!
//! ```no_run
//! use logpilot_domain::traits::ConfigParser;
//! use logpilot_runner::{JsonConfigParser, LogDirRunnerFactory, RunnerFactory};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = std::fs::read("/etc/logpilot/confs/nginx.conf")?;
//! let config = JsonConfigParser::new().parse(&bytes)?;
//!
//! let mut runner = LogDirRunnerFactory::default().create(config)?;
//! runner.start(None).await?;
//! // ...
//! runner.stop().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod done;
mod error;
mod log_dir;
mod runner;

pub use config::JsonConfigParser;
pub use done::{DoneTracker, DONE_FILE_PREFIX};
pub use error::RunnerError;
pub use log_dir::{LogDirRunner, LogDirRunnerFactory, DEFAULT_DONE_SCAN_INTERVAL};
pub use runner::{Runner, RunnerFactory, RunnerStatus};
