//! Logpilot Manager
//!
//! Turns directories of runner configuration files into a live set of
//! collection pipelines, and keeps shared log directories clean.
//!
//! ## Responsibilities
//!
//! - **Watching**: one polling task per configuration directory diffs the
//!   files ending in the configured suffix and reports additions, changes
//!   and removals ([`ConfigWatcher`])
//! - **Runner lifecycle**: an added file starts a runner, a removed file
//!   stops it, a changed file restarts it; a file that fails to parse runs
//!   nothing ([`Manager`])
//! - **Cleanup**: runners whose policy enables deletion register with the
//!   clean queue of their canonical log directory; a file is deleted only
//!   once every registered runner is done with it
//!
//! ## Missing directories
//!
//! Neither a configuration directory nor a runner's log directory has to
//! exist up front. Both are retried every
//! [`ManagerConfig::dir_not_exist_sleep`].
//!
//! ## Example
//!
//! ```no_run
//! use logpilot_manager::{Manager, ManagerConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), logpilot_manager::ManagerError> {
//! let manager = Manager::new(ManagerConfig::default())?;
//! manager.watch(&["/etc/logpilot/confs"]).await?;
//! println!("running: {:?}", manager.runner_names());
//! manager.stop().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod manager;
pub mod watcher;

pub use config::{
    ManagerConfig, RunnerDefaults, DEFAULT_DIR_NOT_EXIST_SLEEP, DIR_NOT_EXIST_SLEEP_ENV,
};
pub use error::ManagerError;
pub use manager::{Manager, SharedFactory, SharedParser};
pub use watcher::{ConfigEvent, ConfigWatcher};
