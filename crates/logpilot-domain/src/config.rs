//! Runner configuration - the validated form of one configuration file

use crate::CleanupPolicy;
use std::path::PathBuf;
use std::time::Duration;

/// Batching parameters of a runner's sender stage.
///
/// The manager never interprets these; they pass through to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSettings {
    /// Maximum records per batch
    pub batch_len: usize,

    /// Maximum bytes per batch
    pub batch_size: usize,

    /// Maximum time a partial batch waits before being flushed (seconds)
    pub batch_interval_secs: u64,

    /// Send attempts before a batch is handed to the fault-tolerant queue
    pub batch_try_times: u32,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            batch_len: 1000,
            batch_size: 2 * 1024 * 1024,
            batch_interval_secs: 60,
            batch_try_times: 3,
        }
    }
}

impl BatchSettings {
    /// Batch flush interval as a Duration
    pub fn batch_interval(&self) -> Duration {
        Duration::from_secs(self.batch_interval_secs)
    }
}

/// Where a runner reads from and where it keeps its progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderSettings {
    /// Log directory the runner consumes (absolute; canonical once it exists)
    pub log_path: PathBuf,

    /// Directory holding the runner's offsets and done markers
    pub meta_path: PathBuf,

    /// Reader mode, e.g. `dir` or `file`
    pub mode: String,

    /// Starting position for fresh reads, e.g. `oldest` or `newest`
    pub read_from: String,

    /// Skip dot-files in the log directory
    pub ignore_hidden: bool,
}

/// Immutable, parsed configuration of a single runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Runner name (not necessarily unique across files)
    pub name: String,

    /// Reader settings, including the log directory
    pub reader: ReaderSettings,

    /// Deletion policy for consumed files
    pub cleanup: CleanupPolicy,

    /// Sender batching parameters
    pub batch: BatchSettings,

    /// Parser section, kept as raw JSON text
    pub parser: Option<String>,

    /// Sender sections, kept as raw JSON text
    pub senders: Vec<String>,
}

impl RunnerConfig {
    /// Validate the structural invariants every parser must guarantee
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if self.reader.log_path.as_os_str().is_empty() {
            return Err("reader.log_path must not be empty".to_string());
        }
        if !self.reader.log_path.is_absolute() {
            return Err("reader.log_path must be absolute".to_string());
        }
        if self.batch.batch_len == 0 {
            return Err("batch_len must be greater than 0".to_string());
        }
        if self.batch.batch_size == 0 {
            return Err("batch_size must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Whether this runner's progress gates deletion in its log directory
    pub fn participates_in_cleanup(&self) -> bool {
        self.cleanup.delete_enable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RunnerConfig {
        RunnerConfig {
            name: "nginx-access".to_string(),
            reader: ReaderSettings {
                log_path: PathBuf::from("/var/log/nginx"),
                meta_path: PathBuf::from("/var/lib/logpilot/meta/nginx-access"),
                mode: "dir".to_string(),
                read_from: "oldest".to_string(),
                ignore_hidden: true,
            },
            cleanup: CleanupPolicy::default(),
            batch: BatchSettings::default(),
            parser: None,
            senders: Vec::new(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(sample().validate().is_ok());
        assert!(!sample().participates_in_cleanup());
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut config = sample();
        config.name = "  ".to_string();
        assert!(config.validate().unwrap_err().contains("name"));
    }

    #[test]
    fn test_relative_log_path_rejected() {
        let mut config = sample();
        config.reader.log_path = PathBuf::from("logs");
        assert!(config.validate().unwrap_err().contains("absolute"));
    }

    #[test]
    fn test_zero_batch_len_rejected() {
        let mut config = sample();
        config.batch.batch_len = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cleanup_participation() {
        let mut config = sample();
        config.cleanup.delete_enable = true;
        assert!(config.participates_in_cleanup());
    }
}
