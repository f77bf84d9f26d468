//! Manager configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or [`ManagerConfig::default`])
//! is a working configuration.

use crate::ManagerError;
use logpilot_domain::BatchSettings;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Environment variable consulted for the missing-directory retry period, in seconds
pub const DIR_NOT_EXIST_SLEEP_ENV: &str = "DIR_NOT_EXIST_SLEEP_TIME";

/// Retry period used when neither the config nor the environment sets one
pub const DEFAULT_DIR_NOT_EXIST_SLEEP: Duration = Duration::from_secs(300);

/// Manager configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Period between two scans of a watched directory (milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Retry period for missing directories (seconds).
    ///
    /// Falls back to `DIR_NOT_EXIST_SLEEP_TIME`, then to 300 seconds.
    #[serde(default)]
    pub dir_not_exist_sleep_secs: Option<u64>,

    /// Grace period for each background task at shutdown (milliseconds)
    #[serde(default = "default_stop_timeout_ms")]
    pub stop_timeout_ms: u64,

    /// Only files whose names end with this suffix are runner configurations
    #[serde(default = "default_config_suffix")]
    pub config_suffix: String,

    /// Period between two done-marker scans of each runner (milliseconds)
    #[serde(default = "default_done_scan_interval_ms")]
    pub done_scan_interval_ms: u64,

    /// Upper bound on concurrently running runners
    #[serde(default)]
    pub max_runners: Option<usize>,

    /// Batch settings applied where a runner configuration leaves them out
    #[serde(default)]
    pub runner_defaults: RunnerDefaults,
}

/// Batch defaults for runner configurations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerDefaults {
    /// Maximum records per batch
    #[serde(default = "default_batch_len")]
    pub batch_len: usize,

    /// Maximum bytes per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Flush interval (seconds)
    #[serde(default = "default_batch_interval_secs", alias = "batch_interval")]
    pub batch_interval_secs: u64,

    /// Send attempts before a batch is dropped
    #[serde(default = "default_batch_try_times")]
    pub batch_try_times: u32,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_stop_timeout_ms() -> u64 {
    10_000
}

fn default_config_suffix() -> String {
    ".conf".to_string()
}

fn default_done_scan_interval_ms() -> u64 {
    500
}

fn default_batch_len() -> usize {
    BatchSettings::default().batch_len
}

fn default_batch_size() -> usize {
    BatchSettings::default().batch_size
}

fn default_batch_interval_secs() -> u64 {
    BatchSettings::default().batch_interval_secs
}

fn default_batch_try_times() -> u32 {
    BatchSettings::default().batch_try_times
}

impl Default for RunnerDefaults {
    fn default() -> Self {
        BatchSettings::default().into()
    }
}

impl From<BatchSettings> for RunnerDefaults {
    fn from(batch: BatchSettings) -> Self {
        Self {
            batch_len: batch.batch_len,
            batch_size: batch.batch_size,
            batch_interval_secs: batch.batch_interval_secs,
            batch_try_times: batch.batch_try_times,
        }
    }
}

impl From<&RunnerDefaults> for BatchSettings {
    fn from(defaults: &RunnerDefaults) -> Self {
        BatchSettings {
            batch_len: defaults.batch_len,
            batch_size: defaults.batch_size,
            batch_interval_secs: defaults.batch_interval_secs,
            batch_try_times: defaults.batch_try_times,
        }
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            dir_not_exist_sleep_secs: None,
            stop_timeout_ms: default_stop_timeout_ms(),
            config_suffix: default_config_suffix(),
            done_scan_interval_ms: default_done_scan_interval_ms(),
            max_runners: None,
            runner_defaults: RunnerDefaults::default(),
        }
    }
}

impl ManagerConfig {
    /// Load and validate configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ManagerError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ManagerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ManagerConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every period is non-zero and every limit usable
    pub fn validate(&self) -> Result<(), ManagerError> {
        if self.poll_interval_ms == 0 {
            return Err(ManagerError::Config(
                "poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.stop_timeout_ms == 0 {
            return Err(ManagerError::Config(
                "stop_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.done_scan_interval_ms == 0 {
            return Err(ManagerError::Config(
                "done_scan_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.dir_not_exist_sleep_secs == Some(0) {
            return Err(ManagerError::Config(
                "dir_not_exist_sleep_secs must be greater than 0".to_string(),
            ));
        }
        if self.config_suffix.is_empty() {
            return Err(ManagerError::Config(
                "config_suffix cannot be empty".to_string(),
            ));
        }
        if self.max_runners == Some(0) {
            return Err(ManagerError::Config(
                "max_runners must be greater than 0".to_string(),
            ));
        }
        if self.runner_defaults.batch_len == 0 || self.runner_defaults.batch_size == 0 {
            return Err(ManagerError::Config(
                "runner_defaults batch_len and batch_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Directory scan period
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Per-task shutdown grace period
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    /// Done-marker scan period handed to runners
    pub fn done_scan_interval(&self) -> Duration {
        Duration::from_millis(self.done_scan_interval_ms)
    }

    /// Retry period for missing watch and log directories
    pub fn dir_not_exist_sleep(&self) -> Duration {
        match self.dir_not_exist_sleep_secs {
            Some(secs) if secs > 0 => Duration::from_secs(secs),
            _ => parse_sleep_secs(env::var(DIR_NOT_EXIST_SLEEP_ENV).ok().as_deref()),
        }
    }
}

/// Interpret a raw seconds value; unset, malformed or zero means the default
pub(crate) fn parse_sleep_secs(raw: Option<&str>) -> Duration {
    match raw.map(str::trim).and_then(|s| s.parse::<u64>().ok()) {
        Some(secs) if secs > 0 => Duration::from_secs(secs),
        _ => DEFAULT_DIR_NOT_EXIST_SLEEP,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    // Tests touching the process environment must not overlap.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults_are_valid() {
        let config = ManagerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.stop_timeout(), Duration::from_secs(10));
        assert_eq!(config.config_suffix, ".conf");
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: ManagerConfig = toml::from_str("").unwrap();
        assert_eq!(config, ManagerConfig::default());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
poll_interval_ms = 250
dir_not_exist_sleep_secs = 5
max_runners = 8

[runner_defaults]
batch_len = 50
batch_interval = 5
"#
        )
        .unwrap();

        let config = ManagerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.dir_not_exist_sleep(), Duration::from_secs(5));
        assert_eq!(config.max_runners, Some(8));
        assert_eq!(config.runner_defaults.batch_len, 50);
        assert_eq!(config.runner_defaults.batch_interval_secs, 5);
        assert_eq!(
            config.runner_defaults.batch_size,
            BatchSettings::default().batch_size
        );
    }

    #[test]
    fn test_from_file_missing() {
        let err = ManagerConfig::from_file("/nonexistent/manager.toml").unwrap_err();
        assert!(matches!(err, ManagerError::Io { .. }));
    }

    #[test]
    fn test_from_file_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "poll_interval_ms = \"soon\"").unwrap();
        let err = ManagerConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ManagerError::Toml(_)));
    }

    #[test]
    fn test_validate_rejects_zero_periods() {
        let config = ManagerConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ManagerConfig {
            max_runners: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ManagerConfig {
            config_suffix: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_sleep_secs() {
        assert_eq!(parse_sleep_secs(None), DEFAULT_DIR_NOT_EXIST_SLEEP);
        assert_eq!(parse_sleep_secs(Some("12")), Duration::from_secs(12));
        assert_eq!(parse_sleep_secs(Some(" 7 ")), Duration::from_secs(7));
        assert_eq!(parse_sleep_secs(Some("0")), DEFAULT_DIR_NOT_EXIST_SLEEP);
        assert_eq!(parse_sleep_secs(Some("later")), DEFAULT_DIR_NOT_EXIST_SLEEP);
    }

    #[test]
    fn test_dir_sleep_falls_back_to_environment() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        env::set_var(DIR_NOT_EXIST_SLEEP_ENV, "7");

        let from_env = ManagerConfig::default().dir_not_exist_sleep();
        let from_config = ManagerConfig {
            dir_not_exist_sleep_secs: Some(3),
            ..Default::default()
        }
        .dir_not_exist_sleep();

        env::set_var(DIR_NOT_EXIST_SLEEP_ENV, "0");
        let zero = ManagerConfig::default().dir_not_exist_sleep();

        env::remove_var(DIR_NOT_EXIST_SLEEP_ENV);
        let unset = ManagerConfig::default().dir_not_exist_sleep();

        assert_eq!(from_env, Duration::from_secs(7));
        assert_eq!(from_config, Duration::from_secs(3));
        assert_eq!(zero, DEFAULT_DIR_NOT_EXIST_SLEEP);
        assert_eq!(unset, DEFAULT_DIR_NOT_EXIST_SLEEP);
    }

    #[test]
    fn test_batch_defaults_conversion() {
        let defaults = RunnerDefaults {
            batch_len: 10,
            ..Default::default()
        };
        let batch = BatchSettings::from(&defaults);
        assert_eq!(batch.batch_len, 10);
        assert_eq!(batch.batch_try_times, BatchSettings::default().batch_try_times);
    }
}
