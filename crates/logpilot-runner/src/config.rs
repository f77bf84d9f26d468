//! JSON runner configuration files
//!
//! One file describes one runner. Numeric and boolean fields may be written
//! either as JSON scalars or as strings (`"batch_len": 3` and
//! `"delete_enable": "true"` are both accepted). The `parser` and `senders`
//! sections are passed through untouched.
//!
//! ```json
//! {
//!     "name": "nginx-access",
//!     "batch_len": 1000,
//!     "reader": { "log_path": "/var/log/nginx", "meta_path": "./meta/nginx", "mode": "dir" },
//!     "cleaner": { "delete_enable": "true", "delete_interval": "60",
//!                  "reserve_file_number": "5", "reserve_file_size": "1024" },
//!     "parser": { "type": "csv" },
//!     "senders": [{ "sender_type": "file" }]
//! }
//! ```

use crate::RunnerError;
use logpilot_domain::traits::ConfigParser;
use logpilot_domain::{
    absolute_path, BatchSettings, CleanupPolicy, ReaderSettings, RunnerConfig,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Directory (relative to the working directory) holding default meta paths
const DEFAULT_META_ROOT: &str = "meta";

/// A scalar written either natively or as a string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(u64),
    Text(String),
}

impl Scalar {
    fn to_u64(&self, field: &str) -> Result<u64, RunnerError> {
        match self {
            Scalar::Int(n) => Ok(*n),
            Scalar::Text(s) => s.trim().parse().map_err(|_| RunnerError::InvalidValue {
                field: field.to_string(),
                reason: format!("'{}' is not a non-negative integer", s),
            }),
            Scalar::Bool(_) => Err(RunnerError::InvalidValue {
                field: field.to_string(),
                reason: "expected a number, found a boolean".to_string(),
            }),
        }
    }

    fn to_bool(&self, field: &str) -> Result<bool, RunnerError> {
        match self {
            Scalar::Bool(b) => Ok(*b),
            Scalar::Text(s) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(true),
                "false" | "no" | "0" | "" => Ok(false),
                _ => Err(RunnerError::InvalidValue {
                    field: field.to_string(),
                    reason: format!("'{}' is not a boolean", s),
                }),
            },
            Scalar::Int(n) => Ok(*n != 0),
        }
    }
}

fn opt_u64(value: &Option<Scalar>, field: &str) -> Result<Option<u64>, RunnerError> {
    value.as_ref().map(|v| v.to_u64(field)).transpose()
}

fn opt_usize(value: &Option<Scalar>, field: &str) -> Result<Option<usize>, RunnerError> {
    opt_u64(value, field)?
        .map(|n| {
            usize::try_from(n).map_err(|_| RunnerError::InvalidValue {
                field: field.to_string(),
                reason: format!("{} is out of range", n),
            })
        })
        .transpose()
}

fn opt_bool(value: &Option<Scalar>, field: &str) -> Result<Option<bool>, RunnerError> {
    value.as_ref().map(|v| v.to_bool(field)).transpose()
}

#[derive(Debug, Deserialize)]
struct RawRunnerConfig {
    name: Option<String>,
    batch_len: Option<Scalar>,
    batch_size: Option<Scalar>,
    batch_interval: Option<Scalar>,
    batch_try_times: Option<Scalar>,
    reader: Option<RawReader>,
    cleaner: Option<RawCleaner>,
    parser: Option<serde_json::Value>,
    #[serde(default)]
    senders: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawReader {
    log_path: Option<String>,
    meta_path: Option<String>,
    mode: Option<String>,
    read_from: Option<String>,
    ignore_hidden: Option<Scalar>,
}

#[derive(Debug, Deserialize)]
struct RawCleaner {
    delete_enable: Option<Scalar>,
    delete_interval: Option<Scalar>,
    reserve_file_number: Option<Scalar>,
    reserve_file_size: Option<Scalar>,
}

/// Parser for JSON runner configuration files
///
/// Relative `log_path`/`meta_path` values resolve against the process
/// working directory; batch fields a file omits take the parser's defaults.
#[derive(Debug, Clone, Default)]
pub struct JsonConfigParser {
    batch_defaults: BatchSettings,
}

impl JsonConfigParser {
    /// Create a parser with the built-in batch defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser that fills omitted batch fields from `defaults`
    pub fn with_batch_defaults(defaults: BatchSettings) -> Self {
        Self {
            batch_defaults: defaults,
        }
    }

    /// Read and parse a configuration file
    pub fn parse_file(&self, path: &Path) -> Result<RunnerConfig, RunnerError> {
        let bytes = std::fs::read(path).map_err(|source| RunnerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse(&bytes)
    }

    fn resolve(field: &str, raw: &str) -> Result<PathBuf, RunnerError> {
        absolute_path(Path::new(raw)).map_err(|e| RunnerError::InvalidValue {
            field: field.to_string(),
            reason: e.to_string(),
        })
    }

    fn batch(&self, raw: &RawRunnerConfig) -> Result<BatchSettings, RunnerError> {
        let defaults = self.batch_defaults;
        let batch_try_times = match opt_u64(&raw.batch_try_times, "batch_try_times")? {
            Some(n) => u32::try_from(n).map_err(|_| RunnerError::InvalidValue {
                field: "batch_try_times".to_string(),
                reason: format!("{} is out of range", n),
            })?,
            None => defaults.batch_try_times,
        };
        Ok(BatchSettings {
            batch_len: opt_usize(&raw.batch_len, "batch_len")?.unwrap_or(defaults.batch_len),
            batch_size: opt_usize(&raw.batch_size, "batch_size")?.unwrap_or(defaults.batch_size),
            batch_interval_secs: opt_u64(&raw.batch_interval, "batch_interval")?
                .unwrap_or(defaults.batch_interval_secs),
            batch_try_times,
        })
    }

    fn cleanup(raw: Option<&RawCleaner>) -> Result<CleanupPolicy, RunnerError> {
        let defaults = CleanupPolicy::default();
        let Some(raw) = raw else {
            return Ok(defaults);
        };
        Ok(CleanupPolicy {
            delete_enable: opt_bool(&raw.delete_enable, "cleaner.delete_enable")?
                .unwrap_or(defaults.delete_enable),
            delete_interval_secs: opt_u64(&raw.delete_interval, "cleaner.delete_interval")?
                .unwrap_or(defaults.delete_interval_secs),
            reserve_file_number: opt_usize(
                &raw.reserve_file_number,
                "cleaner.reserve_file_number",
            )?
            .unwrap_or(defaults.reserve_file_number),
            reserve_file_size_mb: opt_u64(&raw.reserve_file_size, "cleaner.reserve_file_size")?
                .unwrap_or(defaults.reserve_file_size_mb),
        })
    }
}

impl ConfigParser for JsonConfigParser {
    type Error = RunnerError;

    fn parse(&self, bytes: &[u8]) -> Result<RunnerConfig, RunnerError> {
        let raw: RawRunnerConfig = serde_json::from_slice(bytes)?;

        let name = raw
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| RunnerError::MissingField("name".to_string()))?;
        let reader = raw
            .reader
            .as_ref()
            .ok_or_else(|| RunnerError::MissingField("reader".to_string()))?;
        let log_path = reader
            .log_path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| RunnerError::MissingField("reader.log_path".to_string()))?;

        let meta_path = match reader.meta_path.as_deref().filter(|p| !p.trim().is_empty()) {
            Some(p) => Self::resolve("reader.meta_path", p)?,
            None => Self::resolve("reader.meta_path", DEFAULT_META_ROOT)?.join(&name),
        };

        let config = RunnerConfig {
            reader: ReaderSettings {
                log_path: Self::resolve("reader.log_path", log_path)?,
                meta_path,
                mode: reader.mode.clone().unwrap_or_else(|| "dir".to_string()),
                read_from: reader.read_from.clone().unwrap_or_else(|| "oldest".to_string()),
                ignore_hidden: opt_bool(&reader.ignore_hidden, "reader.ignore_hidden")?
                    .unwrap_or(true),
            },
            cleanup: Self::cleanup(raw.cleaner.as_ref())?,
            batch: self.batch(&raw)?,
            parser: raw.parser.as_ref().map(|v| v.to_string()),
            senders: raw.senders.iter().map(|v| v.to_string()).collect(),
            name,
        };

        config.validate().map_err(RunnerError::Invalid)?;
        Ok(config)
    }
}
