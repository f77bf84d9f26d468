//! Cleanup policy - when fully-consumed log files may be deleted

use std::time::Duration;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Deletion policy declared by a runner for the log directory it reads.
///
/// A policy only matters when `delete_enable` is set; runners that never
/// delete do not take part in cleanup coordination at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupPolicy {
    /// Whether fully-consumed files may be deleted
    pub delete_enable: bool,

    /// Minimum time between two cleanup cycles (seconds)
    pub delete_interval_secs: u64,

    /// Number of most recent consumed files that are kept
    pub reserve_file_number: usize,

    /// Total size budget (megabytes) of most recent consumed files that are kept
    pub reserve_file_size_mb: u64,
}

impl Default for CleanupPolicy {
    /// Deletion disabled; retention defaults of 10 files / 2 GiB once enabled.
    fn default() -> Self {
        Self {
            delete_enable: false,
            delete_interval_secs: 300,
            reserve_file_number: 10,
            reserve_file_size_mb: 2048,
        }
    }
}

impl CleanupPolicy {
    /// Cycle interval as a Duration, never shorter than one second
    pub fn delete_interval(&self) -> Duration {
        Duration::from_secs(self.delete_interval_secs.max(1))
    }

    /// Retention size budget in bytes
    pub fn reserve_file_size_bytes(&self) -> u64 {
        self.reserve_file_size_mb.saturating_mul(BYTES_PER_MB)
    }

    /// Combine with another policy, keeping the more conservative value of
    /// every field.
    pub fn merge(&self, other: &CleanupPolicy) -> CleanupPolicy {
        CleanupPolicy {
            delete_enable: self.delete_enable && other.delete_enable,
            delete_interval_secs: self.delete_interval_secs.max(other.delete_interval_secs),
            reserve_file_number: self.reserve_file_number.max(other.reserve_file_number),
            reserve_file_size_mb: self.reserve_file_size_mb.max(other.reserve_file_size_mb),
        }
    }

    /// Merge a set of policies; `None` for an empty set.
    pub fn merge_all<'a, I>(policies: I) -> Option<CleanupPolicy>
    where
        I: IntoIterator<Item = &'a CleanupPolicy>,
    {
        policies
            .into_iter()
            .fold(None, |acc: Option<CleanupPolicy>, p| match acc {
                Some(merged) => Some(merged.merge(p)),
                None => Some(*p),
            })
    }
}
