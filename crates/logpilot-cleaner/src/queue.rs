//! Clean queue: deletion gating for one log directory
//!
//! A queue knows which runners currently depend on its directory (the
//! "cleaners") and which of them have finished with each file. A file may be
//! deleted only once every *currently registered* cleaner has acknowledged
//! it, so a runner leaving the queue can unblock files it never finished,
//! and a runner joining it blocks files the others already released.

use crate::CleanerMetrics;
use logpilot_domain::CleanupPolicy;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// Cycle period used while no cleaner is registered
pub(crate) const IDLE_CYCLE: Duration = Duration::from_secs(1);

/// Outcome of a single sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Files removed from disk
    pub deleted: Vec<PathBuf>,
    /// Fully-acknowledged files kept by the retention window
    pub retained: Vec<PathBuf>,
    /// Bytes freed by this sweep
    pub bytes_reclaimed: u64,
    /// Deletions that failed
    pub failures: usize,
}

#[derive(Debug, Default)]
struct QueueState {
    /// Registered cleaners and the policy each one declared
    cleaners: HashMap<Uuid, CleanupPolicy>,
    /// Merge of all registered policies
    policy: Option<CleanupPolicy>,
    /// File -> cleaners that are done with it
    done: HashMap<PathBuf, HashSet<Uuid>>,
    metrics: CleanerMetrics,
}

impl QueueState {
    fn acknowledgments(&self, file: &Path) -> usize {
        self.done
            .get(file)
            .map(|acks| acks.iter().filter(|id| self.cleaners.contains_key(id)).count())
            .unwrap_or(0)
    }

    fn is_eligible(&self, file: &Path) -> bool {
        !self.cleaners.is_empty() && self.acknowledgments(file) == self.cleaners.len()
    }

    fn refresh_policy(&mut self) {
        self.policy = CleanupPolicy::merge_all(self.cleaners.values());
    }
}

/// Deletion state for one canonical log directory
///
/// # Examples
///
/// ```
/// use logpilot_cleaner::CleanQueue;
/// use logpilot_domain::CleanupPolicy;
/// use std::path::PathBuf;
/// use uuid::Uuid;
///
/// let queue = CleanQueue::new(PathBuf::from("/var/log/app"));
/// let policy = CleanupPolicy { delete_enable: true, ..Default::default() };
/// let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
/// queue.add_cleaner(a, policy);
/// queue.add_cleaner(b, policy);
///
/// let file = PathBuf::from("/var/log/app/app.log.1");
/// queue.mark_done(a, file.clone());
/// assert!(!queue.is_eligible(&file));
/// queue.mark_done(b, file.clone());
/// assert!(queue.is_eligible(&file));
/// ```
#[derive(Debug)]
pub struct CleanQueue {
    log_dir: PathBuf,
    state: Mutex<QueueState>,
}

impl CleanQueue {
    /// Create an empty queue for `log_dir`, canonicalized when it exists
    pub fn new(log_dir: PathBuf) -> Self {
        Self {
            log_dir: fs::canonicalize(&log_dir).unwrap_or(log_dir),
            state: Mutex::new(QueueState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Directory this queue owns
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Number of registered cleaners (`cleanerCount`)
    pub fn cleaner_count(&self) -> usize {
        self.lock().cleaners.len()
    }

    /// Effective policy, `None` while nobody is registered
    pub fn policy(&self) -> Option<CleanupPolicy> {
        self.lock().policy
    }

    /// Time between two sweeps under the current policy
    pub fn cycle_interval(&self) -> Duration {
        self.policy()
            .map(|p| p.delete_interval())
            .unwrap_or(IDLE_CYCLE)
    }

    /// Add a cleaner; returns the new cleaner count
    pub fn add_cleaner(&self, cleaner: Uuid, policy: CleanupPolicy) -> usize {
        let mut state = self.lock();
        state.cleaners.insert(cleaner, policy);
        state.refresh_policy();
        state.cleaners.len()
    }

    /// Remove a cleaner and forget its acknowledgments.
    ///
    /// Returns the remaining cleaner count, or `None` if `cleaner` was not
    /// registered.
    pub fn remove_cleaner(&self, cleaner: Uuid) -> Option<usize> {
        let mut state = self.lock();
        state.cleaners.remove(&cleaner)?;
        for acks in state.done.values_mut() {
            acks.remove(&cleaner);
        }
        state.done.retain(|_, acks| !acks.is_empty());
        state.refresh_policy();
        Some(state.cleaners.len())
    }

    /// Record that `cleaner` no longer needs `file`.
    ///
    /// Returns `false` when `cleaner` is not registered here; its marks no
    /// longer count for anything.
    pub fn mark_done(&self, cleaner: Uuid, file: PathBuf) -> bool {
        let mut state = self.lock();
        if !state.cleaners.contains_key(&cleaner) {
            return false;
        }
        state.done.entry(file).or_default().insert(cleaner);
        true
    }

    /// Acknowledgments of `file` from currently registered cleaners
    pub fn acknowledgments(&self, file: &Path) -> usize {
        self.lock().acknowledgments(file)
    }

    /// Whether every registered cleaner is done with `file`
    pub fn is_eligible(&self, file: &Path) -> bool {
        self.lock().is_eligible(file)
    }

    /// Files with at least one outstanding acknowledgment record
    pub fn tracked_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self.lock().done.keys().cloned().collect();
        files.sort();
        files
    }

    /// Snapshot of this queue's metrics
    pub fn metrics(&self) -> CleanerMetrics {
        self.lock().metrics.clone()
    }

    /// Whether `file` really lives under the log directory once `..` and
    /// symlinked parents are resolved
    fn contains(&self, file: &Path) -> bool {
        match fs::canonicalize(file) {
            Ok(real) => real != self.log_dir && real.starts_with(&self.log_dir),
            Err(_) => false,
        }
    }

    /// Run one cleanup cycle.
    ///
    /// Eligible files are ordered newest first; the leading run that fits
    /// both the reserved file count and the reserved size is kept, and
    /// everything after the first file that overflows either budget is
    /// deleted. The queue lock is held throughout, so registration changes
    /// cannot interleave with a deletion decision.
    pub fn sweep(&self) -> SweepReport {
        let mut guard = self.lock();
        let state = &mut *guard;
        let mut report = SweepReport::default();

        let policy = match state.policy {
            Some(p) if p.delete_enable => p,
            _ => {
                state.metrics.record_sweep(0);
                return report;
            }
        };

        let mut candidates: Vec<(PathBuf, u64, SystemTime)> = Vec::new();
        let mut vanished: Vec<PathBuf> = Vec::new();
        for file in state.done.keys() {
            if !state.is_eligible(file) {
                continue;
            }
            match fs::symlink_metadata(file) {
                Ok(_) if !self.contains(file) => {
                    tracing::warn!(
                        "Not deleting {}: outside {}",
                        file.display(),
                        self.log_dir.display()
                    );
                    vanished.push(file.clone());
                }
                Ok(meta) if meta.is_file() => {
                    let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                    candidates.push((file.clone(), meta.len(), modified));
                }
                Ok(_) => {
                    tracing::warn!("Not deleting {}: not a regular file", file.display());
                    vanished.push(file.clone());
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => vanished.push(file.clone()),
                Err(e) => {
                    tracing::warn!("Cannot stat {}: {}", file.display(), e);
                }
            }
        }
        for file in vanished {
            state.done.remove(&file);
        }

        candidates.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| b.0.cmp(&a.0)));

        let size_budget = policy.reserve_file_size_bytes();
        let mut kept_count = 0usize;
        let mut kept_size = 0u64;
        let mut window_open = true;

        for (file, size, _) in candidates {
            if window_open {
                let next_count = kept_count + 1;
                let next_size = kept_size.saturating_add(size);
                if next_count <= policy.reserve_file_number && next_size <= size_budget {
                    kept_count = next_count;
                    kept_size = next_size;
                    report.retained.push(file);
                    continue;
                }
                window_open = false;
            }

            match fs::remove_file(&file) {
                Ok(()) => {
                    tracing::info!(
                        "Deleted {} ({} bytes) from {}",
                        file.display(),
                        size,
                        self.log_dir.display()
                    );
                    state.done.remove(&file);
                    state.metrics.record_deletion(size);
                    report.bytes_reclaimed = report.bytes_reclaimed.saturating_add(size);
                    report.deleted.push(file);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    state.done.remove(&file);
                }
                Err(e) => {
                    tracing::warn!("Failed to delete {}: {}", file.display(), e);
                    state.metrics.record_failure();
                    report.failures += 1;
                }
            }
        }

        state.metrics.record_sweep(report.retained.len());
        report
    }
}
