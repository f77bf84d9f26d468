//! Cleaner registry: canonical log directory -> clean queue
//!
//! Registering a runner bumps the queue's cleaner count (creating the queue
//! and its worker on first use); deregistering drops it, and the queue is
//! torn down when the count reaches zero.

use crate::{CleanQueue, CleanerError, CleanerMetrics, CleanerWorker};
use logpilot_domain::{canonical_path, resolve_path, CleanupPolicy};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// A runner's registration with one clean queue
///
/// Cheap to clone; every clone reports progress for the same registration.
#[derive(Debug, Clone)]
pub struct CleanerHandle {
    id: Uuid,
    queue: Arc<CleanQueue>,
}

impl CleanerHandle {
    /// Registration identifier
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Canonical log directory of the registration
    pub fn log_dir(&self) -> &Path {
        self.queue.log_dir()
    }

    /// Report that this runner has fully consumed `file`.
    ///
    /// Relative paths resolve against the working directory. Returns
    /// `Ok(false)` once the registration has been withdrawn.
    pub fn mark_done(&self, file: &Path) -> Result<bool, CleanerError> {
        let resolved = resolve_path(file).map_err(|source| CleanerError::Io {
            path: file.to_path_buf(),
            source,
        })?;
        let log_dir = self.queue.log_dir();
        // A file that does not exist yet keeps its `..` components, which
        // `starts_with` would not see through.
        let escapes = resolved
            .components()
            .any(|c| matches!(c, Component::ParentDir));
        if escapes || resolved == log_dir || !resolved.starts_with(log_dir) {
            return Err(CleanerError::OutsideLogDir {
                file: resolved,
                log_dir: log_dir.to_path_buf(),
            });
        }
        Ok(self.queue.mark_done(self.id, resolved))
    }
}

struct QueueEntry {
    queue: Arc<CleanQueue>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl QueueEntry {
    fn spawn(runtime: &Handle, log_dir: PathBuf) -> Self {
        let queue = Arc::new(CleanQueue::new(log_dir));
        let (shutdown, signal) = watch::channel(false);
        let worker = CleanerWorker::new(Arc::clone(&queue));
        let task = runtime.spawn(async move { worker.run(signal).await });
        Self {
            queue,
            shutdown,
            task,
        }
    }
}

/// Registry of clean queues keyed by canonical log directory
pub struct CleanerRegistry {
    queues: RwLock<HashMap<PathBuf, QueueEntry>>,
}

impl CleanerRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            queues: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<PathBuf, QueueEntry>> {
        self.queues.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<PathBuf, QueueEntry>> {
        self.queues.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a cleaner for `log_dir` under `policy`.
    ///
    /// Must be called from within a tokio runtime: the first registration
    /// for a directory starts that queue's periodic worker.
    pub fn register(
        &self,
        log_dir: &Path,
        policy: CleanupPolicy,
    ) -> Result<CleanerHandle, CleanerError> {
        if !policy.delete_enable {
            return Err(CleanerError::DeletionDisabled(log_dir.to_path_buf()));
        }
        let log_dir = canonical_path(log_dir).map_err(|source| CleanerError::Io {
            path: log_dir.to_path_buf(),
            source,
        })?;
        let runtime = Handle::try_current().map_err(|e| CleanerError::Worker(e.to_string()))?;

        let id = Uuid::now_v7();
        let (queue, count) = {
            let mut queues = self.write();
            let entry = queues
                .entry(log_dir.clone())
                .or_insert_with(|| QueueEntry::spawn(&runtime, log_dir.clone()));
            let count = entry.queue.add_cleaner(id, policy);
            (Arc::clone(&entry.queue), count)
        };

        tracing::info!(
            "Registered cleaner {} for {} (cleaner count: {})",
            id,
            log_dir.display(),
            count
        );
        Ok(CleanerHandle { id, queue })
    }

    /// Withdraw a registration.
    ///
    /// Returns `false` if it was already withdrawn. The last withdrawal for a
    /// directory removes its queue and stops the queue's worker.
    pub fn deregister(&self, handle: &CleanerHandle) -> bool {
        let remaining = {
            let mut queues = self.write();
            let Some(entry) = queues.get(handle.log_dir()) else {
                return false;
            };
            if !Arc::ptr_eq(&entry.queue, &handle.queue) {
                return false;
            }
            let Some(remaining) = entry.queue.remove_cleaner(handle.id) else {
                return false;
            };
            if remaining == 0 {
                if let Some(entry) = queues.remove(handle.log_dir()) {
                    let _ = entry.shutdown.send(true);
                }
            }
            remaining
        };

        tracing::info!(
            "Deregistered cleaner {} from {} (cleaner count: {})",
            handle.id,
            handle.log_dir().display(),
            remaining
        );
        true
    }

    /// Current cleaner count for `log_dir`, `None` if no queue exists
    pub fn cleaner_count(&self, log_dir: &Path) -> Option<usize> {
        self.queue(log_dir).map(|q| q.cleaner_count())
    }

    /// Queue for `log_dir`, if any runner is registered for it
    pub fn queue(&self, log_dir: &Path) -> Option<Arc<CleanQueue>> {
        let key = resolve_path(log_dir).ok()?;
        self.read().get(&key).map(|entry| Arc::clone(&entry.queue))
    }

    /// Metrics of the queue for `log_dir`
    pub fn metrics(&self, log_dir: &Path) -> Option<CleanerMetrics> {
        self.queue(log_dir).map(|q| q.metrics())
    }

    /// Number of live queues
    pub fn queue_count(&self) -> usize {
        self.read().len()
    }

    /// Log directories with a live queue
    pub fn log_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self.read().keys().cloned().collect();
        dirs.sort();
        dirs
    }

    /// Stop every queue worker and release every queue.
    ///
    /// Each worker gets `grace` to exit; stragglers are aborted and their
    /// directories returned.
    pub async fn shutdown(&self, grace: Duration) -> Vec<PathBuf> {
        let entries: Vec<(PathBuf, QueueEntry)> = self.write().drain().collect();
        for (_, entry) in &entries {
            let _ = entry.shutdown.send(true);
        }

        let mut timed_out = Vec::new();
        for (log_dir, entry) in entries {
            let mut task = entry.task;
            match tokio::time::timeout(grace, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!("Cleaner worker for {} failed: {}", log_dir.display(), e);
                }
                Err(_) => {
                    tracing::error!(
                        "Cleaner worker for {} did not stop within {:?}",
                        log_dir.display(),
                        grace
                    );
                    task.abort();
                    timed_out.push(log_dir);
                }
            }
        }
        timed_out
    }
}

impl Default for CleanerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
