//! Default runner: one log directory, progress reported through done markers
//!
//! Reading, parsing and sending are delegated to the pipeline stages named
//! in the configuration; this runner owns the parts the manager relies on:
//! the canonical log directory, the meta directory, and forwarding done
//! markers to the directory's clean queue.

use crate::done::DoneTracker;
use crate::{Runner, RunnerError, RunnerFactory, RunnerStatus};
use async_trait::async_trait;
use logpilot_cleaner::CleanerHandle;
use logpilot_domain::{canonical_path, CleanupPolicy, RunnerConfig};
use std::io;
use std::path::Path;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Default period between two done-marker scans
pub const DEFAULT_DONE_SCAN_INTERVAL: Duration = Duration::from_millis(500);

/// Runner reading one canonical log directory
pub struct LogDirRunner {
    config: RunnerConfig,
    status: RunnerStatus,
    scan_interval: Duration,
    shutdown: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
    cleaner: Option<CleanerHandle>,
}

impl LogDirRunner {
    /// Create a runner for `config`, whose log path must already be canonical
    pub fn new(config: RunnerConfig, scan_interval: Duration) -> Self {
        Self {
            config,
            status: RunnerStatus::Created,
            scan_interval,
            shutdown: None,
            task: None,
            cleaner: None,
        }
    }

    /// Configuration this runner was built from
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Cleaner registration handed over at start, if any
    pub fn cleaner(&self) -> Option<&CleanerHandle> {
        self.cleaner.as_ref()
    }
}

#[async_trait]
impl Runner for LogDirRunner {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn log_dir(&self) -> &Path {
        &self.config.reader.log_path
    }

    fn cleanup_policy(&self) -> CleanupPolicy {
        self.config.cleanup
    }

    fn status(&self) -> RunnerStatus {
        self.status
    }

    async fn start(&mut self, cleaner: Option<CleanerHandle>) -> Result<(), RunnerError> {
        if self.status != RunnerStatus::Created {
            return Err(RunnerError::AlreadyStarted(self.config.name.clone()));
        }

        let meta_path = &self.config.reader.meta_path;
        tokio::fs::create_dir_all(meta_path)
            .await
            .map_err(|source| RunnerError::Io {
                path: meta_path.clone(),
                source,
            })?;

        if let Some(handle) = &cleaner {
            let (tx, rx) = watch::channel(false);
            let tracker = DoneTracker::new(meta_path.clone(), handle.clone());
            self.task = Some(tokio::spawn(tracker.run(self.scan_interval, rx)));
            self.shutdown = Some(tx);
        }
        self.cleaner = cleaner;
        self.status = RunnerStatus::Running;

        tracing::info!(
            "Runner {} started on {}",
            self.config.name,
            self.config.reader.log_path.display()
        );
        Ok(())
    }

    async fn stop(&mut self) {
        if self.status == RunnerStatus::Stopped {
            return;
        }
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(true);
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("Runner {} tracker ended abnormally: {}", self.config.name, e);
            }
        }
        self.cleaner = None;
        self.status = RunnerStatus::Stopped;
        tracing::info!("Runner {} stopped", self.config.name);
    }
}

impl Drop for LogDirRunner {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(true);
        }
    }
}

/// Factory for [`LogDirRunner`]s
///
/// Resolves each configuration's log path to its canonical form, failing
/// with [`RunnerError::LogDirNotFound`] while the directory does not exist.
#[derive(Debug, Clone)]
pub struct LogDirRunnerFactory {
    scan_interval: Duration,
}

impl LogDirRunnerFactory {
    /// Create a factory whose runners scan done markers every `scan_interval`
    pub fn new(scan_interval: Duration) -> Self {
        Self { scan_interval }
    }
}

impl Default for LogDirRunnerFactory {
    fn default() -> Self {
        Self::new(DEFAULT_DONE_SCAN_INTERVAL)
    }
}

impl RunnerFactory for LogDirRunnerFactory {
    fn create(&self, mut config: RunnerConfig) -> Result<Box<dyn Runner>, RunnerError> {
        let log_path = config.reader.log_path.clone();
        let canonical = match canonical_path(&log_path) {
            Ok(p) => p,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(RunnerError::LogDirNotFound(log_path));
            }
            Err(source) => {
                return Err(RunnerError::Io {
                    path: log_path,
                    source,
                })
            }
        };
        if !canonical.is_dir() {
            return Err(RunnerError::InvalidValue {
                field: "reader.log_path".to_string(),
                reason: format!("{} is not a directory", canonical.display()),
            });
        }

        config.reader.log_path = canonical;
        Ok(Box::new(LogDirRunner::new(config, self.scan_interval)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logpilot_cleaner::CleanerRegistry;
    use logpilot_domain::{BatchSettings, ReaderSettings};
    use std::fs;
    use std::path::PathBuf;

    fn config(log_path: PathBuf, meta_path: PathBuf, delete_enable: bool) -> RunnerConfig {
        RunnerConfig {
            name: "app".to_string(),
            reader: ReaderSettings {
                log_path,
                meta_path,
                mode: "dir".to_string(),
                read_from: "oldest".to_string(),
                ignore_hidden: true,
            },
            cleanup: CleanupPolicy {
                delete_enable,
                delete_interval_secs: 1,
                reserve_file_number: 0,
                reserve_file_size_mb: 0,
            },
            batch: BatchSettings::default(),
            parser: None,
            senders: Vec::new(),
        }
    }

    #[test]
    fn test_factory_missing_log_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config(tmp.path().join("absent"), tmp.path().join("meta"), false);
        let err = LogDirRunnerFactory::default().create(cfg).err().unwrap();
        assert!(err.is_log_dir_missing());
    }

    #[test]
    fn test_factory_rejects_plain_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("log");
        fs::write(&file, b"x").unwrap();
        let err = LogDirRunnerFactory::default()
            .create(config(file, tmp.path().join("meta"), false))
            .err()
            .unwrap();
        assert!(matches!(err, RunnerError::InvalidValue { .. }));
    }

    #[test]
    fn test_factory_canonicalizes_log_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let logs = tmp.path().join("logs");
        fs::create_dir(&logs).unwrap();
        let runner = LogDirRunnerFactory::default()
            .create(config(
                tmp.path().join("logs/../logs"),
                tmp.path().join("meta"),
                false,
            ))
            .unwrap();
        assert_eq!(runner.log_dir(), fs::canonicalize(&logs).unwrap());
        assert_eq!(runner.status(), RunnerStatus::Created);
    }

    #[tokio::test]
    async fn test_lifecycle_without_cleaner() {
        let tmp = tempfile::tempdir().unwrap();
        let meta = tmp.path().join("meta/app");
        let mut runner = LogDirRunner::new(
            config(tmp.path().to_path_buf(), meta.clone(), false),
            DEFAULT_DONE_SCAN_INTERVAL,
        );

        runner.start(None).await.unwrap();
        assert_eq!(runner.status(), RunnerStatus::Running);
        assert!(meta.is_dir());

        let again = runner.start(None).await;
        assert!(matches!(again, Err(RunnerError::AlreadyStarted(_))));

        runner.stop().await;
        runner.stop().await;
        assert_eq!(runner.status(), RunnerStatus::Stopped);
    }

    #[tokio::test]
    async fn test_done_markers_reach_the_queue() {
        let tmp = tempfile::tempdir().unwrap();
        let logs = tmp.path().join("logs");
        let meta = tmp.path().join("meta");
        fs::create_dir(&logs).unwrap();
        let log1 = logs.join("log1");
        fs::write(&log1, b"abc\n").unwrap();

        let registry = CleanerRegistry::new();
        let cfg = config(logs.clone(), meta.clone(), true);
        let handle = registry.register(&logs, cfg.cleanup).unwrap();
        let queue = registry.queue(&logs).unwrap();

        let mut runner = LogDirRunner::new(cfg, Duration::from_millis(20));
        runner.start(Some(handle)).await.unwrap();
        assert!(runner.cleaner().is_some());
        fs::write(meta.join("file.done.1"), format!("{}\n", log1.display())).unwrap();

        let mut acknowledged = false;
        for _ in 0..100 {
            if queue.acknowledgments(&log1) == 1 {
                acknowledged = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        runner.stop().await;
        assert!(acknowledged, "done marker was never reported");
        assert!(runner.cleaner().is_none());
    }
}
