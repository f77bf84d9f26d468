//! The manager: configuration files in, running runners out.
//!
//! Each watched directory gets one background task that polls it and
//! applies the resulting events in order. A configuration whose log
//! directory does not exist yet gets a pending start that retries until
//! the directory appears or the configuration changes.
//!
//! Lock order is `pending` before `runners`; neither is held across an
//! `.await`.

use crate::config::ManagerConfig;
use crate::watcher::{ConfigEvent, ConfigWatcher};
use crate::ManagerError;
use logpilot_cleaner::{CleanerHandle, CleanerMetrics, CleanerRegistry};
use logpilot_domain::traits::ConfigParser;
use logpilot_domain::{resolve_path, BatchSettings, RunnerConfig};
use logpilot_runner::{JsonConfigParser, LogDirRunnerFactory, Runner, RunnerError, RunnerFactory};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{
    Arc, Mutex, MutexGuard, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{sleep, timeout};

/// Configuration parser shared by every watcher task
pub type SharedParser = Arc<dyn ConfigParser<Error = RunnerError> + Send + Sync>;

/// Runner factory shared by every watcher task
pub type SharedFactory = Arc<dyn RunnerFactory>;

struct RunnerSlot {
    runner: Box<dyn Runner>,
    cleaner: Option<CleanerHandle>,
}

struct PendingStart {
    generation: u64,
    task: JoinHandle<()>,
}

struct WatcherTask {
    dir: PathBuf,
    task: JoinHandle<()>,
}

struct Inner {
    config: ManagerConfig,
    parser: SharedParser,
    factory: SharedFactory,
    runners: RwLock<HashMap<PathBuf, RunnerSlot>>,
    cleaners: CleanerRegistry,
    pending: Mutex<HashMap<PathBuf, PendingStart>>,
    next_generation: AtomicU64,
    dir_sleep: OnceLock<Duration>,
    stopped: AtomicBool,
    shutdown: watch::Sender<bool>,
}

/// Watches configuration directories and keeps one runner per valid file
///
/// All state lives on the instance; any number of managers can run in one
/// process.
pub struct Manager {
    inner: Arc<Inner>,
    watchers: Mutex<Vec<WatcherTask>>,
    watching: AtomicBool,
}

impl Manager {
    /// Create a manager that parses JSON configurations and runs
    /// [`logpilot_runner::LogDirRunner`]s
    pub fn new(config: ManagerConfig) -> Result<Self, ManagerError> {
        let parser: SharedParser = Arc::new(JsonConfigParser::with_batch_defaults(
            BatchSettings::from(&config.runner_defaults),
        ));
        let factory: SharedFactory = Arc::new(LogDirRunnerFactory::new(config.done_scan_interval()));
        Self::with_components(config, parser, factory)
    }

    /// Create a manager with a custom parser and runner factory
    pub fn with_components(
        config: ManagerConfig,
        parser: SharedParser,
        factory: SharedFactory,
    ) -> Result<Self, ManagerError> {
        config.validate()?;
        let (shutdown, _) = watch::channel(false);
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                parser,
                factory,
                runners: RwLock::new(HashMap::new()),
                cleaners: CleanerRegistry::new(),
                pending: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
                dir_sleep: OnceLock::new(),
                stopped: AtomicBool::new(false),
                shutdown,
            }),
            watchers: Mutex::new(Vec::new()),
            watching: AtomicBool::new(false),
        })
    }

    /// Start watching `dirs`, one background task per directory.
    ///
    /// Configuration files already present are applied before this
    /// returns. A directory that does not exist yet is polled at the
    /// missing-directory interval; any other failure to read a directory
    /// aborts the call without starting any watcher. The set of
    /// directories is fixed once this succeeds.
    pub async fn watch<P>(&self, dirs: &[P]) -> Result<(), ManagerError>
    where
        P: AsRef<Path> + Sync,
    {
        if self.inner.is_stopped() {
            return Err(ManagerError::Stopped);
        }
        if self.watching.swap(true, Ordering::SeqCst) {
            return Err(ManagerError::AlreadyWatching);
        }
        let result = self.start_watching(dirs).await;
        if result.is_err() {
            self.watching.store(false, Ordering::SeqCst);
        }
        result
    }

    async fn start_watching<P>(&self, dirs: &[P]) -> Result<(), ManagerError>
    where
        P: AsRef<Path> + Sync,
    {
        let poll_interval = self.inner.config.poll_interval();
        let dir_sleep = self.inner.dir_sleep();

        let mut seen = HashSet::new();
        let mut watchers = Vec::with_capacity(dirs.len());
        let mut initial = Vec::new();
        for dir in dirs {
            let dir = dir.as_ref();
            let mut watcher = ConfigWatcher::new(dir, self.inner.config.config_suffix.clone())
                .map_err(|source| ManagerError::Io {
                    path: dir.to_path_buf(),
                    source,
                })?;
            if !seen.insert(watcher.dir().to_path_buf()) {
                tracing::warn!("Directory {} listed twice; watching it once", dir.display());
                continue;
            }

            let delay = match watcher.poll() {
                Ok(events) => {
                    initial.extend(events);
                    poll_interval
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    tracing::warn!(
                        "Config directory {} does not exist yet; retrying every {:?}",
                        watcher.dir().display(),
                        dir_sleep
                    );
                    dir_sleep
                }
                Err(source) => {
                    return Err(ManagerError::Io {
                        path: watcher.dir().to_path_buf(),
                        source,
                    })
                }
            };
            watchers.push((watcher, delay));
        }

        for event in initial {
            self.inner.handle_event(event).await;
        }
        if self.inner.is_stopped() {
            return Err(ManagerError::Stopped);
        }

        let mut tasks = self.lock_watchers();
        for (watcher, delay) in watchers {
            let dir = watcher.dir().to_path_buf();
            let shutdown = self.inner.shutdown.subscribe();
            let task = tokio::spawn(Arc::clone(&self.inner).run_watcher(watcher, delay, shutdown));
            tracing::info!("Watching {}", dir.display());
            tasks.push(WatcherTask { dir, task });
        }
        Ok(())
    }

    /// Names of all running runners, sorted
    pub fn runner_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .read_runners()
            .values()
            .map(|slot| slot.runner.name().to_string())
            .collect();
        names.sort();
        names
    }

    /// Number of running runners
    pub fn runner_count(&self) -> usize {
        self.inner.read_runners().len()
    }

    /// Whether a runner is running for the configuration file at `config_path`
    pub fn has_runner(&self, config_path: &Path) -> bool {
        // Runners are keyed under the watcher's resolved directory.
        let (Some(parent), Some(name)) = (config_path.parent(), config_path.file_name()) else {
            return false;
        };
        match resolve_path(parent) {
            Ok(dir) => self.inner.read_runners().contains_key(&dir.join(name)),
            Err(_) => false,
        }
    }

    /// Number of configurations waiting for their log directory to appear
    pub fn pending_count(&self) -> usize {
        self.inner.lock_pending().len()
    }

    /// Number of directory watchers running
    pub fn watcher_count(&self) -> usize {
        self.lock_watchers().len()
    }

    /// Directories being watched
    pub fn watched_dirs(&self) -> Vec<PathBuf> {
        self.lock_watchers().iter().map(|w| w.dir.clone()).collect()
    }

    /// Runners registered for cleanup on `log_dir`, if any
    pub fn cleaner_count(&self, log_dir: &Path) -> Option<usize> {
        self.inner.cleaners.cleaner_count(log_dir)
    }

    /// Deletion counters of `log_dir`'s clean queue, if it has one
    pub fn cleaner_stats(&self, log_dir: &Path) -> Option<CleanerMetrics> {
        self.inner.cleaners.metrics(log_dir)
    }

    /// Stop every watcher, pending start, runner and clean queue.
    ///
    /// Each background task gets the configured stop timeout; one that
    /// overruns it is abandoned and logged. Calling this again is a no-op.
    pub async fn stop(&self) {
        if self.inner.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!("Stopping manager");
        self.inner.shutdown.send_replace(true);
        let grace = self.inner.config.stop_timeout();

        let watchers = std::mem::take(&mut *self.lock_watchers());
        for WatcherTask { dir, task } in watchers {
            await_task(task, grace, format!("watcher for {}", dir.display())).await;
        }

        let pending: Vec<(PathBuf, PendingStart)> = self.inner.lock_pending().drain().collect();
        for (path, start) in pending {
            await_task(start.task, grace, format!("pending start for {}", path.display())).await;
        }

        let slots: Vec<(PathBuf, RunnerSlot)> = self.inner.write_runners().drain().collect();
        let mut stopping = JoinSet::new();
        for (path, slot) in slots {
            let inner = Arc::clone(&self.inner);
            stopping.spawn(async move { inner.retire(&path, slot).await });
        }
        while let Some(result) = stopping.join_next().await {
            if let Err(e) = result {
                tracing::error!("Runner stop task failed: {}", e);
            }
        }

        let abandoned = self.inner.cleaners.shutdown(grace).await;
        if !abandoned.is_empty() {
            tracing::error!("{} cleaner worker(s) abandoned at shutdown", abandoned.len());
        }
        tracing::info!("Manager stopped");
    }

    fn lock_watchers(&self) -> MutexGuard<'_, Vec<WatcherTask>> {
        self.watchers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Manager {
    fn drop(&mut self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
        self.inner.shutdown.send_replace(true);
    }
}

async fn await_task(mut task: JoinHandle<()>, grace: Duration, what: String) {
    match timeout(grace, &mut task).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            if !e.is_cancelled() {
                tracing::error!("{} failed: {}", what, e);
            }
        }
        Err(_) => {
            task.abort();
            tracing::error!(
                "{}",
                ManagerError::ShutdownTimeout(format!("{} did not stop within {:?}", what, grace))
            );
        }
    }
}

impl Inner {
    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn dir_sleep(&self) -> Duration {
        *self
            .dir_sleep
            .get_or_init(|| self.config.dir_not_exist_sleep())
    }

    fn read_runners(&self) -> RwLockReadGuard<'_, HashMap<PathBuf, RunnerSlot>> {
        self.runners.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_runners(&self) -> RwLockWriteGuard<'_, HashMap<PathBuf, RunnerSlot>> {
        self.runners.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_pending(&self) -> MutexGuard<'_, HashMap<PathBuf, PendingStart>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn limit_reached(&self, running: usize) -> bool {
        self.config.max_runners.is_some_and(|max| running >= max)
    }

    async fn run_watcher(
        self: Arc<Self>,
        mut watcher: ConfigWatcher,
        mut delay: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let poll_interval = self.config.poll_interval();
        let dir_sleep = self.dir_sleep();
        loop {
            if *shutdown.borrow_and_update() {
                break;
            }
            tokio::select! {
                _ = sleep(delay) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow_and_update() {
                        break;
                    }
                }
            }

            match watcher.poll() {
                Ok(events) => {
                    delay = poll_interval;
                    for event in events {
                        self.handle_event(event).await;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    if delay != dir_sleep {
                        tracing::warn!(
                            "Config directory {} is missing; retrying every {:?}",
                            watcher.dir().display(),
                            dir_sleep
                        );
                    }
                    delay = dir_sleep;
                }
                Err(e) => {
                    tracing::warn!("Cannot scan {}: {}", watcher.dir().display(), e);
                    delay = poll_interval;
                }
            }
        }
        tracing::debug!("Stopped watching {}", watcher.dir().display());
    }

    async fn handle_event(self: &Arc<Self>, event: ConfigEvent) {
        if self.is_stopped() {
            return;
        }
        match event {
            ConfigEvent::Added(path) => {
                tracing::info!("Config {} added", path.display());
                self.replace_runner(path).await;
            }
            ConfigEvent::Modified(path) => {
                tracing::info!("Config {} modified; restarting its runner", path.display());
                self.replace_runner(path).await;
            }
            ConfigEvent::Removed(path) => {
                tracing::info!("Config {} removed", path.display());
                self.cancel_pending(&path);
                self.remove_runner(&path).await;
            }
        }
    }

    /// Tear down whatever runs for `path`, then start from the current file
    async fn replace_runner(self: &Arc<Self>, path: PathBuf) {
        self.cancel_pending(&path);
        self.remove_runner(&path).await;
        self.add_runner(path).await;
    }

    async fn add_runner(self: &Arc<Self>, path: PathBuf) {
        let config = match self.load(&path).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config {}: {}", path.display(), e);
                return;
            }
        };
        if self.limit_reached(self.read_runners().len()) {
            tracing::warn!(
                "Ignoring config {}: runner limit {:?} reached",
                path.display(),
                self.config.max_runners
            );
            return;
        }

        match self.launch(config.clone()).await {
            Ok(slot) => self.commit(path, slot, None).await,
            Err(e) if e.is_log_dir_missing() => self.schedule_retry(path, config),
            Err(source) => {
                tracing::error!("{}", ManagerError::Lifecycle { path, source });
            }
        }
    }

    async fn load(&self, path: &Path) -> Result<RunnerConfig, RunnerError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| RunnerError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        self.parser.parse(&bytes)
    }

    /// Build and start a runner, registering it for cleanup first when its
    /// policy deletes files. A failed start leaves no registration behind.
    async fn launch(&self, config: RunnerConfig) -> Result<RunnerSlot, RunnerError> {
        let mut runner = self.factory.create(config)?;
        let policy = runner.cleanup_policy();
        let cleaner = if policy.delete_enable {
            Some(self.cleaners.register(runner.log_dir(), policy)?)
        } else {
            None
        };

        if let Err(e) = runner.start(cleaner.clone()).await {
            if let Some(handle) = &cleaner {
                self.cleaners.deregister(handle);
            }
            return Err(e);
        }
        Ok(RunnerSlot { runner, cleaner })
    }

    async fn commit(&self, path: PathBuf, slot: RunnerSlot, generation: Option<u64>) {
        let name = slot.runner.name().to_string();
        match self.try_commit(&path, slot, generation) {
            Ok(previous) => {
                tracing::info!("Runner {} running for {}", name, path.display());
                if let Some(previous) = previous {
                    self.retire(&path, previous).await;
                }
            }
            Err((slot, reason)) => {
                tracing::warn!("Discarding runner {} for {}: {}", name, path.display(), reason);
                self.retire(&path, slot).await;
            }
        }
    }

    /// Insert a started runner unless its pending start was superseded, the
    /// manager is stopping, or the limit is reached. On rejection the slot
    /// comes back to be torn down.
    fn try_commit(
        &self,
        path: &Path,
        slot: RunnerSlot,
        generation: Option<u64>,
    ) -> Result<Option<RunnerSlot>, (RunnerSlot, &'static str)> {
        let mut pending = self.lock_pending();
        if let Some(generation) = generation {
            match pending.get(path) {
                Some(start) if start.generation == generation => {
                    pending.remove(path);
                }
                _ => return Err((slot, "its configuration changed while it was starting")),
            }
        }
        if self.is_stopped() {
            return Err((slot, "the manager is stopping"));
        }

        let mut runners = self.write_runners();
        if !runners.contains_key(path) && self.limit_reached(runners.len()) {
            return Err((slot, "the runner limit is reached"));
        }
        Ok(runners.insert(path.to_path_buf(), slot))
    }

    async fn remove_runner(&self, path: &Path) {
        let slot = self.write_runners().remove(path);
        if let Some(slot) = slot {
            self.retire(path, slot).await;
        }
    }

    /// Stop a runner already out of the table, then release its cleanup
    /// registration
    async fn retire(&self, path: &Path, mut slot: RunnerSlot) {
        let name = slot.runner.name().to_string();
        let grace = self.config.stop_timeout();
        if timeout(grace, slot.runner.stop()).await.is_err() {
            tracing::error!(
                "{}",
                ManagerError::ShutdownTimeout(format!(
                    "runner {} for {} did not stop within {:?}",
                    name,
                    path.display(),
                    grace
                ))
            );
        }
        if let Some(handle) = slot.cleaner.take() {
            self.cleaners.deregister(&handle);
        }
        tracing::info!("Runner {} for {} removed", name, path.display());
    }

    fn schedule_retry(self: &Arc<Self>, path: PathBuf, config: RunnerConfig) {
        if self.is_stopped() {
            return;
        }
        let delay = self.dir_sleep();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(
            "Log directory {} of {} does not exist; retrying every {:?}",
            config.reader.log_path.display(),
            path.display(),
            delay
        );

        // Spawn under the lock so the task cannot look itself up before
        // it is recorded.
        let mut pending = self.lock_pending();
        let inner = Arc::clone(self);
        let task_path = path.clone();
        let task = tokio::spawn(async move {
            inner
                .retry_start(task_path, config, generation, delay)
                .await
        });
        pending.insert(path, PendingStart { generation, task });
    }

    fn cancel_pending(&self, path: &Path) {
        if self.lock_pending().remove(path).is_some() {
            tracing::debug!("Cancelled pending start for {}", path.display());
        }
    }

    fn is_pending(&self, path: &Path, generation: u64) -> bool {
        self.lock_pending()
            .get(path)
            .is_some_and(|start| start.generation == generation)
    }

    fn clear_pending(&self, path: &Path, generation: u64) {
        let mut pending = self.lock_pending();
        if pending
            .get(path)
            .is_some_and(|start| start.generation == generation)
        {
            pending.remove(path);
        }
    }

    async fn retry_start(
        self: Arc<Self>,
        path: PathBuf,
        config: RunnerConfig,
        generation: u64,
        delay: Duration,
    ) {
        let mut shutdown = self.shutdown.subscribe();
        loop {
            if *shutdown.borrow_and_update() {
                return;
            }
            tokio::select! {
                _ = sleep(delay) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow_and_update() {
                        return;
                    }
                }
            }
            if !self.is_pending(&path, generation) {
                return;
            }

            match self.launch(config.clone()).await {
                Ok(slot) => {
                    self.commit(path, slot, Some(generation)).await;
                    return;
                }
                Err(e) if e.is_log_dir_missing() => {
                    tracing::debug!(
                        "Log directory of {} still missing: {}",
                        path.display(),
                        e
                    );
                }
                Err(source) => {
                    self.clear_pending(&path, generation);
                    tracing::error!("{}", ManagerError::Lifecycle { path, source });
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fast_config() -> ManagerConfig {
        ManagerConfig {
            poll_interval_ms: 50,
            dir_not_exist_sleep_secs: Some(1),
            stop_timeout_ms: 2000,
            done_scan_interval_ms: 50,
            ..Default::default()
        }
    }

    fn runner_json(name: &str, log_path: &Path, meta_path: &Path, delete: bool) -> String {
        format!(
            r#"{{"name":"{}","reader":{{"log_path":"{}","meta_path":"{}"}},"cleaner":{{"delete_enable":"{}","delete_interval":"1"}}}}"#,
            name,
            log_path.display(),
            meta_path.display(),
            delete
        )
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = ManagerConfig {
            stop_timeout_ms: 0,
            ..Default::default()
        };
        assert!(matches!(Manager::new(config), Err(ManagerError::Config(_))));
    }

    #[tokio::test]
    async fn test_watch_twice_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = Manager::new(fast_config()).unwrap();
        manager.watch(&[tmp.path()]).await.unwrap();
        assert!(matches!(
            manager.watch(&[tmp.path()]).await,
            Err(ManagerError::AlreadyWatching)
        ));
        manager.stop().await;
        assert!(matches!(
            manager.watch(&[tmp.path()]).await,
            Err(ManagerError::Stopped)
        ));
    }

    #[tokio::test]
    async fn test_watch_fails_on_unreadable_target() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("not-a-dir");
        fs::write(&file, b"x").unwrap();

        let manager = Manager::new(fast_config()).unwrap();
        let err = manager.watch(&[tmp.path().to_path_buf(), file]).await.unwrap_err();
        assert!(matches!(err, ManagerError::Io { .. }));
        assert_eq!(manager.watcher_count(), 0);
        manager.stop().await;
    }

    #[tokio::test]
    async fn test_duplicate_directories_watched_once() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = Manager::new(fast_config()).unwrap();
        manager.watch(&[tmp.path(), tmp.path()]).await.unwrap();
        assert_eq!(manager.watcher_count(), 1);
        manager.stop().await;
    }

    #[tokio::test]
    async fn test_differently_spelled_directory_watched_once() {
        let tmp = tempfile::tempdir().unwrap();
        let confs = tmp.path().join("confs");
        let logs = tmp.path().join("logs");
        fs::create_dir(&confs).unwrap();
        fs::create_dir(&logs).unwrap();
        fs::write(
            confs.join("app.conf"),
            runner_json("app", &logs, &tmp.path().join("meta/app"), true),
        )
        .unwrap();

        let manager = Manager::new(fast_config()).unwrap();
        let dotted = confs.join("..").join("confs");
        manager.watch(&[&confs, &dotted]).await.unwrap();

        assert_eq!(manager.watcher_count(), 1);
        assert_eq!(manager.runner_count(), 1);
        assert_eq!(manager.cleaner_count(&logs), Some(1));
        assert!(manager.has_runner(&dotted.join("app.conf")));
        manager.stop().await;
    }

    #[tokio::test]
    async fn test_initial_files_start_before_watch_returns() {
        let tmp = tempfile::tempdir().unwrap();
        let confs = tmp.path().join("confs");
        let logs = tmp.path().join("logs");
        fs::create_dir(&confs).unwrap();
        fs::create_dir(&logs).unwrap();
        fs::write(
            confs.join("a.conf"),
            runner_json("a", &logs, &tmp.path().join("meta/a"), true),
        )
        .unwrap();
        fs::write(
            confs.join("b.conf"),
            runner_json("b", &logs, &tmp.path().join("meta/b"), false),
        )
        .unwrap();
        fs::write(confs.join("c.json"), "ignored").unwrap();

        let manager = Manager::new(fast_config()).unwrap();
        manager.watch(&[&confs]).await.unwrap();

        assert_eq!(manager.runner_names(), vec!["a".to_string(), "b".to_string()]);
        assert!(manager.has_runner(&confs.join("a.conf")));
        assert_eq!(manager.cleaner_count(&logs), Some(1));
        assert!(manager.cleaner_stats(&logs).is_some());

        manager.stop().await;
        assert_eq!(manager.runner_count(), 0);
        assert_eq!(manager.watcher_count(), 0);
        assert_eq!(manager.cleaner_count(&logs), None);
        manager.stop().await;
    }

    #[tokio::test]
    async fn test_runner_limit() {
        let tmp = tempfile::tempdir().unwrap();
        let confs = tmp.path().join("confs");
        fs::create_dir(&confs).unwrap();
        for name in ["a", "b", "c"] {
            fs::write(
                confs.join(format!("{}.conf", name)),
                runner_json(name, tmp.path(), &tmp.path().join("meta").join(name), false),
            )
            .unwrap();
        }

        let manager = Manager::new(ManagerConfig {
            max_runners: Some(2),
            ..fast_config()
        })
        .unwrap();
        manager.watch(&[&confs]).await.unwrap();
        assert_eq!(manager.runner_count(), 2);
        manager.stop().await;
    }
}
