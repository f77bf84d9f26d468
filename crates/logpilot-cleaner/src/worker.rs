//! Background worker running a clean queue's cycles

use crate::queue::IDLE_CYCLE;
use crate::{CleanQueue, SweepReport};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{sleep, Instant};

/// Background worker that sweeps one clean queue on a schedule
///
/// The period is re-read from the queue before every cycle, so it follows
/// the merged policy as runners come and go.
pub struct CleanerWorker {
    queue: Arc<CleanQueue>,
}

impl CleanerWorker {
    /// Create a worker for `queue`
    pub fn new(queue: Arc<CleanQueue>) -> Self {
        Self { queue }
    }

    /// Run until `shutdown` flips to `true` or its sender is dropped
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            "Cleaner worker started for {}",
            self.queue.log_dir().display()
        );

        // The period is re-read at least every IDLE_CYCLE, so a cleaner
        // leaving with a long interval does not hold back a shorter one.
        let mut last_sweep = Instant::now();
        loop {
            let now = Instant::now();
            let nap = match last_sweep.checked_add(self.queue.cycle_interval()) {
                Some(due) if now >= due => {
                    self.cycle();
                    last_sweep = Instant::now();
                    continue;
                }
                Some(due) => (due - now).min(IDLE_CYCLE),
                None => IDLE_CYCLE,
            };
            tokio::select! {
                _ = sleep(nap) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow_and_update() {
                        break;
                    }
                }
            }
        }

        tracing::info!(
            "Cleaner worker for {} stopped: {}",
            self.queue.log_dir().display(),
            self.queue.metrics().summary()
        );
    }

    /// Run a fixed number of cycles (useful for testing)
    pub async fn run_cycles(&self, cycles: usize) -> Vec<SweepReport> {
        let mut reports = Vec::with_capacity(cycles);
        for _ in 0..cycles {
            sleep(self.queue.cycle_interval()).await;
            reports.push(self.cycle());
        }
        reports
    }

    fn cycle(&self) -> SweepReport {
        let report = self.queue.sweep();
        if report.deleted.is_empty() && report.failures == 0 {
            tracing::debug!(
                "Sweep of {}: nothing to delete ({} retained)",
                self.queue.log_dir().display(),
                report.retained.len()
            );
        } else {
            tracing::info!(
                "Sweep of {}: {} deleted, {} bytes reclaimed, {} failed",
                self.queue.log_dir().display(),
                report.deleted.len(),
                report.bytes_reclaimed,
                report.failures
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logpilot_domain::CleanupPolicy;
    use std::time::Duration;
    use uuid::Uuid;

    fn enabled() -> CleanupPolicy {
        CleanupPolicy {
            delete_enable: true,
            delete_interval_secs: 1,
            reserve_file_number: 0,
            reserve_file_size_mb: 0,
        }
    }

    #[tokio::test]
    async fn test_run_cycles() {
        let tmp = tempfile::tempdir().unwrap();
        let queue = Arc::new(CleanQueue::new(tmp.path().to_path_buf()));
        let id = Uuid::now_v7();
        queue.add_cleaner(id, enabled());
        let file = tmp.path().join("app.log");
        std::fs::write(&file, b"done").unwrap();
        queue.mark_done(id, file.clone());

        let worker = CleanerWorker::new(Arc::clone(&queue));
        let reports = worker.run_cycles(2).await;

        assert_eq!(reports[0].deleted, vec![file.clone()]);
        assert!(reports[1].deleted.is_empty());
        assert!(!file.exists());
        assert_eq!(queue.metrics().sweep_count, 2);
    }

    #[tokio::test]
    async fn test_run_stops_on_signal() {
        let queue = Arc::new(CleanQueue::new("/nonexistent".into()));
        let worker = CleanerWorker::new(queue);
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(async move { worker.run(rx).await });

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("worker did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_run_stops_when_sender_dropped() {
        let queue = Arc::new(CleanQueue::new("/nonexistent".into()));
        let worker = CleanerWorker::new(queue);
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(async move { worker.run(rx).await });

        drop(tx);
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("worker did not stop")
            .unwrap();
    }
}
