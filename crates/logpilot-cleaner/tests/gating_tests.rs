//! Deletion gating across a changing set of cleaners
//!
//! A file in a shared log directory must survive every sweep until all
//! currently registered cleaners have marked it done.

use logpilot_cleaner::{CleanQueue, CleanerRegistry};
use logpilot_domain::CleanupPolicy;
use proptest::prelude::*;
use std::fs;
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

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn file_survives_until_every_cleaner_is_done(
        cleaners in 1usize..6,
        marks in proptest::collection::vec(any::<bool>(), 6),
    ) {
        let tmp = tempfile::tempdir().unwrap();
        let queue = CleanQueue::new(tmp.path().to_path_buf());
        let ids: Vec<Uuid> = (0..cleaners).map(|_| Uuid::now_v7()).collect();
        for id in &ids {
            queue.add_cleaner(*id, enabled());
        }

        let file = tmp.path().join("shared.log");
        fs::write(&file, b"payload").unwrap();

        let mut acknowledged = 0;
        for (id, mark) in ids.iter().zip(&marks) {
            if *mark {
                queue.mark_done(*id, file.clone());
                acknowledged += 1;
            }
        }

        prop_assert_eq!(queue.acknowledgments(&file), acknowledged);
        let report = queue.sweep();
        if acknowledged == cleaners {
            prop_assert_eq!(report.deleted, vec![file.clone()]);
            prop_assert!(!file.exists());
        } else {
            prop_assert!(report.deleted.is_empty());
            prop_assert!(file.exists());
        }
    }

    #[test]
    fn removing_the_laggards_releases_the_file(
        cleaners in 2usize..6,
        done in 1usize..5,
    ) {
        let done = done.min(cleaners - 1);
        let tmp = tempfile::tempdir().unwrap();
        let queue = CleanQueue::new(tmp.path().to_path_buf());
        let ids: Vec<Uuid> = (0..cleaners).map(|_| Uuid::now_v7()).collect();
        for id in &ids {
            queue.add_cleaner(*id, enabled());
        }

        let file = tmp.path().join("shared.log");
        fs::write(&file, b"payload").unwrap();
        for id in &ids[..done] {
            queue.mark_done(*id, file.clone());
        }
        prop_assert!(queue.sweep().deleted.is_empty());

        for id in &ids[done..] {
            queue.remove_cleaner(*id);
        }
        prop_assert_eq!(queue.cleaner_count(), done);
        prop_assert_eq!(queue.sweep().deleted, vec![file.clone()]);
    }
}

#[tokio::test]
async fn test_worker_deletes_within_one_cycle() {
    let tmp = tempfile::tempdir().unwrap();
    let logs = tmp.path().join("logs");
    fs::create_dir(&logs).unwrap();
    let file = logs.join("app.log");
    fs::write(&file, b"line\n").unwrap();

    let registry = CleanerRegistry::new();
    let first = registry.register(&logs, enabled()).unwrap();
    let second = registry.register(&logs, enabled()).unwrap();

    first.mark_done(&file).unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(file.exists(), "deleted before every cleaner was done");

    second.mark_done(&file).unwrap();
    let mut deleted = false;
    for _ in 0..30 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if !file.exists() {
            deleted = true;
            break;
        }
    }
    assert!(deleted, "file should be deleted within one cleanup cycle");

    let metrics = registry.metrics(&logs).unwrap();
    assert_eq!(metrics.files_deleted, 1);
    registry.shutdown(Duration::from_secs(5)).await;
}

#[tokio::test]
async fn test_shorter_interval_applies_once_slow_cleaner_leaves() {
    let tmp = tempfile::tempdir().unwrap();
    let logs = tmp.path().join("logs");
    fs::create_dir(&logs).unwrap();
    let file = logs.join("app.log");
    fs::write(&file, b"line\n").unwrap();

    let registry = CleanerRegistry::new();
    let slow = registry
        .register(
            &logs,
            CleanupPolicy {
                delete_interval_secs: 300,
                ..enabled()
            },
        )
        .unwrap();
    let fast = registry.register(&logs, enabled()).unwrap();

    // Let the worker start its first wait under the 300 s merged interval.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(registry.deregister(&slow));
    fast.mark_done(&file).unwrap();

    let mut deleted = false;
    for _ in 0..40 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if !file.exists() {
            deleted = true;
            break;
        }
    }
    assert!(deleted, "the 1 s interval should apply after the slow cleaner left");
    registry.shutdown(Duration::from_secs(5)).await;
}
