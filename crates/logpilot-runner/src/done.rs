//! Done markers: a runner's record of fully consumed log files
//!
//! The reader writes files named `file.done*` into its meta directory, one
//! consumed log file path per line. The tracker turns new lines into
//! `mark_done` calls on the runner's cleaner registration.

use crate::RunnerError;
use logpilot_cleaner::{CleanerError, CleanerHandle};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;

/// File-name prefix of done marker files
pub const DONE_FILE_PREFIX: &str = "file.done";

/// Per log file: how many of its lines in one marker have been handled
type MarkerProgress = HashMap<PathBuf, usize>;

enum Outcome {
    Reported,
    Ignored,
    Retry,
}

/// Forwards done markers from a meta directory to a clean queue
pub struct DoneTracker {
    meta_dir: PathBuf,
    cleaner: CleanerHandle,
    progress: HashMap<PathBuf, MarkerProgress>,
}

impl DoneTracker {
    /// Create a tracker reading `meta_dir`
    pub fn new(meta_dir: PathBuf, cleaner: CleanerHandle) -> Self {
        Self {
            meta_dir,
            cleaner,
            progress: HashMap::new(),
        }
    }

    /// Read every done marker once and report lines not reported before.
    ///
    /// Lines are tracked per marker file and per occurrence, so a log file
    /// name that is reused and written again (to a new marker or appended
    /// to the same one) is reported again. Progress for markers that no
    /// longer exist is dropped. Returns the number of newly reported files;
    /// a missing meta directory simply has nothing to report.
    pub fn scan(&mut self) -> Result<usize, RunnerError> {
        let entries = match fs::read_dir(&self.meta_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.progress.clear();
                return Ok(0);
            }
            Err(source) => {
                return Err(RunnerError::Io {
                    path: self.meta_dir.clone(),
                    source,
                })
            }
        };

        let mut marker_files: Vec<PathBuf> = entries
            .flatten()
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(DONE_FILE_PREFIX))
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|entry| entry.path())
            .collect();
        marker_files.sort();

        let mut previous = std::mem::take(&mut self.progress);
        let mut reported = 0;
        for marker in marker_files {
            let before = previous.remove(&marker).unwrap_or_default();
            let contents = match fs::read_to_string(&marker) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!("Cannot read done marker {}: {}", marker.display(), e);
                    self.progress.insert(marker, before);
                    continue;
                }
            };

            let mut occurrences: HashMap<&Path, usize> = HashMap::new();
            let mut after = MarkerProgress::new();
            for line in contents.lines().map(str::trim).filter(|l| !l.is_empty()) {
                let file = Path::new(line);
                let nth = occurrences.entry(file).or_insert(0);
                *nth += 1;
                let nth = *nth;
                let handled = after.entry(file.to_path_buf()).or_insert(0);

                if nth <= before.get(file).copied().unwrap_or(0) {
                    *handled = nth;
                    continue;
                }
                // an earlier occurrence is still waiting for a retry
                if *handled + 1 < nth {
                    continue;
                }
                match self.report(file) {
                    Outcome::Reported => {
                        *handled = nth;
                        reported += 1;
                    }
                    Outcome::Ignored => *handled = nth,
                    Outcome::Retry => {}
                }
            }
            after.retain(|_, handled| *handled > 0);
            self.progress.insert(marker, after);
        }
        Ok(reported)
    }

    fn report(&self, file: &Path) -> Outcome {
        match self.cleaner.mark_done(file) {
            Ok(true) => {
                tracing::debug!("{} done with {}", self.meta_dir.display(), file.display());
                Outcome::Reported
            }
            Ok(false) => Outcome::Retry,
            Err(CleanerError::OutsideLogDir { file: resolved, log_dir }) => {
                tracing::warn!(
                    "Ignoring done marker for {}: outside {}",
                    resolved.display(),
                    log_dir.display()
                );
                Outcome::Ignored
            }
            Err(e) => {
                tracing::warn!("Cannot mark {} done: {}", file.display(), e);
                Outcome::Retry
            }
        }
    }

    /// Scan every `period` until `shutdown` flips to `true` or is dropped
    pub async fn run(mut self, period: Duration, mut shutdown: watch::Receiver<bool>) {
        loop {
            if let Err(e) = self.scan() {
                tracing::warn!("Done marker scan failed: {}", e);
            }
            tokio::select! {
                _ = sleep(period) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow_and_update() {
                        break;
                    }
                }
            }
        }
    }
}
