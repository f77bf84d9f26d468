//! Metrics collection for cleanup cycles

/// Metrics collected by one clean queue
///
/// Tracks files deleted, bytes reclaimed, and files held back by the
/// retention window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanerMetrics {
    /// Total sweep iterations completed
    pub sweep_count: usize,

    /// Files deleted across all sweeps
    pub files_deleted: usize,

    /// Bytes freed across all sweeps
    pub bytes_reclaimed: u64,

    /// Fully-acknowledged files kept by the retention window in the last sweep
    pub files_retained: usize,

    /// Deletions that failed with an I/O error
    pub delete_failures: usize,
}

impl CleanerMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a deleted file
    pub fn record_deletion(&mut self, bytes: u64) {
        self.files_deleted += 1;
        self.bytes_reclaimed = self.bytes_reclaimed.saturating_add(bytes);
    }

    /// Record a failed deletion
    pub fn record_failure(&mut self) {
        self.delete_failures += 1;
    }

    /// Record a sweep cycle completion
    pub fn record_sweep(&mut self, retained: usize) {
        self.sweep_count += 1;
        self.files_retained = retained;
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a one-line summary for logs
    pub fn summary(&self) -> String {
        format!(
            "{} sweeps, {} files deleted ({} bytes), {} retained, {} failures",
            self.sweep_count,
            self.files_deleted,
            self.bytes_reclaimed,
            self.files_retained,
            self.delete_failures
        )
    }
}
