use std::time::Duration;

/// Snapshot of one file's transfer, used to render progress lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    /// Bytes already on disk before this attempt started writing.
    pub initial_bytes: u64,

    /// Bytes written during this attempt.
    pub written_bytes: u64,

    /// Final size of the file, if known.
    pub total_bytes: Option<u64>,
}

impl Progress {
    pub fn new(total_bytes: Option<u64>) -> Self {
        Self { total_bytes, ..Self::default() }
    }

    /// Bytes of the final file present on disk.
    pub fn current_bytes(&self) -> u64 {
        self.initial_bytes + self.written_bytes
    }

    /// Percentage of the final size present on disk, capped at 100.
    ///
    /// Returns `None` when the total is unknown or zero.
    #[must_use]
    pub fn percentage(&self) -> Option<f64> {
        self.total_bytes
            .filter(|total| *total > 0)
            .map(|total| (self.current_bytes() as f64 / total as f64 * 100.0).min(100.0))
    }

    /// Average rate of this attempt in bytes per second.
    pub fn average_rate(&self, elapsed: Duration) -> f64 {
        self.written_bytes as f64 / elapsed.as_secs_f64().max(0.001)
    }

    /// Closing note for a finished transfer: average rate and elapsed time.
    pub fn summary(&self, elapsed: Duration) -> String {
        format!(
            "[{}/s avg] in {:.1}s",
            indicatif::HumanBytes(self.average_rate(elapsed) as u64),
            elapsed.as_secs_f64()
        )
    }
}
