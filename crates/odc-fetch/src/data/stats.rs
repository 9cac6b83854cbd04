use std::fmt;
use std::path::PathBuf;

/// Result of a completed single-file transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub path: PathBuf,
    /// Final size of the local file: bytes kept from before plus bytes written.
    pub bytes_transferred: u64,
    /// Attempts that failed before the successful one.
    pub retries_used: u32,
}

/// What the batch runner decided for one manifest slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Downloaded { bytes: u64 },
    /// A dry run that would have downloaded this many bytes.
    Simulated { bytes: u64 },
    /// Already complete on disk.
    Skipped,
    /// The slot did not describe a usable file.
    Malformed,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub expected_bytes: u64,
    pub status: FileStatus,
}

/// Aggregate counts of one batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchStats {
    pub total_files: u64,
    pub total_bytes: u64,
    pub downloaded_files: u64,
    pub downloaded_bytes: u64,
    pub failed_files: u64,
    pub skipped_files: u64,
}

impl BatchStats {
    pub fn new(total_files: usize) -> Self {
        Self { total_files: total_files as u64, ..Self::default() }
    }

    /// Fold one file's outcome into the totals.
    pub fn record(&mut self, outcome: &FileOutcome) {
        self.total_bytes += outcome.expected_bytes;
        match &outcome.status {
            FileStatus::Downloaded { bytes } | FileStatus::Simulated { bytes } => {
                self.downloaded_files += 1;
                self.downloaded_bytes += bytes;
            }
            FileStatus::Skipped | FileStatus::Malformed => self.skipped_files += 1,
            FileStatus::Failed { .. } => self.failed_files += 1,
        }
    }

    pub fn processed_files(&self) -> u64 {
        self.downloaded_files + self.failed_files + self.skipped_files
    }

    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed_files == 0
    }
}

impl fmt::Display for BatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Download summary:")?;
        writeln!(f, "  Total files:     {}", self.total_files)?;
        writeln!(f, "  Downloaded:      {}", self.downloaded_files)?;
        writeln!(f, "  Skipped:         {}", self.skipped_files)?;
        writeln!(f, "  Failed:          {}", self.failed_files)?;
        write!(f, "  Total bytes:     {}", self.downloaded_bytes)
    }
}
