use std::path::PathBuf;
use std::time::Duration;

/// Per-file transfer behaviour.
///
/// # Examples
///
/// ```
/// use odc_fetch::TransferOptions;
/// use std::time::Duration;
///
/// let options = TransferOptions::default()
///     .retry_limit(3)
///     .retry_sleep(Duration::from_secs(1));
/// assert_eq!(options.retry_limit, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOptions {
    /// Total number of attempts per file, including the first.
    ///
    /// Values below 1 are treated as 1.
    ///
    /// Default: 10
    pub retry_limit: u32,

    /// Fixed pause before each attempt after the first.
    ///
    /// Default: 5s
    pub retry_sleep: Duration,

    /// Render a progress line while bytes stream to disk.
    ///
    /// Default: false
    pub show_progress: bool,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            retry_limit: 10,
            retry_sleep: Duration::from_secs(5),
            show_progress: false,
        }
    }
}

impl TransferOptions {
    pub fn retry_limit(mut self, limit: u32) -> Self {
        self.retry_limit = limit;
        self
    }

    pub fn retry_sleep(mut self, sleep: Duration) -> Self {
        self.retry_sleep = sleep;
        self
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }
}

/// Configuration of one batch run over a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    /// Directory every file is stored into, under its URI basename.
    pub dest_dir: PathBuf,

    /// Log intended transfers and count them as downloaded without touching
    /// the network or the filesystem.
    pub dry_run: bool,

    /// Files transferred concurrently. 1 processes the manifest strictly
    /// sequentially.
    ///
    /// Default: 1
    pub jobs: usize,

    pub transfer: TransferOptions,
}

impl BatchOptions {
    pub fn new(dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            dest_dir: dest_dir.into(),
            dry_run: false,
            jobs: 1,
            transfer: TransferOptions::default(),
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn transfer(mut self, transfer: TransferOptions) -> Self {
        self.transfer = transfer;
        self
    }
}
