//! Manifest-level orchestration.
//!
//! Files are handled in manifest order. With `jobs > 1` several transfers
//! run at once, but results are still folded in order by the caller's task,
//! so statistics need no synchronisation. Slots that resolve to the same
//! local path take turns in manifest order, so at most one transfer writes a
//! given file and the outcome matches a sequential run.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use futures_util::{StreamExt, stream};
use tokio::fs;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::progress::ProgressHub;
use super::source::ByteSource;
use super::transfer::Transfer;
use crate::data::{BatchOptions, BatchStats, FileOutcome, FileStatus, Manifest, ManifestSlot};
use crate::error::{BatchError, FetchError};

/// Runs a [`Transfer`] for every file of a manifest and gathers statistics.
#[derive(Debug)]
pub struct BatchRunner<S> {
    transfer: Transfer<S>,
    options: BatchOptions,
}

/// Per-file errors that end the whole batch.
enum Interrupt {
    Cancelled,
    CreateDir { path: PathBuf, source: io::Error },
}

/// A slot's place in the queue of slots sharing its local path.
///
/// `after` resolves once the previous slot for the path is done; dropping
/// `_done` releases the next one.
#[derive(Default)]
struct Turn {
    after: Option<oneshot::Receiver<()>>,
    _done: Option<oneshot::Sender<()>>,
}

impl Turn {
    async fn wait(&mut self) {
        if let Some(after) = self.after.take() {
            // Only the sender being dropped matters, never a value.
            let _ = after.await;
        }
    }
}

/// One turn per slot, chained through the slots that share a local path.
fn turns(manifest: &Manifest, dest_dir: &Path) -> Vec<Turn> {
    let mut last: HashMap<PathBuf, oneshot::Receiver<()>> = HashMap::new();
    manifest
        .slots()
        .iter()
        .map(|slot| match slot.entry() {
            Some(entry) => {
                let (done, next) = oneshot::channel();
                Turn { after: last.insert(entry.local_path(dest_dir), next), _done: Some(done) }
            }
            None => Turn::default(),
        })
        .collect()
}

impl<S: ByteSource> BatchRunner<S> {
    pub fn new(source: S, options: BatchOptions) -> Self {
        let transfer = Transfer::new(source, options.transfer.clone());
        Self { transfer, options }
    }

    pub fn with_progress(mut self, hub: ProgressHub) -> Self {
        self.transfer = self.transfer.with_progress(hub);
        self
    }

    pub fn transfer(&self) -> &Transfer<S> {
        &self.transfer
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Download every file of `manifest` into the destination directory.
    ///
    /// Single file failures are counted, not returned.
    ///
    /// # Errors
    ///
    /// - [`BatchError::CreateDir`] when a destination directory cannot be
    ///   created, since no file could be stored.
    /// - [`BatchError::Cancelled`] with the counts gathered so far.
    pub async fn run(
        &self,
        manifest: &Manifest,
        cancel: &CancellationToken,
    ) -> Result<BatchStats, BatchError> {
        let dest_dir = &self.options.dest_dir;
        if !self.options.dry_run {
            fs::create_dir_all(dest_dir)
                .await
                .map_err(|source| BatchError::CreateDir { path: dest_dir.clone(), source })?;
        }

        let total = manifest.len();
        let mut stats = BatchStats::new(total);
        let slots = manifest.slots().iter().zip(turns(manifest, dest_dir)).enumerate();
        let mut outcomes = stream::iter(slots)
            .map(|(index, (slot, turn))| self.process(index + 1, total, slot, turn, cancel))
            .buffered(self.options.jobs.max(1));

        while let Some(outcome) = outcomes.next().await {
            match outcome {
                Ok(outcome) => stats.record(&outcome),
                Err(Interrupt::Cancelled) => return Err(BatchError::Cancelled { stats }),
                Err(Interrupt::CreateDir { path, source }) => {
                    return Err(BatchError::CreateDir { path, source });
                }
            }
        }

        Ok(stats)
    }

    async fn process(
        &self,
        position: usize,
        total: usize,
        slot: &ManifestSlot,
        mut turn: Turn,
        cancel: &CancellationToken,
    ) -> Result<FileOutcome, Interrupt> {
        let entry = match slot {
            ManifestSlot::Entry(entry) => entry,
            ManifestSlot::Malformed { index, reason } => {
                warn!(index, reason = %reason, "skipping malformed manifest entry");
                return Ok(FileOutcome { expected_bytes: 0, status: FileStatus::Malformed });
            }
        };
        let expected = entry.size;
        let outcome = |status| Ok(FileOutcome { expected_bytes: expected, status });

        if self.options.dry_run {
            info!(uri = %entry.uri, bytes = expected, "[dry run] would download file {position} of {total}");
            return outcome(FileStatus::Simulated { bytes: expected });
        }

        let path = entry.local_path(&self.options.dest_dir);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Interrupt::Cancelled),
            _ = turn.wait() => {}
        }
        if let Ok(meta) = fs::metadata(&path).await {
            if meta.is_file() && meta.len() >= expected {
                info!(path = %path.display(), "file {position} of {total} already complete, skipping");
                return outcome(FileStatus::Skipped);
            }
        }

        info!(uri = %entry.uri, "downloading file {position} of {total}");
        match self.transfer.run(&entry.uri, &path, true, Some(expected), cancel).await {
            Ok(done) => outcome(FileStatus::Downloaded { bytes: done.bytes_transferred }),
            Err(FetchError::Cancelled) => Err(Interrupt::Cancelled),
            Err(FetchError::CreateDir { path, source }) => Err(Interrupt::CreateDir { path, source }),
            Err(err) => {
                error!(uri = %entry.uri, error = %err, "download failed");
                outcome(FileStatus::Failed { reason: err.to_string() })
            }
        }
    }
}
