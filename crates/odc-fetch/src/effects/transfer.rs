//! The single-file transfer engine.

use std::io;
use std::path::Path;

use futures_util::StreamExt;
use tokio::fs::{self, File, OpenOptions};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::progress::{ProgressHub, ProgressWriter};
use super::source::{BoxStream, ByteSource};
use crate::core::RetryPolicy;
use crate::data::{TransferOptions, TransferOutcome};
use crate::error::{FetchError, Result};

/// Resumable, retrying download of one URI to one local path.
#[derive(Debug)]
pub struct Transfer<S> {
    source: S,
    options: TransferOptions,
    progress: ProgressHub,
}

impl<S: ByteSource> Transfer<S> {
    pub fn new(source: S, options: TransferOptions) -> Self {
        let progress = if options.show_progress {
            ProgressHub::stderr()
        } else {
            ProgressHub::hidden()
        };
        Self { source, options, progress }
    }

    /// Render progress lines through `hub` instead of the default target.
    pub fn with_progress(mut self, hub: ProgressHub) -> Self {
        self.progress = hub;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn options(&self) -> &TransferOptions {
        &self.options
    }

    /// Download `uri` to `dest`.
    ///
    /// With `resume`, every attempt continues from whatever is on disk at
    /// that moment. A source that does not honour the offset causes the file
    /// to be rewritten from the start.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Cancelled`] as soon as `cancel` fires; partial content
    ///   stays on disk.
    /// - [`FetchError::CreateDir`] if the parent directory cannot be created.
    /// - [`FetchError::RetriesExhausted`] once every attempt failed.
    /// - Any error that another attempt would not fix, as is.
    pub async fn run(
        &self,
        uri: &str,
        dest: &Path,
        resume: bool,
        expected_size: Option<u64>,
        cancel: &CancellationToken,
    ) -> Result<TransferOutcome> {
        let policy = RetryPolicy::new(self.options.retry_limit, self.options.retry_sleep);
        let mut attempt = 0;

        loop {
            let delay = policy.delay_before(attempt);
            if !delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            if cancel.is_cancelled() {
                return Err(FetchError::Cancelled);
            }

            let err = match self.attempt(uri, dest, resume, expected_size, cancel).await {
                Ok(bytes) => {
                    if let Some(expected) = expected_size.filter(|expected| *expected != bytes) {
                        warn!(uri, bytes, expected, "downloaded size differs from catalog size");
                    }
                    return Ok(TransferOutcome {
                        path: dest.to_path_buf(),
                        bytes_transferred: bytes,
                        retries_used: attempt,
                    });
                }
                Err(err) => err,
            };

            if !err.is_retryable() {
                return Err(err);
            }
            if policy.is_last(attempt) {
                return Err(FetchError::RetriesExhausted {
                    attempts: policy.attempts(),
                    last: Box::new(err),
                });
            }

            attempt += 1;
            warn!(
                uri,
                error = %err,
                "attempt {attempt}/{} failed, retrying in {:?}",
                policy.attempts(),
                policy.delay_before(attempt)
            );
        }
    }

    /// One attempt; returns the final size of `dest`.
    async fn attempt(
        &self,
        uri: &str,
        dest: &Path,
        resume: bool,
        expected_size: Option<u64>,
        cancel: &CancellationToken,
    ) -> Result<u64> {
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| FetchError::CreateDir { path: parent.to_path_buf(), source })?;
        }

        let existing = if resume { existing_size(dest).await? } else { 0 };
        let opened = self.source.open_at(uri, existing).await?;

        let file = if opened.start == 0 {
            if existing > 0 {
                info!(uri, existing, "source ignored the resume offset, rewriting");
            }
            File::create(dest).await?
        } else if opened.start == existing {
            info!(uri, existing, "resuming");
            OpenOptions::new().append(true).open(dest).await?
        } else {
            return Err(FetchError::Io(io::Error::other(format!(
                "source resumed at byte {} instead of {existing}",
                opened.start
            ))));
        };

        let total = opened
            .content_length
            .map(|len| opened.start + len)
            .or(expected_size);
        let name = dest.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        let mut writer = ProgressWriter::new(file, self.progress.bar(&name, total), total);
        writer.set_initial_progress(opened.start);

        let mut stream = opened.stream;
        let pumped = pump(&mut stream, &mut writer, cancel).await;
        let flushed = writer.flush().await.map_err(FetchError::from);

        match pumped.and(flushed) {
            Ok(()) => {
                let progress = writer.finish();
                debug!(uri, written = progress.written_bytes, "attempt complete");
                Ok(progress.current_bytes())
            }
            Err(err) => {
                let progress = writer.abandon();
                debug!(
                    uri,
                    kept = progress.current_bytes(),
                    percent = ?progress.percentage(),
                    "attempt aborted"
                );
                Err(err)
            }
        }
    }
}

/// Copy `stream` into `writer` until it ends, fails or `cancel` fires.
async fn pump(
    stream: &mut BoxStream<'static, Result<bytes::Bytes>>,
    writer: &mut ProgressWriter<File>,
    cancel: &CancellationToken,
) -> Result<()> {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            chunk = stream.next() => match chunk {
                Some(chunk) => writer.write(&chunk?).await?,
                None => return Ok(()),
            },
        }
    }
}

async fn existing_size(path: &Path) -> Result<u64> {
    match fs::metadata(path).await {
        Ok(meta) => Ok(meta.len()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(0),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_existing_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.bin");
        assert_eq!(existing_size(&path).await.unwrap(), 0);

        std::fs::write(&path, b"12345").unwrap();
        assert_eq!(existing_size(&path).await.unwrap(), 5);
    }
}
