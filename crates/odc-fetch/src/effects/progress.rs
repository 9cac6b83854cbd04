use std::io;
use std::time::Instant;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use once_cell::sync::Lazy;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::data::Progress;

const REFRESH_HZ: u8 = 5;

const BAR_STYLE: &str =
    "  -> {prefix}: {percent}% ({bytes} / {total_bytes}) [{binary_bytes_per_sec}] {msg}";

const SPINNER_STYLE: &str = "  -> {prefix}: {spinner} {bytes} [{binary_bytes_per_sec}] {msg}";

static BAR_TEMPLATE: Lazy<Option<ProgressStyle>> =
    Lazy::new(|| ProgressStyle::with_template(BAR_STYLE).ok());

static SPINNER_TEMPLATE: Lazy<Option<ProgressStyle>> =
    Lazy::new(|| ProgressStyle::with_template(SPINNER_STYLE).ok());

/// Shared draw target for the progress lines of one batch.
///
/// Hidden hubs hand out hidden bars; transfers behave the same either way.
#[derive(Debug, Clone, Default)]
pub struct ProgressHub {
    multi: Option<MultiProgress>,
}

impl ProgressHub {
    pub fn hidden() -> Self {
        Self { multi: None }
    }

    /// Draw on stderr, redrawing at most 5 times per second.
    pub fn stderr() -> Self {
        let target = ProgressDrawTarget::stderr_with_hz(REFRESH_HZ);
        Self { multi: Some(MultiProgress::with_draw_target(target)) }
    }

    /// A line for `name`: a percentage bar when `total` is known and non-zero,
    /// otherwise a spinner with absolute bytes.
    pub fn bar(&self, name: &str, total: Option<u64>) -> ProgressBar {
        let Some(multi) = &self.multi else {
            return ProgressBar::hidden();
        };

        let (pb, style) = match total {
            Some(total) if total > 0 => (ProgressBar::new(total), BAR_TEMPLATE.as_ref()),
            _ => (ProgressBar::new_spinner(), SPINNER_TEMPLATE.as_ref()),
        };
        let pb = match style {
            Some(style) => pb.with_style(style.clone()),
            None => pb,
        };
        pb.set_prefix(name.to_string());
        multi.add(pb)
    }
}

/// Destination writer that reports what passes through it.
pub struct ProgressWriter<W> {
    inner: W,
    bar: ProgressBar,
    progress: Progress,
    started: Instant,
}

impl<W: AsyncWrite + Unpin> ProgressWriter<W> {
    pub fn new(inner: W, bar: ProgressBar, total: Option<u64>) -> Self {
        Self { inner, bar, progress: Progress::new(total), started: Instant::now() }
    }

    /// Account for bytes already on disk, so a resumed transfer reports its
    /// percentage against the full size.
    pub fn set_initial_progress(&mut self, bytes: u64) {
        self.progress.initial_bytes = bytes;
        self.bar.set_position(bytes);
        self.bar.reset_eta();
    }

    pub async fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        self.inner.write_all(buf).await?;
        self.progress.written_bytes += buf.len() as u64;
        self.bar.inc(buf.len() as u64);
        Ok(())
    }

    pub async fn flush(&mut self) -> io::Result<()> {
        self.inner.flush().await
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    /// Leave the line with the average rate and elapsed time.
    pub fn finish(self) -> Progress {
        self.bar.finish_with_message(self.progress.summary(self.started.elapsed()));
        self.progress
    }

    /// Leave the line as is, for an interrupted attempt.
    pub fn abandon(self) -> Progress {
        self.bar.abandon();
        self.progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_parse() {
        assert!(BAR_TEMPLATE.is_some());
        assert!(SPINNER_TEMPLATE.is_some());
    }

    #[test]
    fn test_hidden_hub_hands_out_hidden_bars() {
        let hub = ProgressHub::hidden();
        assert!(hub.bar("a.txt", Some(10)).is_hidden());
        assert!(hub.bar("b.txt", None).is_hidden());
    }

    #[tokio::test]
    async fn test_writer_counts_resumed_bytes() {
        let mut writer = ProgressWriter::new(Vec::new(), ProgressBar::hidden(), Some(10));
        writer.set_initial_progress(4);
        writer.write(b"abc").await.unwrap();
        writer.write(b"def").await.unwrap();
        writer.flush().await.unwrap();

        assert_eq!(writer.progress().current_bytes(), 10);
        assert_eq!(writer.progress().percentage(), Some(100.0));
        let progress = writer.finish();
        assert_eq!(progress.written_bytes, 6);
    }

    #[tokio::test]
    async fn test_writer_unknown_total() {
        let mut writer = ProgressWriter::new(Vec::new(), ProgressBar::hidden(), None);
        writer.write(b"xyz").await.unwrap();
        assert_eq!(writer.progress().percentage(), None);
        assert_eq!(writer.abandon().current_bytes(), 3);
    }
}
