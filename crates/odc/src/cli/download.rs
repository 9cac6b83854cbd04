use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Args;
use odc_catalog::{Availability, CatalogClient, Protocol};
use odc_fetch::core::filter;
use odc_fetch::{
    BatchError, BatchOptions, BatchRunner, CancellationToken, HttpSource, MountSource,
    SourceRouter, TransferOptions,
};

use super::{
    FilterArg, Global, RecordArg, cancel_on_ctrl_c, default_dir, exit_code, fetch_record,
    manifest_from, print_verification, select_available, verify_blocking,
};
use crate::config::Overrides;
use crate::printer;

const EXIT_INTERRUPTED: u8 = 130;

#[derive(Args, Clone, Debug)]
pub struct DownloadArg {
    #[command(flatten)]
    pub record: RecordArg,

    /// Output directory [default: the record id]
    #[arg(short = 'O', long)]
    pub output_dir: Option<PathBuf>,

    #[command(flatten)]
    pub filter: FilterArg,

    /// Only files at these 1-based positions, e.g. 1-2,5-7
    #[arg(short = 'r', long)]
    pub filter_range: Option<String>,

    /// Download file index files instead of the files they describe
    #[arg(long)]
    pub no_expand: bool,

    /// Attempts per file [default: 10]
    #[arg(short = 'y', long)]
    pub retry_limit: Option<u32>,

    /// Seconds to wait before retrying a file [default: 5]
    #[arg(short = 'Y', long)]
    pub retry_sleep: Option<u64>,

    /// Files downloaded at the same time
    #[arg(short, long, default_value_t = 1)]
    pub jobs: usize,

    /// Show what would be downloaded without touching the network or disk
    #[arg(short = 'N', long)]
    pub dry_run: bool,

    /// Verify sizes and checksums once downloads are done
    #[arg(short = 'V', long)]
    pub verify: bool,

    /// Show a progress line per file
    #[arg(short = 'P', long)]
    pub progress: bool,

    /// Protocol to be used in links [http, https, xrootd]
    #[arg(short, long)]
    pub protocol: Option<Protocol>,

    /// Local mount point of the XRootD namespace, used for root:// links
    #[arg(long)]
    pub xrootd_mount: Option<PathBuf>,

    /// Filter files by their availability status [online, all]
    #[arg(long)]
    pub file_availability: Option<Availability>,
}

impl DownloadArg {
    pub async fn run(self, global: Global) -> Result<ExitCode> {
        let settings = global.settings(Overrides {
            retry_limit: self.retry_limit,
            retry_sleep: self.retry_sleep,
            xrootd_mount: self.xrootd_mount.clone(),
            ..Overrides::default()
        });
        let client = CatalogClient::new(&settings.server)?;
        let (recid, record) = fetch_record(&client, &self.record).await?;
        let dest = default_dir(self.output_dir.clone(), recid);

        let protocol = self.protocol.unwrap_or_default();
        let expand = !self.no_expand;
        let files = client.files(&record, protocol, expand)?;
        let listed = files.len();
        let files = if expand {
            select_available(files, self.file_availability, recid)
        } else {
            files
        };
        let on_tape = listed - files.len();

        let mut manifest = self.filter.apply(manifest_from(&files))?;
        if let Some(ranges) = &self.filter_range {
            let ranges = filter::parse_ranges(ranges).context("Invalid range filter")?;
            manifest = filter::by_ranges(&manifest, &ranges);
        }
        if manifest.is_empty() {
            bail!("No files matching filters");
        }

        let mut source = SourceRouter::new(HttpSource::new()?);
        match &settings.xrootd_mount {
            Some(mount) => source = source.with_mount(MountSource::new(mount)),
            None if protocol == Protocol::Xrootd => {
                bail!("root:// links are read from a local mount; pass --xrootd-mount or set xrootd_mount in the config")
            }
            None => {}
        }

        let options = BatchOptions::new(&dest)
            .dry_run(self.dry_run)
            .jobs(self.jobs)
            .transfer(
                TransferOptions::default()
                    .retry_limit(settings.retry_limit)
                    .retry_sleep(settings.retry_sleep)
                    .show_progress(self.progress || global.verbose),
            );
        let runner = BatchRunner::new(source, options);

        let cancel = CancellationToken::new();
        cancel_on_ctrl_c(cancel.clone());

        printer::info(&format!(
            "Downloading {} files ({} bytes) of record {recid} into {}",
            manifest.len(),
            manifest.expected_bytes(),
            dest.display()
        ));
        let stats = match runner.run(&manifest, &cancel).await {
            Ok(stats) => stats,
            Err(BatchError::Cancelled { stats }) => {
                printer::output("");
                printer::output(stats);
                printer::warning("Download interrupted; partial files are kept and resume on the next run.");
                return Ok(ExitCode::from(EXIT_INTERRUPTED));
            }
            Err(err) => return Err(err.into()),
        };

        printer::output("");
        printer::output(stats);
        if on_tape > 0 {
            printer::note(&format!("Files skipped (on tape): {on_tape}"));
        }

        let mut success = stats.all_succeeded();
        if self.verify && !self.dry_run {
            printer::info("Verifying downloaded files...");
            let report = verify_blocking(dest, manifest).await?;
            print_verification(&report);
            if !report.stats.is_success() {
                printer::error("Some files failed verification");
                success = false;
            }
        }

        Ok(exit_code(success))
    }
}
