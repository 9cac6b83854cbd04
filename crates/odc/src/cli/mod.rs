//! Command-line interface.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use odc_catalog::{
    Availability, CatalogClient, CatalogFile, Record, RecordSelector,
    filter_by_availability, has_offline_files,
};
use odc_fetch::core::filter;
use odc_fetch::{CancellationToken, Manifest, ManifestSlot, VerificationReport};
use regex::Regex;

use crate::config::{FileConfig, Overrides, Settings};
use crate::printer;

pub mod app;
mod completions;
mod download;
mod listing;
mod locations;
mod metadata;
mod verify;

/// Process-wide inputs shared by every command.
#[derive(Debug, Clone)]
pub struct Global {
    pub file: FileConfig,
    pub server: Option<String>,
    pub verbose: bool,
}

impl Global {
    pub fn settings(&self, overrides: Overrides) -> Settings {
        let overrides = Overrides { server: self.server.clone(), ..overrides };
        Settings::resolve(self.file.clone(), overrides)
    }
}

#[derive(Args, Clone, Debug)]
#[group(required = true, multiple = false)]
pub struct RecordArg {
    /// Record ID (exact match)
    #[arg(short = 'R', long)]
    pub recid: Option<u64>,
    /// Digital Object Identifier (exact match)
    #[arg(short, long)]
    pub doi: Option<String>,
    /// Record title (exact match, no wildcards)
    #[arg(short, long)]
    pub title: Option<String>,
}

impl RecordArg {
    pub fn selector(&self) -> RecordSelector {
        RecordSelector { recid: self.recid, doi: self.doi.clone(), title: self.title.clone() }
    }
}

#[derive(Args, Clone, Debug, Default)]
pub struct FilterArg {
    /// Only files with these names; comma separated, glob patterns allowed
    #[arg(short = 'n', long, value_delimiter = ',')]
    pub filter_name: Vec<String>,
    /// Only files whose name matches this regular expression
    #[arg(short = 'e', long)]
    pub filter_regexp: Option<Regex>,
}

impl FilterArg {
    pub fn apply(&self, manifest: Manifest) -> Result<Manifest> {
        let manifest = if self.filter_name.is_empty() {
            manifest
        } else {
            filter::by_names(&manifest, &self.filter_name)?
        };
        Ok(match &self.filter_regexp {
            Some(regex) => filter::by_regex(&manifest, regex),
            None => manifest,
        })
    }
}

/// Resolve the selected record and fetch it.
pub async fn fetch_record(client: &CatalogClient, record: &RecordArg) -> Result<(u64, Record)> {
    let recid = client
        .resolve_recid(&record.selector())
        .await
        .context("Failed to find record")?;
    let record = client.get_record(recid).await.context("Failed to get record")?;
    Ok((recid, record))
}

/// Catalog files as a download manifest; bad entries become malformed slots.
pub fn manifest_from(files: &[CatalogFile]) -> Manifest {
    files
        .iter()
        .enumerate()
        .map(|(index, f)| match &f.problem {
            Some(problem) => ManifestSlot::Malformed { index, reason: format!("entry {index}: {problem}") },
            None => ManifestSlot::from_parts(index, &f.uri, f.size, f.checksum.as_deref()),
        })
        .collect()
}

/// Apply the availability choice; by default tape files are dropped with a warning.
pub fn select_available(
    files: Vec<CatalogFile>,
    availability: Option<Availability>,
    recid: u64,
) -> Vec<CatalogFile> {
    match availability {
        Some(availability) => filter_by_availability(files, availability),
        None if has_offline_files(&files) => {
            printer::warning("Some files are stored on tape and will be skipped.");
            printer::warning(&format!(
                "Visit https://opendata.cern.ch/record/{recid} to request file staging."
            ));
            printer::warning("Use '--file-availability all' to force attempting to download all files.");
            filter_by_availability(files, Availability::Online)
        }
        None => files,
    }
}

pub fn default_dir(dir: Option<PathBuf>, recid: u64) -> PathBuf {
    dir.unwrap_or_else(|| PathBuf::from(recid.to_string()))
}

/// Cancel `token` on Ctrl-C.
pub fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, stopping after the current chunk");
            token.cancel();
        }
    });
}

/// Verification reads whole files; keep it off the async workers.
pub async fn verify_blocking(dir: PathBuf, manifest: Manifest) -> Result<VerificationReport> {
    tokio::task::spawn_blocking(move || odc_fetch::verify(&dir, &manifest))
        .await
        .context("Verification task failed")
}

/// One line per verified file, then the summary.
pub fn print_verification(report: &VerificationReport) {
    for result in &report.results {
        let line = result.to_string();
        if result.is_verified() {
            printer::info(&line);
        } else {
            printer::error(&line);
        }
    }
    printer::output("");
    printer::output(report.stats);
}

pub fn exit_code(success: bool) -> ExitCode {
    if success {
        printer::info("Success!");
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(uri: &str, size: i64, checksum: Option<&str>) -> CatalogFile {
        CatalogFile {
            checksum: checksum.map(str::to_string),
            availability: Some("online".into()),
            ..CatalogFile::new(uri, size)
        }
    }

    #[test]
    fn test_manifest_from_catalog_files() {
        let manifest = manifest_from(&[
            file("http://x/a.root", 10, Some("adler32:0000000a")),
            file("http://x/idx.json", 300, None),
            file("http://x/neg.root", -1, None),
            file("http://x/bad.root", 1, Some("md5:zz")),
            CatalogFile { problem: Some("file entry has no uri".into()), ..file("", 0, None) },
        ]);

        assert_eq!(manifest.len(), 5);
        assert_eq!(manifest.entries().count(), 2);
        assert!(matches!(manifest.slots()[2], ManifestSlot::Malformed { index: 2, .. }));
        assert!(matches!(manifest.slots()[3], ManifestSlot::Malformed { index: 3, .. }));
        assert_eq!(
            manifest.slots()[4],
            ManifestSlot::Malformed { index: 4, reason: "entry 4: file entry has no uri".into() }
        );
    }

    #[tokio::test]
    async fn test_malformed_catalog_entry_is_skipped_by_the_batch() {
        use odc_catalog::{Protocol, list_files};
        use odc_fetch::{BatchOptions, BatchRunner, HttpSource};
        use serde_json::json;

        let record: Record = serde_json::from_value(json!({
            "metadata": {
                "recid": 1,
                "files": [
                    {"uri": "root://eospublic.cern.ch//eos/a.txt", "size": 1},
                    {"size": 3},
                    {"uri": "root://eospublic.cern.ch//eos/c.txt", "size": 5}
                ]
            }
        }))
        .unwrap();
        let files = list_files(&record, "http://opendata.cern.ch", Protocol::Http, true).unwrap();
        let manifest = manifest_from(&files);

        let dir = tempfile::tempdir().unwrap();
        let runner = BatchRunner::new(HttpSource::new().unwrap(), BatchOptions::new(dir.path()).dry_run(true));
        let stats = runner.run(&manifest, &CancellationToken::new()).await.unwrap();

        assert_eq!(stats.total_files, 3);
        assert_eq!(stats.downloaded_files, 2);
        assert_eq!(stats.downloaded_bytes, 6);
        assert_eq!(stats.skipped_files, 1);
        assert_eq!(stats.failed_files, 0);
    }

    #[test]
    fn test_filters_combine() {
        let manifest = manifest_from(&[
            file("http://x/a.py", 1, None),
            file("http://x/b.root", 1, None),
            file("http://x/c.py", 1, None),
        ]);
        let filters = FilterArg {
            filter_name: vec!["a.py".into(), "c.py".into()],
            filter_regexp: Some(Regex::new("^c").unwrap()),
        };

        let selected = filters.apply(manifest.clone()).unwrap();
        let names: Vec<_> = selected.entries().map(|e| e.file_name()).collect();
        assert_eq!(names, ["c.py"]);

        assert_eq!(FilterArg::default().apply(manifest.clone()).unwrap(), manifest);
    }

    #[test]
    fn test_select_available() {
        let mut tape = file("http://x/t.root", 1, None);
        tape.availability = Some("on demand".into());
        let files = vec![file("http://x/a.root", 1, None), tape];

        assert_eq!(select_available(files.clone(), Some(Availability::All), 1).len(), 2);
        assert_eq!(select_available(files.clone(), Some(Availability::Online), 1).len(), 1);
        assert_eq!(select_available(files, None, 1).len(), 1);
    }

    #[test]
    fn test_default_dir_is_recid() {
        assert_eq!(default_dir(None, 5500), PathBuf::from("5500"));
        assert_eq!(default_dir(Some("out".into()), 5500), PathBuf::from("out"));
    }
}
