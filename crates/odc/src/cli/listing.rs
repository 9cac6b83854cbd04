use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use clap::{Args, ValueEnum};
use odc_fetch::{DirEntry, MountSource};
use serde_json::{Value, json};

use super::Global;
use crate::config::Overrides;
use crate::printer;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args, Clone, Debug)]
pub struct ListArg {
    /// Directory in the EOS namespace, e.g. /eos/opendata/cms/Run2010B
    pub path: String,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Give up after this many seconds; 0 waits forever
    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Output format
    #[arg(short = 'm', long, value_enum, default_value_t = ListFormat::Text)]
    pub format: ListFormat,

    /// Local mount point of the XRootD namespace
    #[arg(long)]
    pub xrootd_mount: Option<PathBuf>,
}

impl ListArg {
    pub async fn run(self, global: Global) -> Result<ExitCode> {
        let settings = global.settings(Overrides {
            xrootd_mount: self.xrootd_mount.clone(),
            ..Overrides::default()
        });
        let mount = settings
            .xrootd_mount
            .map(MountSource::new)
            .context("Directories are listed from a local mount; pass --xrootd-mount or set xrootd_mount in the config")?;

        let listing = mount.list(&self.path, self.recursive);
        let entries = if self.timeout > 0 {
            tokio::time::timeout(Duration::from_secs(self.timeout), listing)
                .await
                .map_err(|_| anyhow!("Listing {} timed out after {}s", self.path, self.timeout))?
        } else {
            listing.await
        }
        .context("Failed to list directory")?;

        match self.format {
            ListFormat::Text => {
                for entry in &entries {
                    printer::output(entry_line(entry, global.verbose));
                }
            }
            ListFormat::Json => printer::output(format!("{:#}", entries_json(&entries, global.verbose))),
        }
        Ok(ExitCode::SUCCESS)
    }
}

fn mod_time(entry: &DirEntry) -> String {
    entry
        .modified
        .map(|t| DateTime::<Utc>::from(t).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

fn entry_line(entry: &DirEntry, verbose: bool) -> String {
    if verbose {
        format!("{}\t{}\t{}", entry.display_name(), entry.size, mod_time(entry))
    } else {
        entry.display_name()
    }
}

/// Size and time are only included in verbose mode.
fn entries_json(entries: &[DirEntry], verbose: bool) -> Value {
    Value::Array(
        entries
            .iter()
            .map(|entry| {
                let mut object = json!({ "name": entry.name, "is_dir": entry.is_dir });
                if verbose {
                    object["size"] = json!(entry.size);
                    object["mod_time"] = json!(mod_time(entry));
                }
                object
            })
            .collect(),
    )
}
