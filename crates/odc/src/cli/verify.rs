use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Result, bail};
use clap::Args;
use odc_catalog::{CatalogClient, Protocol};

use super::{
    FilterArg, Global, RecordArg, default_dir, exit_code, fetch_record, manifest_from,
    print_verification, verify_blocking,
};
use crate::config::Overrides;
use crate::printer;

#[derive(Args, Clone, Debug)]
pub struct VerifyArg {
    #[command(flatten)]
    pub record: RecordArg,

    /// Directory holding the downloaded files [default: the record id]
    #[arg(short, long)]
    pub input_dir: Option<PathBuf>,

    #[command(flatten)]
    pub filter: FilterArg,

    /// Verify file index files instead of the files they describe
    #[arg(long)]
    pub no_expand: bool,
}

impl VerifyArg {
    pub async fn run(self, global: Global) -> Result<ExitCode> {
        let settings = global.settings(Overrides::default());
        let client = CatalogClient::new(&settings.server)?;
        let (recid, record) = fetch_record(&client, &self.record).await?;
        let dir = default_dir(self.input_dir, recid);

        let files = client.files(&record, Protocol::Http, !self.no_expand)?;
        let manifest = self.filter.apply(manifest_from(&files))?;
        if manifest.is_empty() {
            bail!("No files matching filters");
        }

        printer::info(&format!("Verifying number of files for record {recid}..."));
        let report = verify_blocking(dir, manifest).await?;
        let stats = report.stats;
        printer::note(&format!("Expected {}, found {}", stats.total_files, stats.found_files()));

        print_verification(&report);
        Ok(exit_code(stats.is_success()))
    }
}
