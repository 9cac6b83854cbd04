use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use odc_catalog::{Availability, CatalogClient, Protocol, filter_by_availability, has_offline_files};

use super::{Global, RecordArg, fetch_record};
use crate::config::Overrides;
use crate::printer;

#[derive(Args, Clone, Debug)]
pub struct LocationsArg {
    #[command(flatten)]
    pub record: RecordArg,

    /// Protocol to be used in links [http, https, xrootd]
    #[arg(short, long)]
    pub protocol: Option<Protocol>,

    /// List file index files instead of the files they describe
    #[arg(long)]
    pub no_expand: bool,

    /// Filter files by their availability status [online, all]
    #[arg(long)]
    pub file_availability: Option<Availability>,
}

impl LocationsArg {
    pub async fn run(self, global: Global) -> Result<ExitCode> {
        let settings = global.settings(Overrides::default());
        let client = CatalogClient::new(&settings.server)?;
        let (_, record) = fetch_record(&client, &self.record).await?;

        let files = client.files(&record, self.protocol.unwrap_or_default(), !self.no_expand)?;
        let files = match self.file_availability {
            Some(availability) => filter_by_availability(files, availability),
            None => files,
        };
        if self.file_availability != Some(Availability::Online) && has_offline_files(&files) {
            printer::warning("Some files in the list are not online and may not be downloadable.");
            printer::warning("To list only online files, use the '--file-availability online' option.");
        }

        for file in &files {
            if let Some(problem) = &file.problem {
                printer::warning(&format!("Skipping catalog entry: {problem}"));
                continue;
            }
            if global.verbose {
                printer::output(format_args!(
                    "{}\t{}\t{}\t{}",
                    file.uri,
                    file.size,
                    file.checksum.as_deref().unwrap_or_default(),
                    file.availability.as_deref().unwrap_or_default()
                ));
            } else {
                printer::output(&file.uri);
            }
        }
        Ok(ExitCode::SUCCESS)
    }
}
