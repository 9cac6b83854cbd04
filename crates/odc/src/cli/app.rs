use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::{Global, completions, download, listing, locations, metadata, verify};
use crate::config::FileConfig;

#[derive(Clone, Debug, Parser)]
#[command(name = "odc", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
pub struct App {
    #[command(subcommand)]
    pub cmd: Commands,

    /// Which CERN Open Data server to query [default: http://opendata.cern.ch]
    #[arg(short, long, global = true, env = "ODC_SERVER")]
    pub server: Option<String>,

    /// Configuration file [default: ~/.config/odc/config.toml]
    #[arg(long, global = true, env = "ODC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Debug logging, progress lines and extended listings
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// List the file locations of a record
    #[command(alias = "ls", name = "get-file-locations")]
    GetFileLocations(locations::LocationsArg),
    /// Download the files of a record
    #[command(alias = "dl", name = "download-files")]
    DownloadFiles(download::DownloadArg),
    /// Check downloaded files against catalog sizes and checksums
    #[command(name = "verify-files")]
    VerifyFiles(verify::VerifyArg),
    /// Print the metadata of a record, or one field of it
    #[command(name = "get-metadata")]
    GetMetadata(metadata::MetadataArg),
    /// List a directory of the EOS namespace through a local XRootD mount
    #[command(name = "list-directory")]
    ListDirectory(listing::ListArg),
    /// Print shell completions
    #[command(name = "completions")]
    Completions(completions::CompletionsArg),
}

impl App {
    pub async fn run(self) -> Result<ExitCode> {
        if let Commands::Completions(arg) = self.cmd {
            return arg.run();
        }

        let global = Global {
            file: FileConfig::load(self.config.as_deref())?,
            server: self.server,
            verbose: self.verbose,
        };
        match self.cmd {
            Commands::GetFileLocations(arg) => arg.run(global).await,
            Commands::DownloadFiles(arg) => arg.run(global).await,
            Commands::VerifyFiles(arg) => arg.run(global).await,
            Commands::GetMetadata(arg) => arg.run(global).await,
            Commands::ListDirectory(arg) => arg.run(global).await,
            Commands::Completions(arg) => arg.run(),
        }
    }
}
