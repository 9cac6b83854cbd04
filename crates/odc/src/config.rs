//! Settings layered from built-in defaults, a TOML file and the command line.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use odc_catalog::SERVER_HTTP_URI;

const DEFAULT_RETRY_LIMIT: u32 = 10;
const DEFAULT_RETRY_SLEEP: u64 = 5;

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub server: Option<String>,
    pub retry_limit: Option<u32>,
    /// Seconds.
    pub retry_sleep: Option<u64>,
    pub xrootd_mount: Option<PathBuf>,
}

impl FileConfig {
    /// Read `explicit` if given, otherwise the default location if it exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::read(path),
            None => match default_path().filter(|p| p.is_file()) {
                Some(path) => Self::read(&path),
                None => Ok(Self::default()),
            },
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("Invalid config {}", path.display()))
    }
}

/// `~/.config/odc/config.toml`.
pub fn default_path() -> Option<PathBuf> {
    home::home_dir().map(|h| h.join(".config").join("odc").join("config.toml"))
}

/// Command-line values that override the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub server: Option<String>,
    pub retry_limit: Option<u32>,
    pub retry_sleep: Option<u64>,
    pub xrootd_mount: Option<PathBuf>,
}

/// Effective settings of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server: String,
    pub retry_limit: u32,
    pub retry_sleep: Duration,
    pub xrootd_mount: Option<PathBuf>,
}

impl Settings {
    pub fn resolve(file: FileConfig, cli: Overrides) -> Self {
        Self {
            server: cli
                .server
                .or(file.server)
                .unwrap_or_else(|| SERVER_HTTP_URI.to_string()),
            retry_limit: cli.retry_limit.or(file.retry_limit).unwrap_or(DEFAULT_RETRY_LIMIT),
            retry_sleep: Duration::from_secs(
                cli.retry_sleep.or(file.retry_sleep).unwrap_or(DEFAULT_RETRY_SLEEP),
            ),
            xrootd_mount: cli.xrootd_mount.or(file.xrootd_mount),
        }
    }
}
