//! Error types for odc-fetch.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::data::BatchStats;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URI: {0}")]
    InvalidUri(String),

    #[error("unsupported URI scheme: {0}")]
    UnsupportedScheme(String),

    #[error("no remote filesystem mount configured for {0}")]
    NotMounted(String),

    #[error("server returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("file I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("transfer cancelled")]
    Cancelled,

    #[error("giving up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },

    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("invalid range filter: {0}")]
    InvalidRange(String),

    #[error("invalid name filter '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

impl FetchError {
    /// Returns `true` if another attempt at the same transfer may succeed.
    ///
    /// Every unexpected HTTP status counts, client errors included.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Http { .. } | FetchError::Request(_) | FetchError::Io(_))
    }
}

/// Errors that stop a whole batch rather than a single file.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("batch cancelled after {} of {} files", .stats.processed_files(), .stats.total_files)]
    Cancelled { stats: BatchStats },
}

pub type Result<T> = std::result::Result<T, FetchError>;
