use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("no record found with {field}: {value}")]
    NotFound { field: &'static str, value: String },

    #[error("more than one record found with {field}: {value}")]
    Ambiguous { field: &'static str, value: String },

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("please provide recid, doi, or title")]
    MissingSelector,

    #[error("unknown protocol '{0}' (choose from 'http', 'https', 'xrootd')")]
    UnknownProtocol(String),

    #[error("invalid file availability '{0}' (choose from 'online', 'all')")]
    UnknownAvailability(String),

    #[error("field '{0}' not found")]
    FieldNotFound(String),

    #[error("invalid filter '{0}': expected 'field=value'")]
    InvalidFilter(String),

    #[error("cannot filter {0}: items must be objects")]
    NotFilterable(String),

    #[error("unknown format '{0}' (choose from 'pretty', 'json')")]
    UnknownFormat(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
