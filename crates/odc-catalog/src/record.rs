use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{CatalogError, Result};
use crate::files::json_int;

/// A catalog record as returned by `/api/records/{recid}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Record {
    pub metadata: Map<String, Value>,
}

impl Record {
    /// The numeric record id stored in the metadata.
    pub fn recid(&self) -> Result<u64> {
        let value = self
            .metadata
            .get("recid")
            .ok_or_else(|| CatalogError::InvalidRecord("metadata has no recid".into()))?;
        json_int(value)
            .and_then(|id| u64::try_from(id).ok())
            .ok_or_else(|| CatalogError::InvalidRecord(format!("recid {value} is not an integer")))
    }

    /// Drop storage bookkeeping that is of no use to clients.
    pub(crate) fn strip_internal_fields(&mut self) {
        self.metadata.remove("_files");

        if let Some(Value::Array(files)) = self.metadata.get_mut("files") {
            files.iter_mut().for_each(strip_file);
        }
        if let Some(Value::Array(indices)) = self.metadata.get_mut("_file_indices") {
            for index in indices.iter_mut().filter_map(Value::as_object_mut) {
                index.remove("bucket");
                if let Some(Value::Array(files)) = index.get_mut("files") {
                    files.iter_mut().for_each(strip_file);
                }
            }
        }
    }
}

fn strip_file(file: &mut Value) {
    if let Some(file) = file.as_object_mut() {
        file.remove("bucket");
        file.remove("version_id");
    }
}

/// How a record is identified on the command line.
///
/// An explicit record id wins over a DOI, which wins over a title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSelector {
    pub recid: Option<u64>,
    pub doi: Option<String>,
    pub title: Option<String>,
}

/// Link style for listed files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Protocol {
    #[default]
    Http,
    Https,
    Xrootd,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
            Protocol::Xrootd => "xrootd",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            "xrootd" | "root" => Ok(Protocol::Xrootd),
            _ => Err(CatalogError::UnknownProtocol(s.to_string())),
        }
    }
}

/// Which files to keep according to their storage state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Availability {
    /// Only files that can be read right away.
    Online,
    /// Everything, including files that must first be staged from tape.
    All,
}

impl FromStr for Availability {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "online" => Ok(Availability::Online),
            "all" => Ok(Availability::All),
            _ => Err(CatalogError::UnknownAvailability(s.to_string())),
        }
    }
}

/// One downloadable file of a record.
///
/// Fields are taken from the catalog as they are; validation happens when
/// a download manifest is built from them. An entry whose shape is unusable
/// is still listed, with `problem` saying what is wrong with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFile {
    pub uri: String,
    pub size: i64,
    pub checksum: Option<String>,
    /// `online`, `on demand`, ... ; unknown for unexpanded file indices.
    pub availability: Option<String>,
    pub problem: Option<String>,
}

impl CatalogFile {
    pub fn new(uri: impl Into<String>, size: i64) -> Self {
        Self { uri: uri.into(), size, checksum: None, availability: None, problem: None }
    }

    pub fn is_malformed(&self) -> bool {
        self.problem.is_some()
    }

    /// Stored on tape and not readable until staged.
    pub fn is_offline(&self) -> bool {
        self.availability.as_deref().is_some_and(|a| a != "online")
    }
}
