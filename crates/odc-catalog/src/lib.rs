//! Client for the CERN Open Data catalog.
//!
//! Resolves a record from its id, DOI or title, lists the files that
//! belong to it with locations rewritten for the requested protocol, and
//! extracts metadata fields by dotted path.
//!
//! ```
//! use odc_catalog::{Protocol, convert_uri};
//!
//! let uri = convert_uri(
//!     "root://eospublic.cern.ch//eos/opendata/cms/a.root",
//!     "http://opendata.cern.ch",
//!     Protocol::Http,
//! );
//! assert_eq!(uri, "http://opendata.cern.ch/eos/opendata/cms/a.root");
//! ```

mod client;
mod error;
mod files;
mod metadata;
mod record;

pub use client::CatalogClient;
pub use error::{CatalogError, Result};
pub use files::{convert_uri, filter_by_availability, has_offline_files, list_files};
pub use metadata::{FieldFilter, OutputFormat, extract_field, filter_items};
pub use record::{Availability, CatalogFile, Protocol, Record, RecordSelector};

/// Default catalog server.
pub const SERVER_HTTP_URI: &str = "http://opendata.cern.ch";

/// Public HTTPS front end; `https` links always point here.
pub const SERVER_HTTPS_URI: &str = "https://opendata.cern.ch";

/// XRootD root under which the catalog stores file locations.
pub const SERVER_ROOT_URI: &str = "root://eospublic.cern.ch//";
