//! Pure transformations used by the transfer engine and the CLI.
//!
//! Nothing in here performs I/O: retry timing, HTTP status classification,
//! verification bucketing and manifest filters.

pub mod filter;
mod retry;
mod validation;

pub use filter::{by_names, by_ranges, by_regex, parse_ranges};
pub use retry::{RetryPolicy, retry_delay};
pub use validation::{
    RangeResponse, classify_status, classify_verification, range_header, resume_offset,
};
