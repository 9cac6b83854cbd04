//! Content checksums for catalog files.
//!
//! The catalog publishes an Adler-32 digest for every file as
//! `adler32:<8 lowercase hex digits>`. This crate computes the same value for
//! local files so downloads can be checked against the catalog.
//!
//! # Key Features
//!
//! - **Incremental**: [`Hasher`] digests data as it streams through
//! - **Single pass**: [`HashingReader`] hashes while another consumer reads
//! - **Exact format**: [`Checksum`] renders and parses the catalog notation
//!
//! # Example
//!
//! ```
//! use odc_verify::{Adler32Hasher, Checksum, Hasher};
//!
//! let mut hasher = Adler32Hasher::new();
//! hasher.update(b"Wikipedia");
//! let checksum = Checksum::adler32(hasher.finalize());
//!
//! assert_eq!(checksum.to_string(), "adler32:11e60398");
//! assert_eq!("adler32:11e60398".parse::<Checksum>().unwrap(), checksum);
//! ```

pub use self::checksum::{Algorithm, Checksum, checksum_file, measure_file};
pub use self::error::{Result, VerificationError};
pub use self::hasher::{Adler32Hasher, Hasher};
pub use self::reader::HashingReader;

mod checksum;
mod error;
mod hasher;
mod reader;
