//! The catalog checksum notation and file-level helpers.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use std::str::FromStr;

use crate::{Adler32Hasher, HashingReader, Result, VerificationError};

/// Checksum algorithms understood by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Adler32,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Adler32 => "adler32",
        }
    }

    /// Digest length in bytes.
    pub fn digest_length(&self) -> usize {
        match self {
            Algorithm::Adler32 => 4,
        }
    }
}

impl FromStr for Algorithm {
    type Err = VerificationError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "adler32" => Ok(Algorithm::Adler32),
            other => Err(VerificationError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// A digest tagged with its algorithm, written as `adler32:0a1b2c3d`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum {
    algorithm: Algorithm,
    digest: Vec<u8>,
}

impl Checksum {
    pub fn adler32(digest: Vec<u8>) -> Self {
        Self { algorithm: Algorithm::Adler32, digest }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn digest(&self) -> &[u8] {
        &self.digest
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm.as_str(), hex::encode(&self.digest))
    }
}

impl FromStr for Checksum {
    type Err = VerificationError;

    fn from_str(s: &str) -> Result<Self> {
        let (algorithm, digest) = s
            .split_once(':')
            .ok_or_else(|| VerificationError::Malformed(s.to_string()))?;
        let algorithm: Algorithm = algorithm.parse()?;

        if digest.len() != algorithm.digest_length() * 2 {
            return Err(VerificationError::Malformed(s.to_string()));
        }
        let digest = hex::decode(digest).map_err(|_| VerificationError::Malformed(s.to_string()))?;

        Ok(Self { algorithm, digest })
    }
}

/// Compute the catalog checksum of a local file, reading it once.
pub fn checksum_file(path: impl AsRef<Path>) -> Result<Checksum> {
    measure_file(path).map(|(_, checksum)| checksum)
}

/// Size and checksum of a local file from a single read.
///
/// The size is what was actually read, so a file that changes while it is
/// measured yields a pair that describes the same bytes.
pub fn measure_file(path: impl AsRef<Path>) -> Result<(u64, Checksum)> {
    let file = File::open(path)?;
    let mut reader = HashingReader::new(BufReader::new(file), Adler32Hasher::new());
    io::copy(&mut reader, &mut io::sink())?;
    let size = reader.bytes_read();
    Ok((size, Checksum::adler32(reader.finish()?)))
}
