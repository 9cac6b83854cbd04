use std::fmt;
use std::path::PathBuf;

use odc_verify::Checksum;

/// Terminal bucket of a verified file. Every file lands in exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    Verified,
    /// Size differs. Takes precedence when the checksum differs as well.
    SizeMismatch,
    ChecksumMismatch,
    Missing,
}

/// Expected versus recomputed properties of one local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub path: PathBuf,
    pub exists: bool,
    pub expected_size: u64,
    pub actual_size: Option<u64>,
    pub expected_checksum: Option<Checksum>,
    pub actual_checksum: Option<Checksum>,
    pub size_match: bool,
    pub checksum_match: bool,
    pub outcome: VerificationOutcome,
}

impl VerificationResult {
    pub fn is_verified(&self) -> bool {
        self.outcome == VerificationOutcome::Verified
    }
}

/// One line per file, naming what was wrong with it.
impl fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.path.display();
        match self.outcome {
            VerificationOutcome::Verified => write!(f, "Verified: {path}"),
            VerificationOutcome::Missing => write!(f, "File not found: {path}"),
            VerificationOutcome::SizeMismatch => write!(
                f,
                "Size mismatch: {path} (expected: {}, actual: {})",
                self.expected_size,
                self.actual_size.unwrap_or_default()
            ),
            VerificationOutcome::ChecksumMismatch => {
                write!(f, "Checksum mismatch: {path} (expected: ")?;
                match &self.expected_checksum {
                    Some(checksum) => write!(f, "{checksum}")?,
                    None => f.write_str("none")?,
                }
                f.write_str(", actual: ")?;
                match &self.actual_checksum {
                    Some(checksum) => write!(f, "{checksum})"),
                    None => f.write_str("none)"),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VerificationStats {
    pub total_files: u64,
    pub verified_files: u64,
    pub size_failed: u64,
    pub checksum_failed: u64,
    pub missing_files: u64,
}

impl VerificationStats {
    pub fn record(&mut self, outcome: VerificationOutcome) {
        match outcome {
            VerificationOutcome::Verified => self.verified_files += 1,
            VerificationOutcome::SizeMismatch => self.size_failed += 1,
            VerificationOutcome::ChecksumMismatch => self.checksum_failed += 1,
            VerificationOutcome::Missing => self.missing_files += 1,
        }
    }

    /// Sum of all buckets; equals `total_files` once a run is complete.
    pub fn classified_files(&self) -> u64 {
        self.verified_files + self.size_failed + self.checksum_failed + self.missing_files
    }

    /// Files that were present on disk, whatever their state.
    pub fn found_files(&self) -> u64 {
        self.total_files - self.missing_files
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.size_failed + self.checksum_failed + self.missing_files == 0
    }
}

impl fmt::Display for VerificationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Verification summary:")?;
        writeln!(f, "  Total files:     {}", self.total_files)?;
        writeln!(f, "  Verified:        {}", self.verified_files)?;
        writeln!(f, "  Size errors:     {}", self.size_failed)?;
        writeln!(f, "  Checksum errors: {}", self.checksum_failed)?;
        write!(f, "  Missing files:   {}", self.missing_files)
    }
}

/// Per-file results in manifest order, plus the aggregate counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    pub results: Vec<VerificationResult>,
    pub stats: VerificationStats,
}
