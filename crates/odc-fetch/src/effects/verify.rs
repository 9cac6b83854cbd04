use std::path::Path;

use tracing::{debug, warn};

use crate::core::classify_verification;
use crate::data::{
    Manifest, ManifestEntry, ManifestSlot, VerificationOutcome, VerificationReport,
    VerificationResult, VerificationStats,
};

/// Recompute size and checksum of every manifest file under `local_dir`.
///
/// Sizes reported by the transfer engine are never trusted; everything is
/// read back from disk. Every slot lands in exactly one bucket, so
/// `stats.classified_files() == manifest.len()`.
///
/// This reads whole files synchronously; call it from a blocking context.
pub fn verify(local_dir: &Path, manifest: &Manifest) -> VerificationReport {
    let mut stats = VerificationStats { total_files: manifest.len() as u64, ..Default::default() };
    let mut results = Vec::with_capacity(manifest.len());

    for slot in manifest.slots() {
        match slot {
            ManifestSlot::Entry(entry) => {
                let result = verify_entry(local_dir, entry);
                debug!(path = %result.path.display(), outcome = ?result.outcome, "verified");
                stats.record(result.outcome);
                results.push(result);
            }
            ManifestSlot::Malformed { index, .. } => {
                warn!(index, "malformed manifest entry counted as missing");
                stats.record(VerificationOutcome::Missing);
            }
        }
    }

    VerificationReport { results, stats }
}

fn verify_entry(local_dir: &Path, entry: &ManifestEntry) -> VerificationResult {
    let path = entry.local_path(local_dir);
    let mut result = VerificationResult {
        path,
        exists: false,
        expected_size: entry.size,
        actual_size: None,
        expected_checksum: entry.checksum.clone(),
        actual_checksum: None,
        size_match: false,
        checksum_match: false,
        outcome: VerificationOutcome::Missing,
    };

    if !result.path.is_file() {
        return result;
    }

    let (size, checksum) = match odc_verify::measure_file(&result.path) {
        Ok(measured) => measured,
        Err(err) => {
            warn!(path = %result.path.display(), error = %err, "cannot read file");
            return result;
        }
    };

    result.exists = true;
    result.size_match = size == entry.size;
    result.checksum_match = entry.checksum.as_ref() == Some(&checksum);
    result.actual_size = Some(size);
    result.actual_checksum = Some(checksum);
    result.outcome = classify_verification(true, result.size_match, result.checksum_match);
    result
}
