use crate::data::VerificationOutcome;

/// How a source answered a request for bytes starting at some offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeResponse {
    /// `206 Partial Content`: the range was honoured.
    Partial,
    /// `200 OK`: the full body follows, whatever was asked for.
    Full,
}

/// Classify a transfer response status.
///
/// Returns `None` for anything that does not carry file content.
///
/// # Examples
///
/// ```
/// use odc_fetch::core::{classify_status, RangeResponse};
///
/// assert_eq!(classify_status(206), Some(RangeResponse::Partial));
/// assert_eq!(classify_status(200), Some(RangeResponse::Full));
/// assert_eq!(classify_status(404), None);
/// ```
pub fn classify_status(status: u16) -> Option<RangeResponse> {
    match status {
        206 => Some(RangeResponse::Partial),
        200 => Some(RangeResponse::Full),
        _ => None,
    }
}

/// Offset the response body actually starts at.
pub fn resume_offset(requested: u64, response: RangeResponse) -> u64 {
    match response {
        RangeResponse::Partial => requested,
        RangeResponse::Full => 0,
    }
}

/// `Range` header value for an open-ended request from `offset`; none for 0.
pub fn range_header(offset: u64) -> Option<String> {
    (offset > 0).then(|| format!("bytes={offset}-"))
}

/// Bucket a file from its existence and the two independent comparisons.
///
/// A size failure wins over a checksum failure so that every file counts once.
pub fn classify_verification(
    exists: bool,
    size_match: bool,
    checksum_match: bool,
) -> VerificationOutcome {
    match (exists, size_match, checksum_match) {
        (false, _, _) => VerificationOutcome::Missing,
        (true, false, _) => VerificationOutcome::SizeMismatch,
        (true, true, false) => VerificationOutcome::ChecksumMismatch,
        (true, true, true) => VerificationOutcome::Verified,
    }
}
