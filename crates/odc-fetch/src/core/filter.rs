//! Manifest selection by file name, regular expression or position.
//!
//! Every filter returns a new manifest that keeps the original order and
//! contains each slot at most once. Name based filters drop malformed slots
//! since they have no name to match.

use glob::Pattern;
use regex::Regex;

use crate::data::{Manifest, ManifestSlot};
use crate::error::{FetchError, Result};

/// Keep entries whose file name matches any of the glob `patterns`.
///
/// An empty pattern list keeps everything.
pub fn by_names<S: AsRef<str>>(manifest: &Manifest, patterns: &[S]) -> Result<Manifest> {
    if patterns.is_empty() {
        return Ok(manifest.clone());
    }

    let patterns = patterns
        .iter()
        .map(|p| {
            let p = p.as_ref().trim();
            Pattern::new(p).map_err(|source| FetchError::InvalidPattern {
                pattern: p.to_string(),
                source,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(select_entries(manifest, |name| patterns.iter().any(|p| p.matches(name))))
}

/// Keep entries whose file name matches `regex` anywhere.
pub fn by_regex(manifest: &Manifest, regex: &Regex) -> Manifest {
    select_entries(manifest, |name| regex.is_match(name))
}

/// Keep slots whose 1-based position falls in any of the inclusive `ranges`.
///
/// Ranges reaching past the end are clamped. An empty list keeps everything.
pub fn by_ranges(manifest: &Manifest, ranges: &[(usize, usize)]) -> Manifest {
    if ranges.is_empty() {
        return manifest.clone();
    }

    manifest
        .slots()
        .iter()
        .enumerate()
        .filter(|(index, _)| {
            ranges
                .iter()
                .any(|&(start, end)| start.saturating_sub(1) <= *index && *index < end)
        })
        .map(|(_, slot)| slot.clone())
        .collect()
}

/// Parse a comma separated list of `i-j` ranges, e.g. `1-2,5-7`.
pub fn parse_ranges(input: &str) -> Result<Vec<(usize, usize)>> {
    input
        .split(',')
        .map(|part| {
            let part = part.trim();
            let invalid = |why: &str| FetchError::InvalidRange(format!("'{part}': {why}"));

            let (start, end) = part.split_once('-').ok_or_else(|| invalid("expected 'i-j'"))?;
            let start: usize = start
                .trim()
                .parse()
                .map_err(|_| invalid("start must be a non-negative integer"))?;
            let end: usize = end
                .trim()
                .parse()
                .map_err(|_| invalid("end must be a non-negative integer"))?;

            if end < start {
                return Err(invalid("end must be >= start"));
            }
            Ok((start, end))
        })
        .collect()
}

fn select_entries(manifest: &Manifest, keep: impl Fn(&str) -> bool) -> Manifest {
    manifest
        .slots()
        .iter()
        .filter(|slot| match slot {
            ManifestSlot::Entry(entry) => keep(entry.file_name()),
            ManifestSlot::Malformed { .. } => false,
        })
        .cloned()
        .collect()
}
