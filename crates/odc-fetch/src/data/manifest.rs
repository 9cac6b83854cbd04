//! The ordered list of files expected for a catalog record.
//!
//! Catalog JSON is validated once, here. Entries that do not have the
//! expected shape become [`ManifestSlot::Malformed`] so that later stages can
//! account for them without re-inspecting untyped data.

use std::path::{Path, PathBuf};

use odc_verify::Checksum;
use serde_json::Value;

use crate::error::{FetchError, Result};

/// One expected file: where to fetch it and what it must look like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub uri: String,
    pub size: u64,
    pub checksum: Option<Checksum>,
}

impl ManifestEntry {
    pub fn new(uri: impl Into<String>, size: u64, checksum: Option<Checksum>) -> Self {
        Self { uri: uri.into(), size, checksum }
    }

    /// Last path segment of the URI; the name the file is stored under locally.
    pub fn file_name(&self) -> &str {
        file_name(&self.uri)
    }

    /// `dir/<file_name>`.
    pub fn local_path(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}

fn file_name(uri: &str) -> &str {
    uri.trim_end_matches('/').rsplit('/').next().unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSlot {
    Entry(ManifestEntry),
    /// An entry that failed shape validation, kept for accounting.
    Malformed { index: usize, reason: String },
}

impl ManifestSlot {
    pub fn entry(&self) -> Option<&ManifestEntry> {
        match self {
            ManifestSlot::Entry(entry) => Some(entry),
            ManifestSlot::Malformed { .. } => None,
        }
    }

    /// Validate loose catalog fields into a typed entry.
    ///
    /// The checksum is optional (index files carry none) but, when present,
    /// must be in catalog notation.
    pub fn from_parts(index: usize, uri: &str, size: i64, checksum: Option<&str>) -> Self {
        let malformed = |reason: String| ManifestSlot::Malformed { index, reason };

        if uri.is_empty() || file_name(uri).is_empty() {
            return malformed(format!("entry {index} has no usable uri"));
        }
        let Ok(size) = u64::try_from(size) else {
            return malformed(format!("entry {index} has negative size {size}"));
        };
        let checksum = match checksum.filter(|c| !c.is_empty()) {
            Some(raw) => match raw.parse::<Checksum>() {
                Ok(checksum) => Some(checksum),
                Err(e) => return malformed(format!("entry {index}: {e}")),
            },
            None => None,
        };

        ManifestSlot::Entry(ManifestEntry::new(uri, size, checksum))
    }

    /// Validate one JSON object of the form `{"uri", "size", "checksum"}`.
    pub fn from_json(index: usize, value: &Value) -> Self {
        let malformed = |reason: &str| ManifestSlot::Malformed {
            index,
            reason: format!("entry {index} {reason}"),
        };

        let Some(object) = value.as_object() else {
            return malformed("is not an object");
        };
        let Some(uri) = object.get("uri").and_then(Value::as_str) else {
            return malformed("has no string uri");
        };
        let Some(size) = object.get("size").and_then(json_size) else {
            return malformed("has no integral size");
        };
        let checksum = match object.get("checksum") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.as_str()),
            Some(_) => return malformed("has a non-string checksum"),
        };

        Self::from_parts(index, uri, size, checksum)
    }
}

/// Sizes arrive as JSON integers, integral floats, or numeric strings.
fn json_size(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Ordered manifest; order is significant for range filters and reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    slots: Vec<ManifestSlot>,
}

impl Manifest {
    pub fn new(slots: Vec<ManifestSlot>) -> Self {
        Self { slots }
    }

    /// Build from a JSON array of file objects.
    pub fn from_json(value: &Value) -> Result<Self> {
        let items = value
            .as_array()
            .ok_or_else(|| FetchError::InvalidManifest("expected a JSON array".to_string()))?;

        Ok(items
            .iter()
            .enumerate()
            .map(|(index, item)| ManifestSlot::from_json(index, item))
            .collect())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| FetchError::InvalidManifest(e.to_string()))?;
        Self::from_json(&value)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[ManifestSlot] {
        &self.slots
    }

    /// Well-formed entries in manifest order.
    pub fn entries(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.slots.iter().filter_map(ManifestSlot::entry)
    }

    /// Sum of the expected sizes of well-formed entries.
    pub fn expected_bytes(&self) -> u64 {
        self.entries().map(|e| e.size).sum()
    }
}

impl FromIterator<ManifestSlot> for Manifest {
    fn from_iter<I: IntoIterator<Item = ManifestSlot>>(iter: I) -> Self {
        Self { slots: iter.into_iter().collect() }
    }
}

impl FromIterator<ManifestEntry> for Manifest {
    fn from_iter<I: IntoIterator<Item = ManifestEntry>>(iter: I) -> Self {
        iter.into_iter().map(ManifestSlot::Entry).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_name_is_last_segment() {
        let entry = ManifestEntry::new("http://opendata.cern.ch/eos/opendata/cms/a.root", 1, None);
        assert_eq!(entry.file_name(), "a.root");
        assert_eq!(entry.local_path(Path::new("5500")), Path::new("5500/a.root"));
        assert_eq!(file_name("root://eospublic.cern.ch//eos/b.txt"), "b.txt");
        assert_eq!(file_name("c.txt"), "c.txt");
    }

    #[test]
    fn from_json_accepts_catalog_shapes() {
        let manifest = Manifest::from_json(&json!([
            {"uri": "http://x/a.txt", "size": 17, "checksum": "adler32:3a9e069c"},
            {"uri": "http://x/b.txt", "size": "42"},
            {"uri": "http://x/c.txt", "size": 5.0, "checksum": ""},
        ]))
        .unwrap();

        let entries: Vec<_> = manifest.entries().collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].checksum.as_ref().unwrap().to_string(), "adler32:3a9e069c");
        assert_eq!(entries[1].size, 42);
        assert_eq!(entries[1].checksum, None);
        assert_eq!(entries[2].size, 5);
        assert_eq!(manifest.expected_bytes(), 64);
    }

    #[test]
    fn from_json_marks_malformed_entries() {
        let manifest = Manifest::from_json(&json!([
            "not an object",
            {"size": 3},
            {"uri": "http://x/a", "size": -1},
            {"uri": "http://x/a", "size": 1.5},
            {"uri": "http://x/a", "size": 1, "checksum": 12},
            {"uri": "http://x/a", "size": 1, "checksum": "sha1:zz"},
            {"uri": "", "size": 1},
            {"uri": "http://x/ok", "size": 1},
        ]))
        .unwrap();

        assert_eq!(manifest.len(), 8);
        assert_eq!(manifest.entries().count(), 1);
        match &manifest.slots()[2] {
            ManifestSlot::Malformed { index, reason } => {
                assert_eq!(*index, 2);
                assert!(reason.contains("negative"));
            }
            other => panic!("expected malformed slot, got {other:?}"),
        }
    }

    #[test]
    fn from_json_requires_an_array() {
        assert!(matches!(
            Manifest::from_json(&json!({"uri": "x"})),
            Err(FetchError::InvalidManifest(_))
        ));
        assert!(matches!(Manifest::from_json_str("{"), Err(FetchError::InvalidManifest(_))));
    }
}
