use serde_json::{Map, Value};

use crate::error::{CatalogError, Result};
use crate::record::{Availability, CatalogFile, Protocol, Record};
use crate::{SERVER_HTTPS_URI, SERVER_ROOT_URI};

/// Integers arrive as JSON numbers, integral floats or numeric strings.
pub(crate) fn json_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Rewrite a catalog location for `protocol`.
///
/// Only locations under the XRootD root are rewritten; `http` points them at
/// `server`, `https` at the public HTTPS front end, and `xrootd` keeps them.
pub fn convert_uri(uri: &str, server: &str, protocol: Protocol) -> String {
    let Some(path) = uri.strip_prefix(SERVER_ROOT_URI) else {
        return uri.to_string();
    };
    match protocol {
        Protocol::Http => format!("{}/{path}", server.trim_end_matches('/')),
        Protocol::Https => format!("{SERVER_HTTPS_URI}/{path}"),
        Protocol::Xrootd => uri.to_string(),
    }
}

/// Files of `record`, in catalog order.
///
/// Plain files come first. File indices follow, either expanded into the
/// files they list or, without `expand`, as one entry per index file.
pub fn list_files(
    record: &Record,
    server: &str,
    protocol: Protocol,
    expand: bool,
) -> Result<Vec<CatalogFile>> {
    let recid = record.recid()?;
    let server = server.trim_end_matches('/');
    let mut files = Vec::new();

    for file in array(&record.metadata, "files")? {
        let mut file = catalog_file(file, server, protocol);
        file.availability = Some("online".into());
        files.push(file);
    }

    for index in array(&record.metadata, "_file_indices")? {
        let index = index
            .as_object()
            .ok_or_else(|| invalid("file index entry is not an object"))?;

        if expand {
            for inner in array(index, "files")? {
                let mut file = catalog_file(inner, server, protocol);
                file.availability.get_or_insert_with(|| "online".into());
                files.push(file);
            }
        } else {
            files.push(index_file(index, recid, server, protocol));
        }
    }

    Ok(files)
}

/// Keep the files selected by `availability`.
pub fn filter_by_availability(files: Vec<CatalogFile>, availability: Availability) -> Vec<CatalogFile> {
    match availability {
        Availability::All => files,
        Availability::Online => files.into_iter().filter(|f| !f.is_offline()).collect(),
    }
}

pub fn has_offline_files(files: &[CatalogFile]) -> bool {
    files.iter().any(CatalogFile::is_offline)
}

/// Never fails; a file entry of the wrong shape is listed with its problem.
fn catalog_file(value: &Value, server: &str, protocol: Protocol) -> CatalogFile {
    let Some(file) = value.as_object() else {
        return malformed(String::new(), "file entry is not an object");
    };
    let Some(uri) = file.get("uri").and_then(Value::as_str).filter(|u| !u.is_empty()) else {
        return malformed(String::new(), "file entry has no uri");
    };
    let uri = convert_uri(uri, server, protocol);
    let Some(size) = file.get("size").and_then(json_int) else {
        return malformed(uri, "file entry has no integral size");
    };

    CatalogFile {
        checksum: file.get("checksum").and_then(Value::as_str).map(str::to_string),
        availability: file.get("availability").and_then(Value::as_str).map(str::to_string),
        ..CatalogFile::new(uri, size)
    }
}

/// The index file itself, as served under the record.
fn index_file(index: &Map<String, Value>, recid: u64, server: &str, protocol: Protocol) -> CatalogFile {
    let Some(key) = index.get("key").and_then(Value::as_str) else {
        return malformed(String::new(), "file index has no key");
    };
    // The XRootD root keeps its `//` path separator.
    let base = match protocol {
        Protocol::Xrootd => SERVER_ROOT_URI.strip_suffix('/').unwrap_or(SERVER_ROOT_URI),
        Protocol::Http | Protocol::Https => server,
    };
    let uri = format!("{base}/record/{recid}/file_index/{key}");
    match index.get("size").and_then(json_int) {
        Some(size) => CatalogFile::new(uri, size),
        None => malformed(uri, "file index has no integral size"),
    }
}

fn malformed(uri: String, problem: &str) -> CatalogFile {
    CatalogFile { problem: Some(problem.to_string()), ..CatalogFile::new(uri, 0) }
}

/// A missing array reads as empty.
fn array<'a>(object: &'a Map<String, Value>, field: &str) -> Result<&'a [Value]> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(invalid(&format!("field '{field}' is not an array"))),
    }
}

fn invalid(reason: &str) -> CatalogError {
    CatalogError::InvalidRecord(reason.to_string())
}
