//! Dotted-path access into record metadata.
//!
//! `authors.orcid` walks into `authors` and, because that is an array,
//! collects `orcid` from every element that has one.

use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::{CatalogError, Result};

/// The value at `path` inside `metadata`; an empty path is the whole value.
pub fn extract_field(metadata: &Value, path: &str) -> Result<Value> {
    if path.is_empty() {
        return Ok(metadata.clone());
    }
    let fields: Vec<&str> = path.split('.').collect();
    extract(metadata, &fields, path)
}

fn extract(value: &Value, fields: &[&str], path: &str) -> Result<Value> {
    let Some((field, rest)) = fields.split_first() else {
        return Ok(value.clone());
    };
    let next = value
        .as_object()
        .and_then(|object| object.get(*field))
        .ok_or_else(|| CatalogError::FieldNotFound(path.to_string()))?;

    match next {
        Value::Array(items) if !rest.is_empty() => Ok(Value::Array(
            items.iter().filter_map(|item| extract(item, rest, path).ok()).collect(),
        )),
        _ => extract(next, rest, path),
    }
}

/// `field=value`: keeps objects whose `field` renders as `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field: String,
    pub value: String,
}

impl FieldFilter {
    /// Objects without the field are kept.
    pub fn matches(&self, object: &Map<String, Value>) -> bool {
        object.get(&self.field).is_none_or(|v| scalar(v) == self.value)
    }
}

impl FromStr for FieldFilter {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        let (field, value) = s
            .split_once('=')
            .filter(|(field, _)| !field.is_empty())
            .ok_or_else(|| CatalogError::InvalidFilter(s.to_string()))?;
        Ok(Self { field: field.to_string(), value: value.to_string() })
    }
}

/// Elements of `value` (or `value` itself if it is not an array) matching
/// every filter.
pub fn filter_items(value: Value, filters: &[FieldFilter]) -> Result<Vec<Value>> {
    let items = match value {
        Value::Array(items) => items,
        other => vec![other],
    };
    let mut kept = Vec::new();
    for item in items {
        let object = item
            .as_object()
            .ok_or_else(|| CatalogError::NotFilterable(item.to_string()))?;
        if filters.iter().all(|filter| filter.matches(object)) {
            kept.push(item);
        }
    }
    Ok(kept)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Strings bare, arrays one element per line, objects as indented JSON.
    #[default]
    Pretty,
    Json,
}

impl FromStr for OutputFormat {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pretty" => Ok(OutputFormat::Pretty),
            "json" => Ok(OutputFormat::Json),
            _ => Err(CatalogError::UnknownFormat(s.to_string())),
        }
    }
}

impl OutputFormat {
    pub fn render(self, value: &Value) -> String {
        match self {
            OutputFormat::Json => format!("{value:#}"),
            OutputFormat::Pretty => match value {
                Value::Array(items) => {
                    items.iter().map(|item| self.render(item)).collect::<Vec<_>>().join("\n")
                }
                Value::Object(_) => format!("{value:#}"),
                scalar_value => scalar(scalar_value),
            },
        }
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
