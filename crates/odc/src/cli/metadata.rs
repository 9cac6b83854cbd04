use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use odc_catalog::{CatalogClient, FieldFilter, OutputFormat, extract_field, filter_items};
use serde_json::Value;

use super::{Global, RecordArg, fetch_record};
use crate::config::Overrides;
use crate::printer;

#[derive(Args, Clone, Debug)]
pub struct MetadataArg {
    #[command(flatten)]
    pub record: RecordArg,

    /// Print only this metadata field, e.g. title or authors.orcid
    #[arg(short, long)]
    pub output_value: Option<String>,

    /// Keep only array items where field=value; repeatable
    #[arg(short, long, requires = "output_value")]
    pub filter: Vec<FieldFilter>,

    /// Output format [pretty, json]
    #[arg(short = 'm', long, default_value = "pretty")]
    pub format: OutputFormat,
}

impl MetadataArg {
    pub async fn run(self, global: Global) -> Result<ExitCode> {
        let settings = global.settings(Overrides::default());
        let client = CatalogClient::new(&settings.server)?;
        let (_, record) = fetch_record(&client, &self.record).await?;

        for value in self.select(Value::Object(record.metadata))? {
            printer::output(self.format.render(&value));
        }
        Ok(ExitCode::SUCCESS)
    }

    /// The values to print for `metadata`.
    fn select(&self, metadata: Value) -> Result<Vec<Value>> {
        let Some(path) = &self.output_value else {
            return Ok(vec![metadata]);
        };
        let value = extract_field(&metadata, path).context("Field not found")?;
        if self.filter.is_empty() {
            Ok(vec![value])
        } else {
            filter_items(value, &self.filter).context("Filter error")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn arg(output_value: Option<&str>, filter: &[&str]) -> MetadataArg {
        MetadataArg {
            record: RecordArg { recid: Some(329), doi: None, title: None },
            output_value: output_value.map(str::to_string),
            filter: filter.iter().map(|f| f.parse().unwrap()).collect(),
            format: OutputFormat::Pretty,
        }
    }

    fn metadata() -> Value {
        json!({
            "title": "Higgs challenge",
            "authors": [
                {"name": "Rousseau, David", "orcid": "0000-0001"},
                {"name": "Doe, Jane"}
            ]
        })
    }

    #[test]
    fn test_select_whole_record() {
        assert_eq!(arg(None, &[]).select(metadata()).unwrap(), [metadata()]);
    }

    #[test]
    fn test_select_field_and_filter() {
        assert_eq!(arg(Some("title"), &[]).select(metadata()).unwrap(), [json!("Higgs challenge")]);

        let authors = arg(Some("authors"), &["name=Rousseau, David"]).select(metadata()).unwrap();
        assert_eq!(authors, [json!({"name": "Rousseau, David", "orcid": "0000-0001"})]);

        assert!(arg(Some("publisher"), &[]).select(metadata()).is_err());
    }
}
