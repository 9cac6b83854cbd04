use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{CatalogError, Result};
use crate::files::{json_int, list_files};
use crate::record::{CatalogFile, Protocol, Record, RecordSelector};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    total: u64,
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: Value,
}

/// Read-only access to one catalog server.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    server: String,
    client: reqwest::Client,
}

impl CatalogClient {
    pub fn new(server: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("odc/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(server, client))
    }

    pub fn with_client(server: impl Into<String>, client: reqwest::Client) -> Self {
        let server = server.into().trim_end_matches('/').to_string();
        Self { server, client }
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    /// Fetch a record by its numeric id.
    pub async fn get_record(&self, recid: u64) -> Result<Record> {
        let url = format!("{}/api/records/{recid}", self.server);
        debug!(%url, "fetching record");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(CatalogError::Status { status: response.status().as_u16(), url });
        }

        let mut record: Record = response.json().await?;
        record.strip_internal_fields();
        Ok(record)
    }

    pub async fn record_by_doi(&self, doi: &str) -> Result<Record> {
        self.record_by_search("doi", doi).await
    }

    pub async fn record_by_title(&self, title: &str) -> Result<Record> {
        self.record_by_search("title", title).await
    }

    /// Record id selected by `selector`, searching when no id was given.
    pub async fn resolve_recid(&self, selector: &RecordSelector) -> Result<u64> {
        if let Some(recid) = selector.recid.filter(|id| *id > 0) {
            return Ok(recid);
        }
        let record = match (&selector.doi, &selector.title) {
            (Some(doi), _) if !doi.is_empty() => self.record_by_doi(doi).await?,
            (_, Some(title)) if !title.is_empty() => self.record_by_title(title).await?,
            _ => return Err(CatalogError::MissingSelector),
        };
        record.recid()
    }

    /// Files of `record` with links for `protocol`.
    pub fn files(&self, record: &Record, protocol: Protocol, expand: bool) -> Result<Vec<CatalogFile>> {
        list_files(record, &self.server, protocol, expand)
    }

    /// Exact-match search on `field`; exactly one hit is expected.
    async fn record_by_search(&self, field: &'static str, value: &str) -> Result<Record> {
        let url = format!("{}/api/records", self.server);
        let query = format!("{field}:\"{value}\"");
        debug!(%url, %query, "searching record");

        let response = self
            .client
            .get(&url)
            .query(&[("page", "1"), ("size", "1"), ("q", query.as_str())])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(CatalogError::Status { status: response.status().as_u16(), url });
        }

        let found: SearchResponse = response.json().await?;
        let hit = match found.hits.total {
            0 => None,
            1 => found.hits.hits.first(),
            _ => {
                return Err(CatalogError::Ambiguous { field, value: value.to_string() });
            }
        };
        let Some(hit) = hit else {
            return Err(CatalogError::NotFound { field, value: value.to_string() });
        };

        let recid = json_int(&hit.id)
            .and_then(|id| u64::try_from(id).ok())
            .ok_or_else(|| CatalogError::InvalidRecord(format!("search hit id {} is not a record id", hit.id)))?;
        self.get_record(recid).await
    }
}
