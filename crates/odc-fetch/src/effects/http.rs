use std::time::Duration;

use futures_util::TryStreamExt;
use reqwest::header::RANGE;
use tracing::debug;

use super::source::{ByteSource, OpenedSource};
use crate::core::{classify_status, range_header, resume_offset};
use crate::error::{FetchError, Result};

/// Whole-request timeout, body included.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Error bodies are kept for diagnostics only.
const MAX_ERROR_BODY: usize = 512;

/// HTTP(S) transport using `reqwest`.
///
/// One client, and so one connection pool, is shared by every file and every
/// retry.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("odc/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Use a preconfigured client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl ByteSource for HttpSource {
    fn schemes(&self) -> &'static [&'static str] {
        &["http", "https"]
    }

    async fn open_at(&self, uri: &str, offset: u64) -> Result<OpenedSource> {
        let mut request = self.client.get(uri);
        if let Some(range) = range_header(offset) {
            request = request.header(RANGE, range);
        }

        debug!(uri, offset, "requesting");
        let response = request.send().await?;
        let status = response.status().as_u16();

        let start = match classify_status(status) {
            Some(kind) => resume_offset(offset, kind),
            None => {
                let body = response.text().await.unwrap_or_default();
                return Err(FetchError::Http { status, body: truncate(body) });
            }
        };
        if offset > 0 && start == 0 {
            debug!(uri, offset, "range not honoured, full content follows");
        }

        let content_length = response.content_length();
        let stream = response.bytes_stream().map_err(FetchError::from);

        Ok(OpenedSource { start, content_length, stream: Box::pin(stream) })
    }
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
        body.push_str("...");
    }
    body.trim().to_string()
}
