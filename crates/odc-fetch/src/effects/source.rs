use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

use super::{HttpSource, MountSource};
use crate::error::{FetchError, Result};

/// A boxed stream of file content.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// A source opened for reading at some offset.
pub struct OpenedSource {
    /// Offset the stream actually starts at.
    ///
    /// Either the requested offset or 0 when the source could not honour it.
    pub start: u64,

    /// Bytes the stream will yield, if the source announced it.
    pub content_length: Option<u64>,

    pub stream: BoxStream<'static, Result<Bytes>>,
}

impl std::fmt::Debug for OpenedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenedSource")
            .field("start", &self.start)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Where file content comes from.
///
/// The transfer engine only knows this trait; retry and resume logic is
/// shared by every transport.
///
/// # Implementations
///
/// - [`HttpSource`]: `http`/`https` with `Range` requests
/// - [`MountSource`]: `root://` paths served from a mounted namespace
/// - [`SourceRouter`]: dispatches on the URI scheme
pub trait ByteSource: Send + Sync {
    /// URI schemes this source can open.
    fn schemes(&self) -> &'static [&'static str];

    /// Open `uri` for reading from byte `offset`.
    ///
    /// # Errors
    ///
    /// Connection failures, non-content responses and unreadable files.
    /// The caller decides whether the error is worth another attempt.
    fn open_at(
        &self,
        uri: &str,
        offset: u64,
    ) -> impl Future<Output = Result<OpenedSource>> + Send;
}

/// Lower-cased scheme of `uri`.
pub(crate) fn scheme_of(uri: &str) -> Result<String> {
    match uri.split_once("://") {
        Some((scheme, _)) if !scheme.is_empty() => Ok(scheme.to_ascii_lowercase()),
        _ => Err(FetchError::InvalidUri(uri.to_string())),
    }
}

/// Picks HTTP or the mounted filesystem per URI, so one manifest may mix both.
#[derive(Debug, Clone)]
pub struct SourceRouter {
    http: HttpSource,
    mount: Option<MountSource>,
}

impl SourceRouter {
    pub fn new(http: HttpSource) -> Self {
        Self { http, mount: None }
    }

    pub fn with_mount(mut self, mount: MountSource) -> Self {
        self.mount = Some(mount);
        self
    }

    pub fn mount(&self) -> Option<&MountSource> {
        self.mount.as_ref()
    }
}

impl ByteSource for SourceRouter {
    fn schemes(&self) -> &'static [&'static str] {
        &["http", "https", "root"]
    }

    async fn open_at(&self, uri: &str, offset: u64) -> Result<OpenedSource> {
        let scheme = scheme_of(uri)?;

        if self.http.schemes().contains(&scheme.as_str()) {
            return self.http.open_at(uri, offset).await;
        }
        if MOUNT_SCHEMES.contains(&scheme.as_str()) {
            return match &self.mount {
                Some(mount) => mount.open_at(uri, offset).await,
                None => Err(FetchError::NotMounted(uri.to_string())),
            };
        }
        Err(FetchError::UnsupportedScheme(scheme))
    }
}

const MOUNT_SCHEMES: &[&str] = &["root"];
