use std::io::SeekFrom;
use std::path::{Component, Path, PathBuf};

use futures_util::TryStreamExt;
use tokio::fs::{self, File};
use tokio::io::AsyncSeekExt;
use tokio_util::io::ReaderStream;
use tracing::debug;

use super::source::{ByteSource, OpenedSource};
use crate::data::DirEntry;
use crate::error::{FetchError, Result};

const CHUNK_SIZE: usize = 32 * 1024;

/// Serves `root://host//path` URIs from a local mount of the remote namespace.
///
/// The host part is dropped and the absolute path is looked up under `root`,
/// so with the EOS namespace mounted at `/eos` a root of `/` resolves
/// `root://eospublic.cern.ch//eos/opendata/cms/x.root` to
/// `/eos/opendata/cms/x.root`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountSource {
    root: PathBuf,
}

impl MountSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Local path backing `uri`.
    ///
    /// # Errors
    ///
    /// `UnsupportedScheme` for anything but `root://`, `InvalidUri` for URIs
    /// without a path or with a path that escapes the mount.
    pub fn resolve(&self, uri: &str) -> Result<PathBuf> {
        let rest = uri
            .strip_prefix("root://")
            .ok_or_else(|| FetchError::UnsupportedScheme(uri.to_string()))?;
        let (_host, path) = rest
            .split_once('/')
            .ok_or_else(|| FetchError::InvalidUri(uri.to_string()))?;

        self.local(path).ok_or_else(|| FetchError::InvalidUri(uri.to_string()))
    }

    /// Local directory backing a remote path, given either as a `root://`
    /// URI or as an absolute namespace path such as `/eos/opendata/cms`.
    pub fn resolve_dir(&self, path: &str) -> Result<PathBuf> {
        if path.starts_with("root://") {
            self.resolve(path)
        } else {
            self.local(path).ok_or_else(|| FetchError::InvalidUri(path.to_string()))
        }
    }

    fn local(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if relative.as_os_str().is_empty() || escapes {
            return None;
        }
        Some(self.root.join(relative))
    }

    /// Entries of a remote directory, sorted by name.
    ///
    /// With `recursive`, the contents of each subdirectory follow the listing
    /// it appears in, named relative to `path`.
    pub async fn list(&self, path: &str, recursive: bool) -> Result<Vec<DirEntry>> {
        let mut listed = Vec::new();
        let mut pending = vec![(self.resolve_dir(path)?, String::new())];

        while let Some((dir, prefix)) = pending.pop() {
            let entries = read_dir_sorted(&dir, &prefix).await?;
            if recursive {
                let subdirs = entries.iter().rev().filter(|(_, e)| e.is_dir);
                pending.extend(subdirs.map(|(local, e)| (local.clone(), e.name.clone())));
            }
            listed.extend(entries.into_iter().map(|(_, entry)| entry));
        }

        Ok(listed)
    }
}

async fn read_dir_sorted(dir: &Path, prefix: &str) -> Result<Vec<(PathBuf, DirEntry)>> {
    let mut entries = Vec::new();
    let mut read_dir = fs::read_dir(dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        let meta = entry.metadata().await?;
        let file_name = entry.file_name().to_string_lossy().into_owned();
        let name = if prefix.is_empty() { file_name } else { format!("{prefix}/{file_name}") };
        entries.push((
            entry.path(),
            DirEntry {
                name,
                is_dir: meta.is_dir(),
                size: if meta.is_dir() { 0 } else { meta.len() },
                modified: meta.modified().ok(),
            },
        ));
    }
    entries.sort_by(|(_, a), (_, b)| a.name.cmp(&b.name));
    debug!(dir = %dir.display(), entries = entries.len(), "listed mount directory");
    Ok(entries)
}

impl ByteSource for MountSource {
    fn schemes(&self) -> &'static [&'static str] {
        &["root"]
    }

    async fn open_at(&self, uri: &str, offset: u64) -> Result<OpenedSource> {
        let path = self.resolve(uri)?;
        let mut file = File::open(&path).await?;
        let len = file.metadata().await?.len();

        // A local prefix longer than the remote file cannot be resumed.
        let start = if offset <= len { offset } else { 0 };
        if start > 0 {
            file.seek(SeekFrom::Start(start)).await?;
        }
        debug!(path = %path.display(), start, len, "reading from mount");

        let stream = ReaderStream::with_capacity(file, CHUNK_SIZE).map_err(FetchError::from);
        Ok(OpenedSource {
            start,
            content_length: Some(len - start),
            stream: Box::pin(stream),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_drops_host() {
        let mount = MountSource::new("/mnt/eos");
        assert_eq!(
            mount.resolve("root://eospublic.cern.ch//eos/opendata/cms/a.root").unwrap(),
            PathBuf::from("/mnt/eos/eos/opendata/cms/a.root")
        );
        assert_eq!(
            mount.resolve("root://host/eos/b.txt").unwrap(),
            PathBuf::from("/mnt/eos/eos/b.txt")
        );
    }

    #[test]
    fn test_resolve_rejects_bad_uris() {
        let mount = MountSource::new("/mnt");
        assert!(matches!(mount.resolve("http://host/a"), Err(FetchError::UnsupportedScheme(_))));
        assert!(matches!(mount.resolve("root://host"), Err(FetchError::InvalidUri(_))));
        assert!(matches!(mount.resolve("root://host//"), Err(FetchError::InvalidUri(_))));
        assert!(matches!(mount.resolve("root://host//eos/../../etc"), Err(FetchError::InvalidUri(_))));
    }

    #[test]
    fn test_resolve_dir_accepts_namespace_paths() {
        let mount = MountSource::new("/mnt/eos");
        assert_eq!(mount.resolve_dir("/eos/opendata/cms").unwrap(), PathBuf::from("/mnt/eos/eos/opendata/cms"));
        assert_eq!(
            mount.resolve_dir("root://eospublic.cern.ch//eos/opendata").unwrap(),
            PathBuf::from("/mnt/eos/eos/opendata")
        );
        assert!(matches!(mount.resolve_dir("/eos/../.."), Err(FetchError::InvalidUri(_))));
    }

    #[tokio::test]
    async fn test_list_directory() {
        let mount = tempfile::tempdir().unwrap();
        let run = mount.path().join("eos/opendata/Run2010B");
        std::fs::create_dir_all(run.join("AOD/v1")).unwrap();
        std::fs::write(run.join("b.root"), b"12345").unwrap();
        std::fs::write(run.join("AOD/a.root"), b"123").unwrap();
        std::fs::write(run.join("AOD/v1/c.root"), b"1").unwrap();
        let source = MountSource::new(mount.path());

        let flat = source.list("/eos/opendata/Run2010B", false).await.unwrap();
        let names: Vec<_> = flat.iter().map(DirEntry::display_name).collect();
        assert_eq!(names, ["AOD/", "b.root"]);
        assert_eq!(flat[1].size, 5);
        assert!(flat[1].modified.is_some());

        let deep = source.list("/eos/opendata/Run2010B", true).await.unwrap();
        let names: Vec<_> = deep.iter().map(DirEntry::display_name).collect();
        assert_eq!(names, ["AOD/", "b.root", "AOD/a.root", "AOD/v1/", "AOD/v1/c.root"]);

        assert!(matches!(source.list("/eos/missing", false).await, Err(FetchError::Io(_))));
    }
}
