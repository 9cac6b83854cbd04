//! Single-file transfer engine against HTTP and in-memory sources.

use std::io;
use std::sync::Mutex;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{StreamExt, stream};
use odc_fetch::{
    BoxStream, ByteSource, CancellationToken, FetchError, HttpSource, MountSource, OpenedSource,
    Transfer, TransferOptions,
};
use tempfile::tempdir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn options(retry_limit: u32) -> TransferOptions {
    TransferOptions::default().retry_limit(retry_limit).retry_sleep(Duration::ZERO)
}

fn http_transfer(retry_limit: u32) -> Transfer<HttpSource> {
    Transfer::new(HttpSource::new().unwrap(), options(retry_limit))
}

#[tokio::test]
async fn test_resume_appends_acknowledged_range() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a.txt"))
        .and(header("Range", "bytes=5-"))
        .respond_with(ResponseTemplate::new(206).set_body_string("World"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let dest = dir.path().join("a.txt");
    std::fs::write(&dest, "Hello").unwrap();

    let outcome = http_transfer(3)
        .run(&format!("{}/a.txt", server.uri()), &dest, true, Some(10), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.bytes_transferred, 10);
    assert_eq!(outcome.retries_used, 0);
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "HelloWorld");
}

#[tokio::test]
async fn test_ignored_range_rewrites_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("HelloWorld"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let dest = dir.path().join("a.txt");
    std::fs::write(&dest, "Hello").unwrap();

    let outcome = http_transfer(3)
        .run(&format!("{}/a.txt", server.uri()), &dest, true, Some(10), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.bytes_transferred, 10);
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "HelloWorld");
}

#[tokio::test]
async fn test_fresh_download_sends_no_range() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("Range", "bytes=0-"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("content"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let dest = dir.path().join("nested/dir/b.bin");

    let outcome = http_transfer(1)
        .run(&format!("{}/b.bin", server.uri()), &dest, true, None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.bytes_transferred, 7);
    assert_eq!(std::fs::read(&dest).unwrap(), b"content");
}

#[tokio::test]
async fn test_retries_used_counts_failed_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("payload"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let dest = dir.path().join("c.txt");

    let outcome = http_transfer(5)
        .run(&format!("{}/c.txt", server.uri()), &dest, true, Some(7), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.retries_used, 2);
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "payload");
}

#[tokio::test]
async fn test_exhaustion_reports_last_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(3)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let err = http_transfer(3)
        .run(
            &format!("{}/d.txt", server.uri()),
            &dir.path().join("d.txt"),
            true,
            None,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    match err {
        FetchError::RetriesExhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, FetchError::Http { status: 500, ref body } if body == "boom"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_zero_retry_limit_still_attempts_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let err = http_transfer(0)
        .run(
            &format!("{}/e.txt", server.uri()),
            &dir.path().join("e.txt"),
            true,
            None,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::RetriesExhausted { attempts: 1, .. }));
}

#[tokio::test]
async fn test_not_found_is_retried_until_the_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(5)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let err = http_transfer(5)
        .run(
            &format!("{}/f.txt", server.uri()),
            &dir.path().join("f.txt"),
            true,
            None,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    match err {
        FetchError::RetriesExhausted { attempts, last } => {
            assert_eq!(attempts, 5);
            assert!(matches!(*last, FetchError::Http { status: 404, .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// In-memory source whose first response breaks off after `break_after` bytes.
struct FlakySource {
    content: Bytes,
    break_after: usize,
    offsets: Mutex<Vec<u64>>,
    cancel_at_break: Option<CancellationToken>,
}

impl FlakySource {
    fn new(content: &'static str, break_after: usize) -> Self {
        Self {
            content: Bytes::from_static(content.as_bytes()),
            break_after,
            offsets: Mutex::new(Vec::new()),
            cancel_at_break: None,
        }
    }

    fn offsets(&self) -> Vec<u64> {
        self.offsets.lock().unwrap().clone()
    }
}

impl ByteSource for FlakySource {
    fn schemes(&self) -> &'static [&'static str] {
        &["mem"]
    }

    async fn open_at(&self, _uri: &str, offset: u64) -> odc_fetch::Result<OpenedSource> {
        let attempt = {
            let mut offsets = self.offsets.lock().unwrap();
            offsets.push(offset);
            offsets.len()
        };
        let rest = self.content.slice(offset as usize..);
        let stream: BoxStream<'static, odc_fetch::Result<Bytes>> = if attempt == 1 {
            let reset = io::Error::new(io::ErrorKind::ConnectionReset, "connection reset");
            let token = self.cancel_at_break.clone();
            Box::pin(
                stream::iter(vec![Ok(rest.slice(..self.break_after)), Err(FetchError::Io(reset))])
                    .inspect(move |item| {
                        if let (Err(_), Some(token)) = (item, &token) {
                            token.cancel();
                        }
                    }),
            )
        } else {
            Box::pin(stream::iter(vec![Ok(rest)]))
        };

        Ok(OpenedSource {
            start: offset,
            content_length: Some(self.content.len() as u64 - offset),
            stream,
        })
    }
}

#[tokio::test]
async fn test_each_attempt_restats_destination() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("g.txt");
    let transfer = Transfer::new(FlakySource::new("HelloWorld", 5), options(3));

    let outcome = transfer
        .run("mem://g.txt", &dest, true, Some(10), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(transfer.source().offsets(), [0, 5]);
    assert_eq!(outcome.retries_used, 1);
    assert_eq!(outcome.bytes_transferred, 10);
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "HelloWorld");
}

#[tokio::test]
async fn test_without_resume_starts_over() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("h.txt");
    let transfer = Transfer::new(FlakySource::new("HelloWorld", 5), options(3));

    transfer
        .run("mem://h.txt", &dest, false, None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(transfer.source().offsets(), [0, 0]);
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "HelloWorld");
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let dir = tempdir().unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let transfer = Transfer::new(FlakySource::new("HelloWorld", 5), options(3));

    let err = transfer
        .run("mem://i.txt", &dir.path().join("i.txt"), true, None, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Cancelled));
    assert!(transfer.source().offsets().is_empty());
}

#[tokio::test]
async fn test_cancel_during_retry_sleep_keeps_partial_file() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("j.txt");
    let cancel = CancellationToken::new();

    let mut source = FlakySource::new("HelloWorld", 5);
    source.cancel_at_break = Some(cancel.clone());
    let options = TransferOptions::default()
        .retry_limit(10)
        .retry_sleep(Duration::from_secs(3600));
    let transfer = Transfer::new(source, options);

    let err = transfer.run("mem://j.txt", &dest, true, None, &cancel).await.unwrap_err();

    assert!(matches!(err, FetchError::Cancelled));
    assert_eq!(transfer.source().offsets().len(), 1);
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "Hello");
}

/// In-memory source that serves fixed chunks and fires `cancel` once the
/// first chunk has been handed out.
struct ChunkedSource {
    chunks: Vec<&'static str>,
    opens: Mutex<u32>,
    cancel: CancellationToken,
}

impl ByteSource for ChunkedSource {
    fn schemes(&self) -> &'static [&'static str] {
        &["mem"]
    }

    async fn open_at(&self, _uri: &str, offset: u64) -> odc_fetch::Result<OpenedSource> {
        *self.opens.lock().unwrap() += 1;
        let cancel = self.cancel.clone();
        let chunks: Vec<odc_fetch::Result<Bytes>> =
            self.chunks.iter().map(|c| Ok(Bytes::from_static(c.as_bytes()))).collect();
        let stream = stream::iter(chunks).enumerate().map(move |(i, chunk)| {
            if i == 0 {
                cancel.cancel();
            }
            chunk
        });

        Ok(OpenedSource { start: offset, content_length: None, stream: Box::pin(stream) })
    }
}

#[tokio::test]
async fn test_cancel_between_chunks_stops_the_attempt() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("m.txt");
    let cancel = CancellationToken::new();
    let source = ChunkedSource {
        chunks: vec!["Hello", "World", "Again"],
        opens: Mutex::new(0),
        cancel: cancel.clone(),
    };
    let transfer = Transfer::new(source, options(5));

    let err = transfer.run("mem://m.txt", &dest, true, None, &cancel).await.unwrap_err();

    assert!(matches!(err, FetchError::Cancelled));
    assert_eq!(*transfer.source().opens.lock().unwrap(), 1);
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "Hello");
}

#[tokio::test]
async fn test_mount_source_resumes_positioned_read() {
    let mount = tempdir().unwrap();
    let remote = mount.path().join("eos/opendata/cms");
    std::fs::create_dir_all(&remote).unwrap();
    let content: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
    std::fs::write(remote.join("k.root"), &content).unwrap();

    let dir = tempdir().unwrap();
    let dest = dir.path().join("k.root");
    std::fs::write(&dest, &content[..40_000]).unwrap();

    let transfer = Transfer::new(MountSource::new(mount.path()), options(1));
    let outcome = transfer
        .run(
            "root://eospublic.cern.ch//eos/opendata/cms/k.root",
            &dest,
            true,
            Some(content.len() as u64),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.bytes_transferred, content.len() as u64);
    assert_eq!(std::fs::read(&dest).unwrap(), content);
}

#[tokio::test]
async fn test_mount_source_streams_in_chunks() {
    let mount = tempdir().unwrap();
    std::fs::write(mount.path().join("l.bin"), vec![7u8; 100 * 1024]).unwrap();

    let opened = MountSource::new(mount.path()).open_at("root://host//l.bin", 1024).await.unwrap();
    assert_eq!(opened.start, 1024);
    assert_eq!(opened.content_length, Some(99 * 1024));

    let chunks: Vec<_> = opened.stream.map(|chunk| chunk.unwrap().len()).collect().await;
    assert!(chunks.iter().all(|len| *len <= 32 * 1024));
    assert_eq!(chunks.iter().sum::<usize>(), 99 * 1024);
}
