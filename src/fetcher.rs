//! Fetching stream bytes over HTTP.

use crate::error::{Error, Result};
use crate::progress::ProgressCallback;
use futures_util::StreamExt;
use log::{debug, trace};
use reqwest::StatusCode;
use reqwest::header::{CONTENT_RANGE, HeaderMap, HeaderName, HeaderValue, RANGE, USER_AGENT};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tokio::io::AsyncWriteExt;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Downloads one URL to one file, one ranged request at a time.
///
/// Media hosts throttle long unranged transfers, so the body is requested in chunks of
/// `chunk_size` bytes. A server that ignores the `Range` header is read in one go.
pub struct Fetcher {
    url: String,
    headers: HeaderMap,
    chunk_size: u64,
}

impl fmt::Display for Fetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fetcher(url={}, chunk_size={})", self.url, self.chunk_size)
    }
}

impl Fetcher {
    /// Creates a new fetcher for the given URL.
    pub fn new(url: impl AsRef<str>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));

        Self {
            url: url.as_ref().to_string(),
            headers,
            chunk_size: 10 * 1024 * 1024,
        }
    }

    /// Adds the request headers the provider asked for. Invalid ones are skipped.
    pub fn with_headers(mut self, headers: &HashMap<String, String>) -> Self {
        for (name, value) in headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    self.headers.insert(name, value);
                }
                _ => debug!("Skipping invalid header {}", name),
            }
        }
        self
    }

    /// Configures the number of bytes asked for per request.
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Writes the body at the URL to `destination`, replacing any existing file.
    ///
    /// Returns the number of bytes written.
    pub async fn fetch_to(&self, destination: &Path, progress: &ProgressCallback<'_>) -> Result<u64> {
        debug!("Fetching {} to {}", self.url, destination.display());

        let client = reqwest::Client::builder()
            .default_headers(self.headers.clone())
            .build()?;
        let mut file = tokio::fs::File::create(destination).await?;

        let mut written: u64 = 0;
        let mut total: Option<u64> = None;

        loop {
            let mut end = written + self.chunk_size - 1;
            if let Some(total) = total {
                end = end.min(total.saturating_sub(1));
            }

            trace!("Requesting bytes {}-{} of {}", written, end, self.url);
            let response = client
                .get(&self.url)
                .header(RANGE, format!("bytes={}-{}", written, end))
                .send()
                .await?;

            // past the end: fine when everything the server has is already written
            if response.status() == StatusCode::RANGE_NOT_SATISFIABLE {
                match content_range_total(response.headers()) {
                    Some(size) if size == written => break,
                    None if written > 0 => break,
                    size => {
                        return Err(Error::fetch(
                            &self.url,
                            format!(
                                "range {}-{} not satisfiable (size {:?}, {} bytes written)",
                                written, end, size, written
                            ),
                        ));
                    }
                }
            }
            let response = response.error_for_status()?;

            match response.status() {
                StatusCode::PARTIAL_CONTENT => {
                    if total.is_none() {
                        total = content_range_total(response.headers());
                    }

                    let before = written;
                    copy_body(response, &mut file, &mut written, total, progress).await?;
                    let received = written - before;

                    if received == 0 {
                        return Err(Error::fetch(&self.url, "server sent an empty range"));
                    }
                    match total {
                        Some(total) if written >= total => break,
                        None if received < end - before + 1 => break,
                        _ => {}
                    }
                }
                _ if written == 0 => {
                    debug!("Server ignored the range request, reading the whole body");
                    let total = response.content_length();
                    copy_body(response, &mut file, &mut written, total, progress).await?;
                    break;
                }
                status => {
                    return Err(Error::fetch(
                        &self.url,
                        format!("unexpected status {} after {} bytes", status, written),
                    ));
                }
            }
        }

        file.flush().await?;
        progress(written, Some(written));
        Ok(written)
    }
}

async fn copy_body(
    response: reqwest::Response,
    file: &mut tokio::fs::File,
    written: &mut u64,
    total: Option<u64>,
    progress: &ProgressCallback<'_>,
) -> Result<()> {
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        *written += chunk.len() as u64;
        progress(*written, total);
    }
    Ok(())
}

/// The complete length from a `Content-Range: bytes 0-99/1234` header.
fn content_range_total(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_RANGE)?
        .to_str()
        .ok()?
        .rsplit('/')
        .next()?
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::tempdir;

    #[test]
    fn parses_content_range() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_RANGE, HeaderValue::from_static("bytes 0-99/1234"));
        assert_eq!(content_range_total(&headers), Some(1234));

        headers.insert(CONTENT_RANGE, HeaderValue::from_static("bytes 0-99/*"));
        assert_eq!(content_range_total(&headers), None);
    }

    #[tokio::test]
    async fn reads_whole_body_when_ranges_are_ignored() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/stream")
            .with_status(200)
            .with_body("hello world")
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let destination = dir.path().join("out.bin");
        let seen = Mutex::new(Vec::new());
        let progress = |done: u64, total: Option<u64>| seen.lock().unwrap().push((done, total));

        let written = Fetcher::new(format!("{}/stream", server.url()))
            .fetch_to(&destination, &progress)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(written, 11);
        assert_eq!(std::fs::read_to_string(&destination).unwrap(), "hello world");
        assert_eq!(seen.lock().unwrap().last(), Some(&(11, Some(11))));
    }

    #[tokio::test]
    async fn follows_ranges_until_complete() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/stream")
            .match_header("range", "bytes=0-3")
            .with_status(206)
            .with_header("content-range", "bytes 0-3/6")
            .with_body("abcd")
            .create_async()
            .await;
        let second = server
            .mock("GET", "/stream")
            .match_header("range", "bytes=4-5")
            .with_status(206)
            .with_header("content-range", "bytes 4-5/6")
            .with_body("ef")
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let destination = dir.path().join("out.bin");
        std::fs::write(&destination, "stale content that is longer").unwrap();

        let written = Fetcher::new(format!("{}/stream", server.url()))
            .with_chunk_size(4)
            .fetch_to(&destination, &|_, _| {})
            .await
            .unwrap();

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(written, 6);
        assert_eq!(std::fs::read_to_string(&destination).unwrap(), "abcdef");
    }

    #[tokio::test]
    async fn stops_at_unsatisfiable_range_when_total_is_unknown() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/stream")
            .match_header("range", "bytes=0-3")
            .with_status(206)
            .with_header("content-range", "bytes 0-3/*")
            .with_body("abcd")
            .create_async()
            .await;
        let past_end = server
            .mock("GET", "/stream")
            .match_header("range", "bytes=4-7")
            .with_status(416)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let destination = dir.path().join("out.bin");

        let written = Fetcher::new(format!("{}/stream", server.url()))
            .with_chunk_size(4)
            .fetch_to(&destination, &|_, _| {})
            .await
            .unwrap();

        first.assert_async().await;
        past_end.assert_async().await;
        assert_eq!(written, 4);
        assert_eq!(std::fs::read_to_string(&destination).unwrap(), "abcd");
    }

    #[tokio::test]
    async fn empty_resource_is_an_empty_file() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/empty")
            .with_status(416)
            .with_header("content-range", "bytes */0")
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let destination = dir.path().join("out.bin");

        let written = Fetcher::new(format!("{}/empty", server.url()))
            .fetch_to(&destination, &|_, _| {})
            .await
            .unwrap();

        assert_eq!(written, 0);
        assert_eq!(std::fs::metadata(&destination).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn unsatisfiable_range_before_the_end_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/stream")
            .with_status(416)
            .with_header("content-range", "bytes */10")
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let result = Fetcher::new(format!("{}/stream", server.url()))
            .fetch_to(&dir.path().join("out.bin"), &|_, _| {})
            .await;
        assert!(matches!(result, Err(Error::Fetch { .. })));
    }

    #[tokio::test]
    async fn http_errors_are_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/gone")
            .with_status(403)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let result = Fetcher::new(format!("{}/gone", server.url()))
            .fetch_to(&dir.path().join("out.bin"), &|_, _| {})
            .await;
        assert!(matches!(result, Err(Error::Reqwest(_))));
    }
}
