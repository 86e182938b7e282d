//! HTTP client wrapper for probing and streaming downloads.
//!
//! This module provides the `HttpClient` struct: one HEAD-style metadata probe
//! and one streaming GET per download, with the body written in bounded chunks.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument, warn};

use super::constants::{CHUNK_SIZE, CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use super::progress::ProgressReporter;
use super::request::RemoteMetadata;
use crate::user_agent;

/// HTTP client for probing and downloading files.
///
/// This client is designed to be created once and reused for multiple downloads,
/// taking advantage of connection pooling. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes without receiving any bytes
    /// - No transparent decompression: bytes on disk are the bytes the
    ///   server's `Content-Length` describes
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_timeouts(connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        let client = build_client(connect_timeout_secs, read_timeout_secs)
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Issues the metadata probe (HEAD) for `url`.
    ///
    /// A non-success status is not an error here: some servers reject HEAD
    /// outright, so the probe degrades to unknown metadata and the body fetch
    /// reports the real status.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Network`] or [`DownloadError::Timeout`] when
    /// the request cannot be completed.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn probe(&self, url: &str) -> Result<RemoteMetadata, DownloadError> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                status = status.as_u16(),
                "metadata probe rejected; continuing with unknown content type and length"
            );
            return Ok(RemoteMetadata::default());
        }

        let metadata = metadata_from_headers(response.headers());
        debug!(
            content_type = ?metadata.content_type,
            content_length = ?metadata.content_length,
            "metadata probe complete"
        );
        Ok(metadata)
    }

    /// Streams the body of `url` into `file_path`, returning bytes written.
    ///
    /// The file is created or truncated only after the server answered with a
    /// success status, and is never appended to. Each slice of at most
    /// [`CHUNK_SIZE`] bytes is written and then reported to `progress`.
    ///
    /// A failure part-way leaves the partially written file in place.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The request fails (network error, timeout)
    /// - The server returns an error status (4xx, 5xx)
    /// - Creating or writing the file fails
    #[instrument(skip(self, progress), fields(url = %url, path = %file_path.display()))]
    pub async fn stream_to_file(
        &self,
        url: &str,
        file_path: &Path,
        label: &str,
        progress: &dyn ProgressReporter,
    ) -> Result<u64, DownloadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        let total = content_length(response.headers());
        let file = File::create(file_path)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;

        progress.on_start(label, total);
        let bytes_written = write_chunks(file, response, url, file_path, progress).await?;
        progress.on_finish();

        debug!(bytes = bytes_written, declared = ?total, "body stream complete");
        Ok(bytes_written)
    }
}

/// Writes the response body to `file` in slices of at most [`CHUNK_SIZE`] bytes.
async fn write_chunks(
    file: File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
    progress: &dyn ProgressReporter,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::with_capacity(CHUNK_SIZE * 8, file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(frame) = stream.next().await {
        let frame = frame.map_err(|e| DownloadError::network(url, e))?;

        for chunk in frame.chunks(CHUNK_SIZE) {
            writer
                .write_all(chunk)
                .await
                .map_err(|e| DownloadError::io(file_path, e))?;
            let len = chunk.len() as u64;
            bytes_written += len;
            progress.on_chunk(len);
        }
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}

fn metadata_from_headers(headers: &HeaderMap) -> RemoteMetadata {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    RemoteMetadata {
        content_type,
        content_length: content_length(headers),
    }
}

// Read from the header rather than Response::content_length(), which reports
// the (empty) body size for HEAD responses.
fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|len| *len > 0)
}

fn build_client(connect_timeout_secs: u64, read_timeout_secs: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .read_timeout(Duration::from_secs(read_timeout_secs))
        .user_agent(user_agent::default_download_user_agent())
        .build()
}
