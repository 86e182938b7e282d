//! The download pipeline: probe, name, decide, stream.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};
use url::Url;

use super::client::HttpClient;
use super::error::DownloadError;
use super::existing::{FileDecision, evaluate_existing};
use super::filename::resolve_filename;
use super::progress::{NoProgress, ProgressReporter};
use super::request::{DownloadOutcome, DownloadRequest, RemoteMetadata, ResolvedTarget};

/// Runs [`DownloadRequest`]s against a shared [`HttpClient`].
///
/// Requests share no state besides the connection pool, so one `Downloader`
/// can drive many requests concurrently. Two requests that resolve to the
/// same path must not run at the same time.
#[derive(Debug, Clone, Default)]
pub struct Downloader {
    client: HttpClient,
}

impl Downloader {
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Executes one request end to end.
    ///
    /// Steps: create the destination folder, probe metadata once, resolve the
    /// filename, apply the existing-file policy, and stream the body only when
    /// the policy says to proceed.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::InvalidUrl`] before any I/O for a malformed URL
    /// - network errors from the probe or body fetch
    /// - [`DownloadError::Io`] for folder creation, stat, or write failures
    #[instrument(skip(self, request, progress), fields(url = %request.url()))]
    pub async fn download(
        &self,
        request: &DownloadRequest,
        progress: &dyn ProgressReporter,
    ) -> Result<DownloadOutcome, DownloadError> {
        let url = parse_url(request.url())?;
        let folder = prepare_folder(request.folder()).await?;

        let metadata = self.client.probe(request.url()).await?;
        let target = target_for(&url, request, &metadata, &folder);
        debug!(path = %target.file_path().display(), "resolved target");

        let decision = evaluate_existing(
            target.file_path(),
            metadata.known_length(),
            request.resume_policy(),
        )
        .await?;

        if let FileDecision::Skip { path, reason } = decision {
            info!(path = %path.display(), ?reason, "skipping download");
            return Ok(DownloadOutcome::Skipped { path, reason });
        }

        let bytes = self
            .client
            .stream_to_file(
                request.url(),
                target.file_path(),
                target.filename(),
                progress,
            )
            .await?;

        info!(path = %target.file_path().display(), bytes, "download complete");
        Ok(DownloadOutcome::Downloaded {
            path: target.file_path().to_path_buf(),
            bytes,
        })
    }

    /// Computes the destination for `request` from already-probed metadata.
    ///
    /// Creates the destination folder if needed, so the returned path is
    /// absolute and its parent exists.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidUrl`] or [`DownloadError::Io`].
    pub async fn resolve_target(
        &self,
        request: &DownloadRequest,
        metadata: &RemoteMetadata,
    ) -> Result<ResolvedTarget, DownloadError> {
        let url = parse_url(request.url())?;
        let folder = prepare_folder(request.folder()).await?;
        Ok(target_for(&url, request, metadata, &folder))
    }
}

/// Downloads `request` with a default client and no progress output.
///
/// Returns the destination path whether the file was downloaded or kept.
///
/// # Errors
///
/// See [`Downloader::download`].
pub async fn download_file(request: &DownloadRequest) -> Result<PathBuf, DownloadError> {
    Downloader::default()
        .download(request, &NoProgress)
        .await
        .map(DownloadOutcome::into_path)
}

fn parse_url(raw: &str) -> Result<Url, DownloadError> {
    let url = Url::parse(raw).map_err(|_| DownloadError::invalid_url(raw))?;
    if matches!(url.scheme(), "http" | "https") {
        Ok(url)
    } else {
        Err(DownloadError::invalid_url(raw))
    }
}

fn target_for(
    url: &Url,
    request: &DownloadRequest,
    metadata: &RemoteMetadata,
    folder: &Path,
) -> ResolvedTarget {
    let resolved = resolve_filename(
        url,
        request.explicit_filename(),
        metadata.content_type(),
        request.explicit_format(),
    );
    ResolvedTarget::new(folder, resolved.filename)
}

/// Creates the destination folder and returns it as an absolute path.
async fn prepare_folder(folder: Option<&Path>) -> Result<PathBuf, DownloadError> {
    let folder = match folder {
        Some(folder) => folder.to_path_buf(),
        None => std::env::current_dir().map_err(|e| DownloadError::io(".", e))?,
    };
    tokio::fs::create_dir_all(&folder)
        .await
        .map_err(|e| DownloadError::io(&folder, e))?;
    std::path::absolute(&folder).map_err(|e| DownloadError::io(&folder, e))
}
