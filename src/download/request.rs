//! Request, metadata, and outcome types for a single download.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::existing::{ResumePolicy, SkipReason};

/// A single download request.
///
/// Built with chained setters and never mutated afterwards; the pipeline only
/// borrows it.
///
/// ```
/// use fetcher_core::download::DownloadRequest;
///
/// let request = DownloadRequest::new("https://example.com/data")
///     .destination_folder("./downloads")
///     .redownload_broken(false);
/// assert_eq!(request.url(), "https://example.com/data");
/// assert!(request.resume_policy().ignore_completed);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    url: String,
    destination_folder: Option<PathBuf>,
    filename: Option<String>,
    file_format: Option<String>,
    policy: ResumePolicy,
}

impl DownloadRequest {
    /// Creates a request with default policy, saving into the current directory.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            destination_folder: None,
            filename: None,
            file_format: None,
            policy: ResumePolicy::default(),
        }
    }

    /// Sets the folder the file is saved into (created if absent).
    #[must_use]
    pub fn destination_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.destination_folder = Some(folder.into());
        self
    }

    /// Overrides the base filename taken from the URL.
    #[must_use]
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Overrides the extension inferred from the content type.
    #[must_use]
    pub fn file_format(mut self, format: impl Into<String>) -> Self {
        self.file_format = Some(format.into());
        self
    }

    /// Skip when an existing file already has the declared size (default `true`).
    #[must_use]
    pub fn ignore_completed(mut self, value: bool) -> Self {
        self.policy.ignore_completed = value;
        self
    }

    /// Re-download when an existing file has the wrong size (default `true`).
    #[must_use]
    pub fn redownload_broken(mut self, value: bool) -> Self {
        self.policy.redownload_broken = value;
        self
    }

    /// Replaces both policy flags at once.
    #[must_use]
    pub fn with_policy(self, policy: ResumePolicy) -> Self {
        Self { policy, ..self }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Explicit destination folder, or `None` for the current directory.
    #[must_use]
    pub fn folder(&self) -> Option<&Path> {
        self.destination_folder.as_deref()
    }

    #[must_use]
    pub fn explicit_filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    #[must_use]
    pub fn explicit_format(&self) -> Option<&str> {
        self.file_format.as_deref()
    }

    #[must_use]
    pub fn resume_policy(&self) -> ResumePolicy {
        self.policy
    }
}

/// Headers learned from the metadata probe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteMetadata {
    /// Declared `Content-Type`, if any.
    pub content_type: Option<String>,
    /// Declared `Content-Length`, if any.
    pub content_length: Option<u64>,
}

impl RemoteMetadata {
    /// Declared length, treating zero as unknown.
    #[must_use]
    pub fn known_length(&self) -> Option<u64> {
        self.content_length.filter(|len| *len > 0)
    }

    /// Declared content type, treating blank values as absent.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type
            .as_deref()
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
    }
}

/// Destination computed once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    file_path: PathBuf,
    filename: String,
}

impl ResolvedTarget {
    pub(crate) fn new(folder: &Path, filename: String) -> Self {
        Self {
            file_path: folder.join(&filename),
            filename,
        }
    }

    /// Absolute destination path.
    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Final filename component.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }
}

/// Result of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DownloadOutcome {
    /// Nothing was fetched; the existing file was kept.
    Skipped {
        /// Path of the kept file.
        path: PathBuf,
        /// Why it was kept.
        reason: SkipReason,
    },
    /// The body was streamed to disk.
    Downloaded {
        /// Path of the written file.
        path: PathBuf,
        /// Bytes streamed, not necessarily equal to the declared length.
        bytes: u64,
    },
}

impl DownloadOutcome {
    /// Path of the file on disk, for both skipped and downloaded outcomes.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Skipped { path, .. } | Self::Downloaded { path, .. } => path,
        }
    }

    /// Consumes the outcome, returning its path.
    #[must_use]
    pub fn into_path(self) -> PathBuf {
        match self {
            Self::Skipped { path, .. } | Self::Downloaded { path, .. } => path,
        }
    }

    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}
