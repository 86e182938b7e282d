//! Existing-file policy: decide whether a download should run at all.
//!
//! The file on disk is compared against the declared `Content-Length`. A zero
//! or missing length means "unknown", and an unknown length can never match,
//! so any existing file counts as a mismatch.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use super::error::DownloadError;

/// State of the destination path relative to the declared length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistingFileState {
    /// Nothing exists at the destination.
    Absent,
    /// A file exists and its size equals the declared length.
    SizeMatches,
    /// A file exists and its size differs from (or cannot be checked against) the declared length.
    SizeMismatch {
        /// Size of the file on disk.
        on_disk: u64,
    },
}

/// The pair of flags governing whether an existing file is trusted or replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumePolicy {
    /// Skip when the existing file already has the declared size.
    pub ignore_completed: bool,
    /// Re-download when the existing file has the wrong size.
    pub redownload_broken: bool,
}

impl Default for ResumePolicy {
    fn default() -> Self {
        Self {
            ignore_completed: true,
            redownload_broken: true,
        }
    }
}

/// Why a download was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// The existing file has the declared size.
    Completed,
    /// The existing file does not have the declared size and the policy keeps it anyway.
    SizeMismatch {
        /// Size of the file on disk.
        on_disk: u64,
        /// Declared length, if the server sent one.
        expected: Option<u64>,
    },
}

/// Outcome of the existing-file policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileDecision {
    /// Run the body fetch and overwrite the destination.
    Proceed,
    /// Keep what is on disk.
    Skip {
        /// Path of the existing file.
        path: PathBuf,
        /// Why it was kept.
        reason: SkipReason,
    },
}

/// Inspects `path` and classifies it against `content_length`.
///
/// # Errors
///
/// Returns [`DownloadError::Io`] if the path cannot be stat'ed for a reason
/// other than not existing, or if it is a directory.
pub async fn inspect_existing(
    path: &Path,
    content_length: Option<u64>,
) -> Result<ExistingFileState, DownloadError> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ExistingFileState::Absent);
        }
        Err(e) => return Err(DownloadError::io(path, e)),
    };

    if metadata.is_dir() {
        return Err(DownloadError::io(
            path,
            std::io::Error::new(
                std::io::ErrorKind::IsADirectory,
                "destination is a directory",
            ),
        ));
    }

    let on_disk = metadata.len();
    let state = match content_length.filter(|len| *len > 0) {
        Some(expected) if expected == on_disk => ExistingFileState::SizeMatches,
        _ => ExistingFileState::SizeMismatch { on_disk },
    };
    debug!(path = %path.display(), on_disk, ?content_length, ?state, "inspected existing file");
    Ok(state)
}

/// Applies `policy` to an inspected state.
#[must_use]
pub fn decide(
    path: &Path,
    state: ExistingFileState,
    content_length: Option<u64>,
    policy: ResumePolicy,
) -> FileDecision {
    match state {
        ExistingFileState::Absent => FileDecision::Proceed,
        ExistingFileState::SizeMatches if policy.ignore_completed => FileDecision::Skip {
            path: path.to_path_buf(),
            reason: SkipReason::Completed,
        },
        ExistingFileState::SizeMatches => FileDecision::Proceed,
        ExistingFileState::SizeMismatch { .. } if policy.redownload_broken => {
            FileDecision::Proceed
        }
        ExistingFileState::SizeMismatch { on_disk } => {
            let expected = content_length.filter(|len| *len > 0);
            warn!(
                path = %path.display(),
                on_disk,
                ?expected,
                "keeping existing file with unexpected size (redownload of broken files disabled)"
            );
            FileDecision::Skip {
                path: path.to_path_buf(),
                reason: SkipReason::SizeMismatch { on_disk, expected },
            }
        }
    }
}

/// Inspects `path` and applies `policy` in one step.
///
/// # Errors
///
/// Propagates errors from [`inspect_existing`].
pub async fn evaluate_existing(
    path: &Path,
    content_length: Option<u64>,
    policy: ResumePolicy,
) -> Result<FileDecision, DownloadError> {
    let state = inspect_existing(path, content_length).await?;
    Ok(decide(path, state, content_length, policy))
}
