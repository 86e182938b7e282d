//! Fetcher Core Library
//!
//! A resilient single-file HTTP downloader: given a URL it picks a destination
//! filename (inferring the extension from the declared content type), decides
//! whether an existing file there should be kept, and otherwise streams the
//! body to disk while reporting progress.
//!
//! # Architecture
//!
//! - [`download`] - filename/extension resolution, existing-file policy,
//!   streaming client, and the pipeline that combines them

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
mod user_agent;

// Re-export commonly used types
pub use download::{
    DEFAULT_CONCURRENCY, DownloadError, DownloadOutcome, DownloadRequest, Downloader, ErrorKind,
    HttpClient, ProgressReporter, ResumePolicy, download_file,
};
