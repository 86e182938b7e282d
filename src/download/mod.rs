//! HTTP download pipeline for single files.
//!
//! This module resolves a destination filename (inferring the extension from
//! the server's declared content type), decides whether an existing file at
//! that path should be kept, and streams the body to disk otherwise.
//!
//! # Features
//!
//! - One metadata probe and one streaming body fetch per request
//! - Content-Type to extension mapping with URL-extension fallback
//! - Size-based skip/redownload policy for existing files
//! - Full overwrite on redownload (never appends)
//! - Pluggable progress reporting
//!
//! # Example
//!
//! ```no_run
//! use fetcher_core::download::{ConsoleProgress, DownloadRequest, Downloader};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let request = DownloadRequest::new("https://example.com/api/data")
//!     .destination_folder("./downloads");
//! let outcome = Downloader::default()
//!     .download(&request, &ConsoleProgress::new())
//!     .await?;
//! println!("Saved: {}", outcome.path().display());
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
pub mod content_type;
mod error;
pub mod existing;
pub mod filename;
mod progress;
mod request;
mod service;

pub use client::HttpClient;
pub use constants::{CHUNK_SIZE, DEFAULT_CONCURRENCY};
pub use content_type::{lookup_extension, resolve_extension};
pub use error::{DownloadError, ErrorKind};
pub use existing::{
    ExistingFileState, FileDecision, ResumePolicy, SkipReason, decide, evaluate_existing,
    inspect_existing,
};
pub use filename::{ExtensionSource, ResolvedFilename, resolve_filename};
pub use progress::{ByteCounter, ConsoleProgress, NoProgress, ProgressReporter};
pub use request::{DownloadOutcome, DownloadRequest, RemoteMetadata, ResolvedTarget};
pub use service::{Downloader, download_file};
