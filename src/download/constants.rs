//! Constants for the download module (timeouts, chunking, concurrency).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default idle timeout between reads (5 minutes). Total transfer time is not capped.
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Upper bound, in bytes, of each slice written to disk and reported to progress.
pub const CHUNK_SIZE: usize = 1024;

/// Default number of requests the CLI runs at once.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Base name used when a URL has no usable last path segment.
pub const FALLBACK_BASE_NAME: &str = "download";
