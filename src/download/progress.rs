//! Progress reporting for streaming writes.
//!
//! Reporters are purely observational: they receive byte counts and cannot
//! fail or influence the download.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

const BAR_TEMPLATE: &str =
    "{msg} [{elapsed_precise}] {wide_bar:.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";
const SPINNER_TEMPLATE: &str = "{spinner} {msg} [{elapsed_precise}] {bytes} ({bytes_per_sec})";

/// Receives byte-level progress for one download.
pub trait ProgressReporter: Send + Sync {
    /// Called once before the first chunk. `total` is `None` when the length is unknown.
    fn on_start(&self, _label: &str, _total: Option<u64>) {}

    /// Called after each chunk has been written.
    fn on_chunk(&self, bytes: u64);

    /// Called once after the last chunk has been flushed.
    fn on_finish(&self) {}
}

/// Reporter that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn on_chunk(&self, _bytes: u64) {}
}

/// Headless reporter that only counts.
#[derive(Debug, Default)]
pub struct ByteCounter {
    bytes: AtomicU64,
    chunks: AtomicU64,
    total: AtomicU64,
}

impl ByteCounter {
    /// Creates a zeroed counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cumulative bytes reported so far.
    #[must_use]
    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    /// Number of `on_chunk` calls so far.
    #[must_use]
    pub fn chunks(&self) -> u64 {
        self.chunks.load(Ordering::Relaxed)
    }

    /// Total announced in `on_start`, or `None` when unknown.
    #[must_use]
    pub fn total(&self) -> Option<u64> {
        match self.total.load(Ordering::Relaxed) {
            0 => None,
            total => Some(total),
        }
    }
}

impl ProgressReporter for ByteCounter {
    fn on_start(&self, _label: &str, total: Option<u64>) {
        self.total.store(total.unwrap_or(0), Ordering::Relaxed);
    }

    fn on_chunk(&self, bytes: u64) {
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
        self.chunks.fetch_add(1, Ordering::Relaxed);
    }
}

/// Console progress bar backed by indicatif.
///
/// The bar is created on `on_start`, so a request that is skipped or fails
/// before its body arrives never draws anything. A known total renders a bar;
/// an unknown or zero total renders a spinner with a running byte count. A bar
/// that never reached `on_finish` is cleared when the reporter is dropped.
pub struct ConsoleProgress {
    group: Option<MultiProgress>,
    hidden: bool,
    bar: OnceLock<ProgressBar>,
}

impl ConsoleProgress {
    /// Creates a standalone bar drawn to stderr.
    #[must_use]
    pub fn new() -> Self {
        Self {
            group: None,
            hidden: false,
            bar: OnceLock::new(),
        }
    }

    /// Creates a bar that is never drawn (quiet and machine-readable modes).
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            group: None,
            hidden: true,
            bar: OnceLock::new(),
        }
    }

    /// Creates a bar that joins a shared [`MultiProgress`] once the body starts.
    #[must_use]
    pub fn in_group(group: &MultiProgress) -> Self {
        Self {
            group: Some(group.clone()),
            hidden: false,
            bar: OnceLock::new(),
        }
    }

    /// Cumulative bytes drawn so far.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.bar.get().map_or(0, ProgressBar::position)
    }

    fn create_bar(&self, total: Option<u64>) -> ProgressBar {
        let bar = match (self.hidden, total) {
            (true, _) => ProgressBar::hidden(),
            (false, Some(len)) => ProgressBar::new(len),
            (false, None) => ProgressBar::no_length(),
        };
        match &self.group {
            Some(group) => group.add(bar),
            None => bar,
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ConsoleProgress {
    fn drop(&mut self) {
        if let Some(bar) = self.bar.get()
            && !bar.is_finished()
        {
            bar.finish_and_clear();
        }
    }
}

impl ProgressReporter for ConsoleProgress {
    fn on_start(&self, label: &str, total: Option<u64>) {
        let total = total.filter(|len| *len > 0);
        let bar = self.bar.get_or_init(|| self.create_bar(total));
        match total {
            Some(len) => {
                bar.set_length(len);
                bar.set_style(
                    ProgressStyle::with_template(BAR_TEMPLATE)
                        .unwrap_or_else(|_| ProgressStyle::default_bar()),
                );
            }
            None => {
                bar.set_style(
                    ProgressStyle::with_template(SPINNER_TEMPLATE)
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
            }
        }
        bar.set_message(label.to_string());
    }

    fn on_chunk(&self, bytes: u64) {
        if let Some(bar) = self.bar.get() {
            bar.inc(bytes);
        }
    }

    fn on_finish(&self) {
        if let Some(bar) = self.bar.get() {
            bar.finish();
        }
    }
}
