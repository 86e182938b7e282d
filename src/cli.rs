//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Download files over HTTP(S), naming them from the server's content type.
///
/// Existing files with the declared size are skipped; files with the wrong
/// size are downloaded again from scratch.
#[derive(Parser, Debug)]
#[command(name = "fetcher")]
#[command(author, version, about)]
pub struct Args {
    /// URLs to download
    #[arg(required = true, value_name = "URL")]
    pub urls: Vec<String>,

    /// Folder to save into (created if missing; default: current directory)
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Base filename to use instead of the URL's last path segment (single URL only)
    #[arg(short = 'n', long, value_name = "NAME")]
    pub filename: Option<String>,

    /// Extension to use instead of the one inferred from Content-Type
    #[arg(short = 'f', long = "format", value_name = "EXT")]
    pub file_format: Option<String>,

    /// Download again even when an existing file already has the declared size
    #[arg(long)]
    pub no_skip_completed: bool,

    /// Keep existing files whose size does not match instead of re-downloading them
    #[arg(long)]
    pub keep_broken: bool,

    /// Maximum concurrent downloads (1-32)
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..=32))]
    pub concurrency: Option<u8>,

    /// HTTP connect timeout in seconds (1-3600)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: Option<u64>,

    /// Seconds to wait for more data before aborting a transfer (1-3600)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout: Option<u64>,

    /// Print one JSON object per URL on stdout instead of text
    #[arg(long)]
    pub json: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}
