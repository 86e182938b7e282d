//! CLI entry point for the fetcher tool.

use std::process::ExitCode;

use anyhow::{Result, bail};
use clap::Parser;
use fetcher_core::download::ConsoleProgress;
use fetcher_core::{DownloadError, DownloadOutcome, DownloadRequest, Downloader, HttpClient};
use futures_util::StreamExt;
use futures_util::stream;
use indicatif::{MultiProgress, ProgressDrawTarget};
use tracing::{debug, error, info};

mod app_config;
mod cli;

use app_config::{Settings, load_default_file_config, resolve_settings};
use cli::Args;

/// Exit code when at least one download failed.
const EXIT_DOWNLOAD_FAILED: u8 = 2;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    let loaded_config = load_default_file_config()?;
    let settings = resolve_settings(&args, loaded_config.config.as_ref());

    // RUST_LOG env var wins over the resolved level
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(settings.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");
    debug!(
        path = ?loaded_config.path,
        loaded = loaded_config.config.is_some(),
        ?settings,
        "configuration resolved"
    );

    if args.filename.is_some() && args.urls.len() > 1 {
        bail!("--filename can only be used with a single URL");
    }

    let urls = dedup_urls(&args.urls);
    let requests: Vec<DownloadRequest> = urls
        .iter()
        .map(|url| build_request(url, &args, &settings))
        .collect();

    let downloader = Downloader::new(HttpClient::new_with_timeouts(
        settings.connect_timeout_secs,
        settings.read_timeout_secs,
    ));

    let bars = if args.quiet || args.json {
        MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
    } else {
        MultiProgress::new()
    };

    let results: Vec<(DownloadRequest, Result<DownloadOutcome, DownloadError>)> =
        stream::iter(requests)
            .map(|request| {
                let downloader = downloader.clone();
                let progress = ConsoleProgress::in_group(&bars);
                async move {
                    let result = downloader.download(&request, &progress).await;
                    (request, result)
                }
            })
            .buffer_unordered(settings.concurrency)
            .collect()
            .await;

    let mut failed = 0_usize;
    let mut skipped = 0_usize;
    for (request, result) in &results {
        match result {
            Ok(outcome) => {
                if outcome.is_skipped() {
                    skipped += 1;
                }
                report_outcome(request.url(), outcome, args.json)?;
            }
            Err(e) => {
                failed += 1;
                error!(url = %request.url(), error = %e, "download failed");
                if args.json {
                    report_failure(request.url(), e);
                }
            }
        }
    }

    info!(
        total = results.len(),
        downloaded = results.len() - skipped - failed,
        skipped,
        failed,
        "Run complete"
    );

    if failed > 0 {
        Ok(ExitCode::from(EXIT_DOWNLOAD_FAILED))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Removes repeated URLs, keeping first-seen order.
fn dedup_urls(urls: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut unique = Vec::with_capacity(urls.len());
    for url in urls {
        if seen.insert(url.as_str()) {
            unique.push(url.clone());
        }
    }
    unique
}

fn build_request(url: &str, args: &Args, settings: &Settings) -> DownloadRequest {
    let mut request = DownloadRequest::new(url).with_policy(settings.policy);
    if let Some(folder) = &settings.output_dir {
        request = request.destination_folder(folder);
    }
    if let Some(filename) = &args.filename {
        request = request.filename(filename);
    }
    if let Some(format) = &args.file_format {
        request = request.file_format(format);
    }
    request
}

fn report_outcome(url: &str, outcome: &DownloadOutcome, json: bool) -> Result<()> {
    if json {
        let mut value = serde_json::to_value(outcome)?;
        value["url"] = serde_json::Value::from(url);
        println!("{value}");
        return Ok(());
    }

    match outcome {
        DownloadOutcome::Downloaded { path, bytes } => {
            println!("downloaded {} ({bytes} bytes)", path.display());
        }
        DownloadOutcome::Skipped { path, reason } => {
            println!("skipped {} ({reason:?})", path.display());
        }
    }
    Ok(())
}

fn report_failure(url: &str, error: &DownloadError) {
    let value = serde_json::json!({
        "url": url,
        "status": "failed",
        "kind": error.kind().as_str(),
        "error": error.to_string(),
    });
    println!("{value}");
}
