//! Configuration file loading and merging with CLI flags.
//!
//! The file is a flat list of `key = value` lines with `#` comments. Explicit
//! CLI flags always win over file values, which win over built-in defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use fetcher_core::{DEFAULT_CONCURRENCY, ResumePolicy};
use fetcher_core::download::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};

use crate::cli::Args;

/// File-backed defaults for the CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Default destination folder.
    pub output_dir: Option<PathBuf>,
    /// Default for skipping files that already have the declared size.
    pub ignore_completed: Option<bool>,
    /// Default for re-downloading files with the wrong size.
    pub redownload_broken: Option<bool>,
    /// Default concurrency (1..=32).
    pub concurrency: Option<u8>,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Idle read timeout in seconds.
    pub read_timeout_secs: Option<u64>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(concurrency) = self.concurrency
            && !(1..=32).contains(&concurrency)
        {
            bail!("Invalid config value for `concurrency`: {concurrency}. Expected range: 1..=32");
        }
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    fn log_level(self) -> &'static str {
        match self {
            Self::Default => "info",
            Self::Verbose => "debug",
            Self::Quiet => "error",
            Self::Debug => "trace",
        }
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/fetcher/config.toml`
/// 2. `$HOME/.config/fetcher/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("fetcher")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("fetcher")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from the default path if present.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(load_file_config(path_ref)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_no = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let invalid = || format!("Invalid `{key}` value on line {line_no}");

        match key {
            "output_dir" => {
                cfg.output_dir = Some(PathBuf::from(
                    parse_string_literal(value).with_context(invalid)?,
                ));
            }
            "ignore_completed" => {
                cfg.ignore_completed = Some(parse_boolean(value).with_context(invalid)?);
            }
            "redownload_broken" => {
                cfg.redownload_broken = Some(parse_boolean(value).with_context(invalid)?);
            }
            "concurrency" => {
                let parsed = parse_integer_u64(value).with_context(invalid)?;
                let n = u8::try_from(parsed)
                    .map_err(|_| anyhow::anyhow!("Integer value out of range for u8"))
                    .with_context(invalid)?;
                cfg.concurrency = Some(n);
            }
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "read_timeout_secs" => {
                cfg.read_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_no}")
                })?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}

fn parse_boolean(raw_value: &str) -> Result<bool> {
    match raw_value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Expected 'true' or 'false'"),
    }
}

/// Effective settings after merging CLI flags over file config over defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub output_dir: Option<PathBuf>,
    pub policy: ResumePolicy,
    pub concurrency: usize,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub log_level: &'static str,
}

/// Merges parsed CLI arguments over an optional file config.
pub fn resolve_settings(args: &Args, file: Option<&FileConfig>) -> Settings {
    let file = file.cloned().unwrap_or_default();
    let defaults = ResumePolicy::default();

    let policy = ResumePolicy {
        ignore_completed: if args.no_skip_completed {
            false
        } else {
            file.ignore_completed.unwrap_or(defaults.ignore_completed)
        },
        redownload_broken: if args.keep_broken {
            false
        } else {
            file.redownload_broken.unwrap_or(defaults.redownload_broken)
        },
    };

    // Priority: quiet flag > verbose flag > config verbosity > default (info)
    let log_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => file
                .verbosity
                .map_or("info", VerbositySetting::log_level),
            1 => "debug",
            _ => "trace",
        }
    };

    Settings {
        output_dir: args.output_dir.clone().or(file.output_dir),
        policy,
        concurrency: args
            .concurrency
            .or(file.concurrency)
            .map_or(DEFAULT_CONCURRENCY, usize::from),
        connect_timeout_secs: args
            .connect_timeout
            .or(file.connect_timeout_secs)
            .unwrap_or(CONNECT_TIMEOUT_SECS),
        read_timeout_secs: args
            .read_timeout
            .or(file.read_timeout_secs)
            .unwrap_or(READ_TIMEOUT_SECS),
        log_level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["fetcher"];
        argv.extend_from_slice(extra);
        argv.push("https://example.com/data");
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parse_config_all_fields() {
        let cfg = parse_config_str(
            r#"
            # defaults for the lab machine
            output_dir = "/data/downloads" # trailing comment
            ignore_completed = false
            redownload_broken = true
            concurrency = 8
            connect_timeout_secs = 10
            read_timeout_secs = 600
            verbosity = "quiet"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.output_dir, Some(PathBuf::from("/data/downloads")));
        assert_eq!(cfg.ignore_completed, Some(false));
        assert_eq!(cfg.redownload_broken, Some(true));
        assert_eq!(cfg.concurrency, Some(8));
        assert_eq!(cfg.connect_timeout_secs, Some(10));
        assert_eq!(cfg.read_timeout_secs, Some(600));
        assert_eq!(cfg.verbosity, Some(VerbositySetting::Quiet));
    }

    #[test]
    fn test_parse_config_hash_inside_string_is_kept() {
        let cfg = parse_config_str(r#"output_dir = "/tmp/#1""#).unwrap();
        assert_eq!(cfg.output_dir, Some(PathBuf::from("/tmp/#1")));
    }

    #[test]
    fn test_parse_config_rejects_unknown_key() {
        let err = parse_config_str("rate_limit = 5").unwrap_err();
        assert!(err.to_string().contains("Unknown configuration key"));
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_parse_config_rejects_bad_values() {
        assert!(parse_config_str("ignore_completed = yes").is_err());
        assert!(parse_config_str("output_dir = /no/quotes").is_err());
        assert!(parse_config_str("concurrency = 0").is_err());
        assert!(parse_config_str("concurrency = 300").is_err());
        assert!(parse_config_str("read_timeout_secs = 0").is_err());
        assert!(parse_config_str("verbosity = \"loud\"").is_err());
        assert!(parse_config_str("just some text").is_err());
    }

    #[test]
    fn test_resolve_settings_defaults_without_file() {
        let settings = resolve_settings(&args(&[]), None);
        assert_eq!(settings.output_dir, None);
        assert_eq!(settings.policy, ResumePolicy::default());
        assert_eq!(settings.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(settings.connect_timeout_secs, CONNECT_TIMEOUT_SECS);
        assert_eq!(settings.read_timeout_secs, READ_TIMEOUT_SECS);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_resolve_settings_file_values_apply_when_cli_unset() {
        let file = FileConfig {
            output_dir: Some(PathBuf::from("/from/file")),
            ignore_completed: Some(false),
            redownload_broken: Some(false),
            concurrency: Some(2),
            connect_timeout_secs: Some(7),
            read_timeout_secs: Some(70),
            verbosity: Some(VerbositySetting::Verbose),
        };
        let settings = resolve_settings(&args(&[]), Some(&file));
        assert_eq!(settings.output_dir, Some(PathBuf::from("/from/file")));
        assert!(!settings.policy.ignore_completed);
        assert!(!settings.policy.redownload_broken);
        assert_eq!(settings.concurrency, 2);
        assert_eq!(settings.connect_timeout_secs, 7);
        assert_eq!(settings.read_timeout_secs, 70);
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn test_resolve_settings_cli_overrides_file() {
        let file = FileConfig {
            output_dir: Some(PathBuf::from("/from/file")),
            ignore_completed: Some(true),
            concurrency: Some(2),
            verbosity: Some(VerbositySetting::Verbose),
            ..FileConfig::default()
        };
        let settings = resolve_settings(
            &args(&["-o", "/from/cli", "--no-skip-completed", "-c", "9", "-q"]),
            Some(&file),
        );
        assert_eq!(settings.output_dir, Some(PathBuf::from("/from/cli")));
        assert!(!settings.policy.ignore_completed);
        assert!(settings.policy.redownload_broken);
        assert_eq!(settings.concurrency, 9);
        assert_eq!(settings.log_level, "error");
    }
}
