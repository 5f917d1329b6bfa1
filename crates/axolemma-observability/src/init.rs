// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console logging (text or JSON) for every build; with the `file-logging`
//! feature, per-run log folders with daily rotation and retention cleanup.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;
use crate::config::{LogFormat, LoggingConfig};

const RUN_DIR_PREFIX: &str = "run_";
const RUN_DIR_TIMESTAMP: &str = "%Y%m%d_%H%M%S";

/// Build the `EnvFilter` for the given flags
///
/// With no debug flags set, a `RUST_LOG` value takes precedence over
/// `base_level`.
pub fn build_env_filter(debug_flags: &CrateDebugFlags, base_level: &str) -> Result<EnvFilter> {
    if !debug_flags.any_enabled() {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
    }
    let directives = debug_flags.to_filter_string_with_base(base_level);
    EnvFilter::try_new(&directives)
        .with_context(|| format!("Invalid log filter directives: {}", directives))
}

/// Initialize console-only logging
///
/// Fails if a global subscriber is already installed.
pub fn init_console_logging(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<()> {
    let env_filter = build_env_filter(debug_flags, &config.level)?;

    let console_layer = match config.format {
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .with_writer(std::io::stderr)
            .with_filter(env_filter)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_filter(env_filter)
            .boxed(),
    };

    Registry::default()
        .with(console_layer)
        .try_init()
        .context("Failed to install global tracing subscriber")?;
    Ok(())
}

/// Logging initialization result; dropping it flushes the file writers
#[cfg(feature = "file-logging")]
pub struct LoggingGuard {
    _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
    log_dir: PathBuf,
}

#[cfg(feature = "file-logging")]
impl LoggingGuard {
    /// Get the log directory path
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

/// Initialize logging with file output and console output
///
/// Creates a timestamped folder structure:
/// ```text
/// ./logs/
///   └── run_20250101_120000/
///       ├── axolemma-engine.log
///       ├── axolemma-membrane.log
///       └── axolemma.log (combined)
/// ```
#[cfg(feature = "file-logging")]
pub fn init_logging(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<LoggingGuard> {
    use tracing_appender::rolling;

    let timestamp = Utc::now().format(RUN_DIR_TIMESTAMP);
    let run_folder = config
        .log_dir
        .join(format!("{}{}", RUN_DIR_PREFIX, timestamp));
    std::fs::create_dir_all(&run_folder)
        .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;

    cleanup_old_logs(&config.log_dir, config.retention_days, config.retention_runs)?;

    let env_filter = build_env_filter(debug_flags, &config.level)?;

    let mut layers = Vec::new();
    let mut file_guards = Vec::new();

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(env_filter.clone())
        .boxed();
    layers.push(console_layer);

    // One file per simulator crate
    for crate_name in crate::KNOWN_CRATES {
        let file_appender = rolling::daily(&run_folder, format!("{}.log", crate_name));
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        file_guards.push(guard);

        let crate_filter = EnvFilter::try_new(format!("{}=debug", crate::crate_target(crate_name)))
            .with_context(|| format!("Invalid log filter for {}", crate_name))?;
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .with_filter(crate_filter)
            .boxed();
        layers.push(file_layer);
    }

    let combined_appender = rolling::daily(&run_folder, "axolemma.log");
    let (combined_non_blocking, combined_guard) = tracing_appender::non_blocking(combined_appender);
    file_guards.push(combined_guard);

    let combined_layer = tracing_subscriber::fmt::layer()
        .with_writer(combined_non_blocking)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .json()
        .with_filter(env_filter)
        .boxed();
    layers.push(combined_layer);

    Registry::default()
        .with(layers)
        .try_init()
        .context("Failed to install global tracing subscriber")?;

    Ok(LoggingGuard {
        _file_guards: file_guards,
        log_dir: run_folder,
    })
}

/// Clean up old run folders under `base_log_dir`
///
/// Folders older than `retention_days` go first; of the rest only the
/// `retention_runs` most recent are kept. Returns the number removed.
pub fn cleanup_old_logs(
    base_log_dir: &Path,
    retention_days: u64,
    retention_runs: usize,
) -> Result<usize> {
    cleanup_old_logs_at(base_log_dir, retention_days, retention_runs, Utc::now())
}

fn parse_run_dir(path: &Path) -> Option<DateTime<Utc>> {
    let dir_name = path.file_name()?.to_str()?;
    let timestamp_str = dir_name.strip_prefix(RUN_DIR_PREFIX)?;
    let naive = NaiveDateTime::parse_from_str(timestamp_str, RUN_DIR_TIMESTAMP).ok()?;
    Some(Utc.from_utc_datetime(&naive))
}

fn cleanup_old_logs_at(
    base_log_dir: &Path,
    retention_days: u64,
    retention_runs: usize,
    now: DateTime<Utc>,
) -> Result<usize> {
    if !base_log_dir.exists() {
        return Ok(0);
    }

    let cutoff_date = now - chrono::Duration::days(retention_days as i64);

    let mut runs: Vec<(PathBuf, DateTime<Utc>)> = Vec::new();
    for entry in std::fs::read_dir(base_log_dir)? {
        let path = entry?.path();
        if path.is_dir() {
            if let Some(dt) = parse_run_dir(&path) {
                runs.push((path, dt));
            }
        }
    }

    // Oldest first
    runs.sort_by_key(|(_, dt)| *dt);

    let expired = runs.iter().take_while(|(_, dt)| *dt < cutoff_date).count();
    let excess = (runs.len() - expired).saturating_sub(retention_runs);

    let mut removed = 0;
    for (path, _) in runs.iter().take(expired + excess) {
        if let Err(e) = std::fs::remove_dir_all(path) {
            eprintln!(
                "Warning: Failed to remove old log directory {}: {}",
                path.display(),
                e
            );
        } else {
            removed += 1;
        }
    }

    Ok(removed)
}
