// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base values; built-in defaults when no file exists)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{validate_config, AxolemmaConfig, ConfigError, ConfigResult};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File name searched for when no explicit path is given.
pub const CONFIG_FILE_NAME: &str = "axolemma.toml";

/// Find the configuration file
///
/// Search order:
/// 1. `AXOLEMMA_CONFIG_PATH` environment variable
/// 2. Current working directory: `./axolemma.toml`
/// 3. Parent directories (up to 5 levels)
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("AXOLEMMA_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        } else {
            return Err(ConfigError::FileNotFound(format!(
                "Config file specified by AXOLEMMA_CONFIG_PATH not found: {}",
                path.display()
            )));
        }
    }

    let mut search_paths = Vec::new();

    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.clone();
        for _ in 0..5 {
            if let Some(parent) = current.parent() {
                search_paths.push(parent.join(CONFIG_FILE_NAME));
                current = parent.to_path_buf();
            }
        }
    }

    for path in &search_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet AXOLEMMA_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, the file is
///   searched for; when none exists the built-in defaults are used.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if an explicit file is missing, the TOML is invalid, an
/// `AXOLEMMA_CONFIG_PATH` points nowhere, or the result fails validation
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<AxolemmaConfig> {
    let config_file = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => match find_config_file() {
            Ok(path) => Some(path),
            Err(e) if env::var("AXOLEMMA_CONFIG_PATH").is_ok() => return Err(e),
            Err(_) => None,
        },
    };

    let mut config = match config_file {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.display().to_string()));
            }
            let content = fs::read_to_string(&path)?;
            toml::from_str(&content)?
        }
        None => AxolemmaConfig::default(),
    };

    apply_environment_overrides(&mut config)?;

    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli)?;
    }

    validate_config(&config)?;
    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `AXOLEMMA_DT_MS` -> `engine.dt_ms`
/// - `AXOLEMMA_HISTORY_CAPACITY` -> `engine.history_capacity`
/// - `AXOLEMMA_TICK_HZ` -> `engine.tick_frequency_hz`
/// - `AXOLEMMA_MAX_WALL_DELTA_MS` -> `engine.max_wall_delta_ms`
/// - `AXOLEMMA_LOG_LEVEL` -> `logging.level`
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` for a value that does not parse;
/// the configuration is left unchanged in that case.
pub fn apply_environment_overrides(config: &mut AxolemmaConfig) -> ConfigResult<()> {
    let mut updated = config.clone();
    let lookup = |key: &str| env::var(key).ok();

    override_with(&lookup, "AXOLEMMA_DT_MS", &mut updated.engine.dt_ms)?;
    override_with(&lookup, "AXOLEMMA_HISTORY_CAPACITY", &mut updated.engine.history_capacity)?;
    override_with(&lookup, "AXOLEMMA_TICK_HZ", &mut updated.engine.tick_frequency_hz)?;
    override_with(&lookup, "AXOLEMMA_MAX_WALL_DELTA_MS", &mut updated.engine.max_wall_delta_ms)?;
    if let Some(value) = lookup("AXOLEMMA_LOG_LEVEL") {
        updated.logging.level = value;
    }

    *config = updated;
    Ok(())
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - HashMap of CLI arguments (e.g., `{"dt_ms": "0.005", "ttx_block": "1"}`)
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` for a value that does not parse;
/// the configuration is left unchanged in that case.
pub fn apply_cli_overrides(
    config: &mut AxolemmaConfig,
    cli_args: &HashMap<String, String>,
) -> ConfigResult<()> {
    let mut updated = config.clone();
    let lookup = |key: &str| cli_args.get(key).cloned();

    // Engine
    override_with(&lookup, "dt_ms", &mut updated.engine.dt_ms)?;
    override_with(&lookup, "tick_hz", &mut updated.engine.tick_frequency_hz)?;
    override_with(&lookup, "max_wall_delta_ms", &mut updated.engine.max_wall_delta_ms)?;
    override_with(&lookup, "sim_ms_per_wall_ms", &mut updated.engine.sim_ms_per_wall_ms)?;
    override_with(&lookup, "history_capacity", &mut updated.engine.history_capacity)?;

    // Membrane
    override_with(&lookup, "resting_voltage", &mut updated.membrane.resting_voltage)?;
    override_with(&lookup, "ttx_block", &mut updated.membrane.ttx_block)?;
    override_with(&lookup, "tea_block", &mut updated.membrane.tea_block)?;
    if let Some(value) = lookup("pronase") {
        updated.membrane.pronase = parse_flag("pronase", &value)?;
    }

    // Stimulus
    override_with(&lookup, "stim1_amplitude", &mut updated.stimulus.stim1.amplitude)?;
    override_with(&lookup, "stim1_duration", &mut updated.stimulus.stim1.duration)?;
    override_with(&lookup, "stim2_amplitude", &mut updated.stimulus.stim2.amplitude)?;
    override_with(&lookup, "stim2_duration", &mut updated.stimulus.stim2.duration)?;

    // Logging
    if let Some(value) = lookup("log_level") {
        updated.logging.level = value;
    }
    if let Some(value) = lookup("log_format") {
        updated.logging.format = value;
    }

    *config = updated;
    Ok(())
}

fn override_with<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    target: &mut T,
) -> ConfigResult<()> {
    if let Some(value) = lookup(key) {
        *target = value.trim().parse().map_err(|_| {
            ConfigError::InvalidValue(format!("{}: cannot parse '{}'", key, value))
        })?;
    }
    Ok(())
}

fn parse_flag(key: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue(format!(
            "{}: expected true/false, got '{}'",
            key, value
        ))),
    }
}
