// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! This module checks that every configured value is finite and inside its
//! physical or operational range. All violations are collected and reported
//! together.

use crate::{AxolemmaConfig, ConfigError, ConfigResult, StimulusChannelConfig};

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    NonFinite { field: String },
    NotPositive { field: String, value: f64 },
    Negative { field: String, value: f64 },
    OutOfRange { field: String, value: f64, min: f64, max: f64 },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFinite { field } => write!(f, "{} must be a finite number", field),
            Self::NotPositive { field, value } => {
                write!(f, "{} = {} must be greater than 0", field, value)
            }
            Self::Negative { field, value } => {
                write!(f, "{} = {} must not be negative", field, value)
            }
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "{} = {} must be between {} and {}", field, value, min, max),
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - Membrane constants (finite, Cm > 0, conductances >= 0, blocks in [0, 1])
/// - Stimulus defaults (finite amplitude, duration > 0, lookahead > 0)
/// - Engine pacing (dt > 0, capacity >= 1, caps and rates > 0)
/// - Logging level/format names
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` with details if validation fails
pub fn validate_config(config: &AxolemmaConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_membrane(config, &mut errors);
    validate_stimulus(config, &mut errors);
    validate_engine(config, &mut errors);
    validate_logging(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn finite(field: &str, value: f64, errors: &mut Vec<ConfigValidationError>) -> bool {
    if value.is_finite() {
        true
    } else {
        errors.push(ConfigValidationError::NonFinite {
            field: field.to_string(),
        });
        false
    }
}

fn positive(field: &str, value: f64, errors: &mut Vec<ConfigValidationError>) {
    if finite(field, value, errors) && value <= 0.0 {
        errors.push(ConfigValidationError::NotPositive {
            field: field.to_string(),
            value,
        });
    }
}

fn non_negative(field: &str, value: f64, errors: &mut Vec<ConfigValidationError>) {
    if finite(field, value, errors) && value < 0.0 {
        errors.push(ConfigValidationError::Negative {
            field: field.to_string(),
            value,
        });
    }
}

fn fraction(field: &str, value: f64, errors: &mut Vec<ConfigValidationError>) {
    if finite(field, value, errors) && !(0.0..=1.0).contains(&value) {
        errors.push(ConfigValidationError::OutOfRange {
            field: field.to_string(),
            value,
            min: 0.0,
            max: 1.0,
        });
    }
}

fn validate_membrane(config: &AxolemmaConfig, errors: &mut Vec<ConfigValidationError>) {
    let m = &config.membrane;
    positive("membrane.cm", m.cm, errors);
    finite("membrane.resting_voltage", m.resting_voltage, errors);
    non_negative("membrane.g_na_max", m.g_na_max, errors);
    non_negative("membrane.g_k_max", m.g_k_max, errors);
    non_negative("membrane.g_l", m.g_l, errors);
    finite("membrane.e_na", m.e_na, errors);
    finite("membrane.e_k", m.e_k, errors);
    finite("membrane.e_l", m.e_l, errors);
    fraction("membrane.ttx_block", m.ttx_block, errors);
    fraction("membrane.tea_block", m.tea_block, errors);
}

fn validate_channel(
    name: &str,
    channel: &StimulusChannelConfig,
    errors: &mut Vec<ConfigValidationError>,
) {
    finite(&format!("stimulus.{}.amplitude", name), channel.amplitude, errors);
    positive(&format!("stimulus.{}.duration", name), channel.duration, errors);
}

fn validate_stimulus(config: &AxolemmaConfig, errors: &mut Vec<ConfigValidationError>) {
    validate_channel("stim1", &config.stimulus.stim1, errors);
    validate_channel("stim2", &config.stimulus.stim2, errors);
    positive("stimulus.lookahead_ms", config.stimulus.lookahead_ms, errors);
}

fn validate_engine(config: &AxolemmaConfig, errors: &mut Vec<ConfigValidationError>) {
    let e = &config.engine;
    positive("engine.dt_ms", e.dt_ms, errors);
    if e.history_capacity == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "engine.history_capacity".to_string(),
            reason: "must hold at least one sample".to_string(),
        });
    }
    non_negative("engine.min_sample_interval_ms", e.min_sample_interval_ms, errors);
    positive("engine.max_wall_delta_ms", e.max_wall_delta_ms, errors);
    positive("engine.sim_ms_per_wall_ms", e.sim_ms_per_wall_ms, errors);
    positive("engine.tick_frequency_hz", e.tick_frequency_hz, errors);
}

fn validate_logging(config: &AxolemmaConfig, errors: &mut Vec<ConfigValidationError>) {
    let level = config.logging.level.to_lowercase();
    if !["trace", "debug", "info", "warn", "error"].contains(&level.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!(
                "'{}' is not one of trace, debug, info, warn, error",
                config.logging.level
            ),
        });
    }
    let format = config.logging.format.to_lowercase();
    if format != "text" && format != "json" {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.format".to_string(),
            reason: format!("'{}' must be 'text' or 'json'", config.logging.format),
        });
    }
}
