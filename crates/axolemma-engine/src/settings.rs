// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Engine pacing and retention settings, and their mapping from
//! `axolemma.toml`.

use std::time::Duration;

use axolemma_config::AxolemmaConfig;
use axolemma_membrane::{MembraneParameters, DEFAULT_DT_MS};

use crate::error::{EngineError, Result};
use crate::stimulus::{ChannelDefaults, StimulusDefaults};

/// Retained samples by default.
pub const DEFAULT_HISTORY_CAPACITY: usize = 2000;
/// Minimum simulated spacing between retained samples (ms).
pub const DEFAULT_MIN_SAMPLE_INTERVAL_MS: f64 = 0.05;
/// Wall-clock delta cap per tick.
pub const DEFAULT_MAX_WALL_DELTA: Duration = Duration::from_millis(50);
/// 1.67 ms simulated per 16.7 ms frame.
pub const DEFAULT_SIM_MS_PER_WALL_MS: f64 = 0.1;
/// How long a new stimulus keeps the engine running (ms).
pub const DEFAULT_STIMULUS_LOOKAHEAD_MS: f64 = 50.0;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Integration step (ms)
    pub dt: f64,
    pub history_capacity: usize,
    /// ms
    pub min_sample_interval: f64,
    pub max_wall_delta: Duration,
    pub sim_ms_per_wall_ms: f64,
    /// ms
    pub stimulus_lookahead: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            dt: DEFAULT_DT_MS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            min_sample_interval: DEFAULT_MIN_SAMPLE_INTERVAL_MS,
            max_wall_delta: DEFAULT_MAX_WALL_DELTA,
            sim_ms_per_wall_ms: DEFAULT_SIM_MS_PER_WALL_MS,
            stimulus_lookahead: DEFAULT_STIMULUS_LOOKAHEAD_MS,
        }
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidSettings(format!(
            "{} must be finite and > 0, got {}",
            name, value
        )))
    }
}

impl EngineSettings {
    pub fn validate(&self) -> Result<()> {
        positive("dt", self.dt)?;
        if self.history_capacity == 0 {
            return Err(EngineError::InvalidSettings(
                "history_capacity must be at least 1".to_string(),
            ));
        }
        if !(self.min_sample_interval.is_finite() && self.min_sample_interval >= 0.0) {
            return Err(EngineError::InvalidSettings(format!(
                "min_sample_interval must be finite and >= 0, got {}",
                self.min_sample_interval
            )));
        }
        if self.max_wall_delta.is_zero() {
            return Err(EngineError::InvalidSettings(
                "max_wall_delta must be > 0".to_string(),
            ));
        }
        positive("sim_ms_per_wall_ms", self.sim_ms_per_wall_ms)?;
        positive("stimulus_lookahead", self.stimulus_lookahead)
    }

    /// Engine section of a loaded configuration
    pub fn from_config(config: &AxolemmaConfig) -> Result<Self> {
        let engine = &config.engine;
        if !(engine.max_wall_delta_ms.is_finite() && engine.max_wall_delta_ms > 0.0) {
            return Err(EngineError::InvalidSettings(format!(
                "max_wall_delta_ms must be finite and > 0, got {}",
                engine.max_wall_delta_ms
            )));
        }
        let settings = Self {
            dt: engine.dt_ms,
            history_capacity: engine.history_capacity,
            min_sample_interval: engine.min_sample_interval_ms,
            max_wall_delta: Duration::from_micros((engine.max_wall_delta_ms * 1000.0).round() as u64),
            sim_ms_per_wall_ms: engine.sim_ms_per_wall_ms,
            stimulus_lookahead: config.stimulus.lookahead_ms,
        };
        settings.validate()?;
        Ok(settings)
    }
}

/// Membrane constants and baseline voltage from a loaded configuration
pub fn membrane_from_config(config: &AxolemmaConfig) -> (MembraneParameters, f64) {
    let m = &config.membrane;
    (
        MembraneParameters {
            cm: m.cm,
            g_na_max: m.g_na_max,
            g_k_max: m.g_k_max,
            g_l: m.g_l,
            e_na: m.e_na,
            e_k: m.e_k,
            e_l: m.e_l,
            ttx_block: m.ttx_block,
            tea_block: m.tea_block,
            pronase: m.pronase,
        },
        m.resting_voltage,
    )
}

/// Stimulus channel defaults from a loaded configuration
pub fn stimulus_defaults_from_config(config: &AxolemmaConfig) -> StimulusDefaults {
    let s = &config.stimulus;
    StimulusDefaults {
        stim1: ChannelDefaults {
            amplitude: s.stim1.amplitude,
            duration: s.stim1.duration,
        },
        stim2: ChannelDefaults {
            amplitude: s.stim2.amplitude,
            duration: s.stim2.duration,
        },
    }
}
