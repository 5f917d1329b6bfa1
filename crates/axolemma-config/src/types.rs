// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `axolemma.toml`.

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AxolemmaConfig {
    pub membrane: MembraneConfig,
    pub stimulus: StimulusConfig,
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

/// Membrane constants and drug modifiers at startup
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MembraneConfig {
    /// Capacitance (µF/cm²)
    pub cm: f64,
    /// Baseline voltage restored by reset (mV)
    pub resting_voltage: f64,
    /// Conductances (mS/cm²)
    pub g_na_max: f64,
    pub g_k_max: f64,
    pub g_l: f64,
    /// Reversal potentials (mV)
    pub e_na: f64,
    pub e_k: f64,
    pub e_l: f64,
    pub ttx_block: f64,
    pub tea_block: f64,
    pub pronase: bool,
}

impl Default for MembraneConfig {
    fn default() -> Self {
        Self {
            cm: 1.0,
            resting_voltage: -63.39,
            g_na_max: 120.0,
            g_k_max: 36.0,
            g_l: 0.3,
            e_na: 52.36,
            e_k: -72.17,
            e_l: -54.4,
            ttx_block: 0.0,
            tea_block: 0.0,
            pronase: false,
        }
    }
}

/// Default amplitude/duration of one stimulus channel
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct StimulusChannelConfig {
    /// µA/cm², signed
    pub amplitude: f64,
    /// ms
    pub duration: f64,
}

/// Stimulus channel defaults and scheduling
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StimulusConfig {
    pub stim1: StimulusChannelConfig,
    pub stim2: StimulusChannelConfig,
    /// How far past a newly applied stimulus the engine keeps running (ms)
    pub lookahead_ms: f64,
}

impl Default for StimulusConfig {
    fn default() -> Self {
        Self {
            stim1: StimulusChannelConfig {
                amplitude: 10.0,
                duration: 1.0,
            },
            stim2: StimulusChannelConfig {
                amplitude: -10.0,
                duration: 2.0,
            },
            lookahead_ms: 50.0,
        }
    }
}

/// Integration and pacing
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fixed integration step (ms of simulated time)
    pub dt_ms: f64,
    /// Maximum number of retained history samples
    pub history_capacity: usize,
    /// Minimum simulated time between retained samples (ms)
    pub min_sample_interval_ms: f64,
    /// Wall-clock delta cap per tick (ms); bounds catch-up after a pause
    pub max_wall_delta_ms: f64,
    /// Simulated ms advanced per wall-clock ms
    pub sim_ms_per_wall_ms: f64,
    /// Tick frequency used by the realtime runner (Hz)
    pub tick_frequency_hz: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dt_ms: 0.01,
            history_capacity: 2000,
            min_sample_interval_ms: 0.05,
            max_wall_delta_ms: 50.0,
            sim_ms_per_wall_ms: 0.1,
            tick_frequency_hz: 60.0,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error
    pub level: String,
    /// "text" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}
