// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Parameter updates and the cross-thread queue that carries them.

A [`ParameterUpdate`] names any subset of the recognised options. Other
threads may push validated updates into a [`ParameterUpdateQueue`]; the
engine drains it at the start of every tick (and during reset), so updates
never interleave with a step batch.

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

use axolemma_membrane::MembranePatch;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;

use crate::error::{EngineError, Result};
use crate::stimulus::{ChannelDefaults, StimulusChannel, StimulusDefaults};

/// Override of one channel's stimulus defaults
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelDefaultsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amplitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl ChannelDefaultsUpdate {
    fn merged_into(&self, current: ChannelDefaults) -> ChannelDefaults {
        ChannelDefaults {
            amplitude: self.amplitude.unwrap_or(current.amplitude),
            duration: self.duration.unwrap_or(current.duration),
        }
    }
}

/// Any subset of recognised options. Absent fields keep their value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterUpdate {
    #[serde(rename = "Cm", default, skip_serializing_if = "Option::is_none")]
    pub cm: Option<f64>,
    #[serde(rename = "V", default, skip_serializing_if = "Option::is_none")]
    pub voltage: Option<f64>,
    #[serde(rename = "gNaMax", default, skip_serializing_if = "Option::is_none")]
    pub g_na_max: Option<f64>,
    #[serde(rename = "gKMax", default, skip_serializing_if = "Option::is_none")]
    pub g_k_max: Option<f64>,
    #[serde(rename = "gL", default, skip_serializing_if = "Option::is_none")]
    pub g_l: Option<f64>,
    #[serde(rename = "ENa", default, skip_serializing_if = "Option::is_none")]
    pub e_na: Option<f64>,
    #[serde(rename = "EK", default, skip_serializing_if = "Option::is_none")]
    pub e_k: Option<f64>,
    #[serde(rename = "EL", default, skip_serializing_if = "Option::is_none")]
    pub e_l: Option<f64>,
    #[serde(rename = "ttxBlock", default, skip_serializing_if = "Option::is_none")]
    pub ttx_block: Option<f64>,
    #[serde(rename = "teaBlock", default, skip_serializing_if = "Option::is_none")]
    pub tea_block: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pronase: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stim1: Option<ChannelDefaultsUpdate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stim2: Option<ChannelDefaultsUpdate>,
}

impl ParameterUpdate {
    /// Parse a JSON payload; unknown keys are rejected. The result still has
    /// to pass [`ParameterUpdate::validate`].
    pub fn from_json(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).map_err(|e| EngineError::MalformedUpdate(e.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The membrane subset
    pub fn membrane_patch(&self) -> MembranePatch {
        MembranePatch {
            cm: self.cm,
            voltage: self.voltage,
            g_na_max: self.g_na_max,
            g_k_max: self.g_k_max,
            g_l: self.g_l,
            e_na: self.e_na,
            e_k: self.e_k,
            e_l: self.e_l,
            ttx_block: self.ttx_block,
            tea_block: self.tea_block,
            pronase: self.pronase,
        }
    }

    pub fn stimulus_update(&self, channel: StimulusChannel) -> Option<ChannelDefaultsUpdate> {
        match channel {
            StimulusChannel::One => self.stim1,
            StimulusChannel::Two => self.stim2,
        }
    }

    /// `current` with this update's stimulus overrides applied
    pub fn merged_stimulus_defaults(&self, current: &StimulusDefaults) -> StimulusDefaults {
        let mut merged = *current;
        for channel in StimulusChannel::ALL {
            if let Some(update) = self.stimulus_update(channel) {
                *merged.get_mut(channel) = update.merged_into(current.get(channel));
            }
        }
        merged
    }

    /// Rejects non-finite values, block fractions outside [0, 1], Cm <= 0,
    /// negative conductances and non-positive stimulus durations.
    pub fn validate(&self) -> Result<()> {
        self.membrane_patch().validate()?;
        for channel in StimulusChannel::ALL {
            if let Some(update) = self.stimulus_update(channel) {
                if let Some(amplitude) = update.amplitude {
                    if !amplitude.is_finite() {
                        return Err(EngineError::InvalidStimulus(format!(
                            "{}.amplitude must be finite, got {}",
                            channel, amplitude
                        )));
                    }
                }
                if let Some(duration) = update.duration {
                    if !(duration.is_finite() && duration > 0.0) {
                        return Err(EngineError::InvalidStimulus(format!(
                            "{}.duration must be finite and > 0, got {}",
                            channel, duration
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Thread-safe FIFO of validated parameter updates
///
/// ARCHITECTURE:
/// - Host/UI threads: push updates (short mutex hold, never touches the engine)
/// - Engine: drains between step batches
#[derive(Debug, Clone, Default)]
pub struct ParameterUpdateQueue {
    queue: Arc<Mutex<VecDeque<ParameterUpdate>>>,
}

impl ParameterUpdateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and enqueue. Invalid updates never reach the queue.
    pub fn push(&self, update: ParameterUpdate) -> Result<()> {
        update.validate()?;
        self.queue.lock().push_back(update);
        Ok(())
    }

    /// Drain all pending updates in arrival order
    pub fn drain_all(&self) -> Vec<ParameterUpdate> {
        self.queue.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}
