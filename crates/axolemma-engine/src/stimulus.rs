// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Stimulus Ledger
//!
//! Records square current pulses on two independent channels and answers
//! "what external current is flowing at time t".
//!
//! Each event covers the half-open interval `[start, start + duration)`.
//! Overlapping events (same or different channel) sum linearly.

use serde::Serialize;

use crate::error::{EngineError, Result};

/// One of the two stimulus channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StimulusChannel {
    One,
    Two,
}

impl StimulusChannel {
    pub const ALL: [StimulusChannel; 2] = [StimulusChannel::One, StimulusChannel::Two];

    /// External name (`stim1` / `stim2`)
    pub fn name(self) -> &'static str {
        match self {
            StimulusChannel::One => "stim1",
            StimulusChannel::Two => "stim2",
        }
    }
}

impl std::fmt::Display for StimulusChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A square current pulse. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StimulusEvent {
    amplitude: f64,
    duration: f64,
    start_time: f64,
}

impl StimulusEvent {
    /// `amplitude` (µA/cm², signed) must be finite, `duration` (ms) > 0 and
    /// `start_time` (ms) >= 0.
    pub fn new(amplitude: f64, duration: f64, start_time: f64) -> Result<Self> {
        if !amplitude.is_finite() {
            return Err(EngineError::InvalidStimulus(format!(
                "amplitude must be finite, got {}",
                amplitude
            )));
        }
        if !(duration.is_finite() && duration > 0.0) {
            return Err(EngineError::InvalidStimulus(format!(
                "duration must be finite and > 0, got {}",
                duration
            )));
        }
        if !(start_time.is_finite() && start_time >= 0.0) {
            return Err(EngineError::InvalidStimulus(format!(
                "start time must be finite and >= 0, got {}",
                start_time
            )));
        }
        Ok(Self {
            amplitude,
            duration,
            start_time,
        })
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Half-open: active at `start`, inactive at `start + duration`.
    pub fn is_active_at(&self, t: f64) -> bool {
        t >= self.start_time && t < self.end_time()
    }
}

/// Default amplitude/duration used when a stimulus request omits them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelDefaults {
    pub amplitude: f64,
    pub duration: f64,
}

impl ChannelDefaults {
    pub fn validate(&self) -> Result<()> {
        StimulusEvent::new(self.amplitude, self.duration, 0.0).map(|_| ())
    }
}

/// Per-channel stimulus defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StimulusDefaults {
    pub stim1: ChannelDefaults,
    pub stim2: ChannelDefaults,
}

impl Default for StimulusDefaults {
    fn default() -> Self {
        Self {
            stim1: ChannelDefaults {
                amplitude: 10.0,
                duration: 1.0,
            },
            stim2: ChannelDefaults {
                amplitude: -10.0,
                duration: 2.0,
            },
        }
    }
}

impl StimulusDefaults {
    pub fn get(&self, channel: StimulusChannel) -> ChannelDefaults {
        match channel {
            StimulusChannel::One => self.stim1,
            StimulusChannel::Two => self.stim2,
        }
    }

    pub fn get_mut(&mut self, channel: StimulusChannel) -> &mut ChannelDefaults {
        match channel {
            StimulusChannel::One => &mut self.stim1,
            StimulusChannel::Two => &mut self.stim2,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.stim1.validate()?;
        self.stim2.validate()
    }
}

/// Two append-only event sequences, each kept ordered by start time.
#[derive(Debug, Clone, Default)]
pub struct StimulusLedger {
    stim1: Vec<StimulusEvent>,
    stim2: Vec<StimulusEvent>,
}

impl StimulusLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn channel(&self, channel: StimulusChannel) -> &Vec<StimulusEvent> {
        match channel {
            StimulusChannel::One => &self.stim1,
            StimulusChannel::Two => &self.stim2,
        }
    }

    fn channel_mut(&mut self, channel: StimulusChannel) -> &mut Vec<StimulusEvent> {
        match channel {
            StimulusChannel::One => &mut self.stim1,
            StimulusChannel::Two => &mut self.stim2,
        }
    }

    /// Record an event on `channel`.
    pub fn apply_event(&mut self, channel: StimulusChannel, event: StimulusEvent) {
        let events = self.channel_mut(channel);
        // Events normally arrive in time order; anything earlier is slotted in
        // after every event with the same or earlier start.
        let idx = events.partition_point(|e| e.start_time <= event.start_time);
        events.insert(idx, event);
    }

    /// Net external current (µA/cm²) at `t`.
    pub fn current_at(&self, t: f64) -> f64 {
        let mut total = 0.0;
        for events in [&self.stim1, &self.stim2] {
            for event in events.iter() {
                if event.start_time > t {
                    break;
                }
                if event.is_active_at(t) {
                    total += event.amplitude;
                }
            }
        }
        total
    }

    pub fn events(&self, channel: StimulusChannel) -> &[StimulusEvent] {
        self.channel(channel)
    }

    /// Drop events that ended at or before `t`. Returns how many were removed.
    pub fn prune_ended_before(&mut self, t: f64) -> usize {
        let before = self.len();
        self.stim1.retain(|e| e.end_time() > t);
        self.stim2.retain(|e| e.end_time() > t);
        before - self.len()
    }

    pub fn clear(&mut self) {
        self.stim1.clear();
        self.stim2.clear();
    }

    /// Events across both channels
    pub fn len(&self) -> usize {
        self.stim1.len() + self.stim2.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stim1.is_empty() && self.stim2.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(amplitude: f64, duration: f64, start: f64) -> StimulusEvent {
        StimulusEvent::new(amplitude, duration, start).unwrap()
    }

    #[test]
    fn test_half_open_interval() {
        let mut ledger = StimulusLedger::new();
        ledger.apply_event(StimulusChannel::One, event(10.0, 1.0, 2.0));

        assert_eq!(ledger.current_at(1.999), 0.0);
        assert_eq!(ledger.current_at(2.0), 10.0);
        assert_eq!(ledger.current_at(2.5), 10.0);
        assert_eq!(ledger.current_at(3.0), 0.0);
    }

    #[test]
    fn test_opposite_events_cancel() {
        let mut ledger = StimulusLedger::new();
        ledger.apply_event(StimulusChannel::One, event(10.0, 2.0, 1.0));
        ledger.apply_event(StimulusChannel::Two, event(-10.0, 2.0, 1.0));

        assert_eq!(ledger.current_at(0.5), 0.0);
        assert_eq!(ledger.current_at(1.5), 0.0);
        assert_eq!(ledger.current_at(3.5), 0.0);
    }

    #[test]
    fn test_partial_overlap_sums() {
        let mut ledger = StimulusLedger::new();
        ledger.apply_event(StimulusChannel::One, event(10.0, 2.0, 0.0));
        ledger.apply_event(StimulusChannel::One, event(5.0, 2.0, 1.0));
        ledger.apply_event(StimulusChannel::Two, event(-10.0, 2.0, 1.5));

        assert_eq!(ledger.current_at(0.5), 10.0);
        assert_eq!(ledger.current_at(1.2), 15.0);
        assert_eq!(ledger.current_at(1.7), 5.0);
        assert_eq!(ledger.current_at(2.5), -5.0);
        assert_eq!(ledger.current_at(3.2), -10.0);
        assert_eq!(ledger.current_at(3.5), 0.0);
    }

    #[test]
    fn test_out_of_order_insert_keeps_sequence_sorted() {
        let mut ledger = StimulusLedger::new();
        ledger.apply_event(StimulusChannel::One, event(1.0, 1.0, 5.0));
        ledger.apply_event(StimulusChannel::One, event(2.0, 1.0, 1.0));

        let starts: Vec<f64> = ledger
            .events(StimulusChannel::One)
            .iter()
            .map(|e| e.start_time())
            .collect();
        assert_eq!(starts, vec![1.0, 5.0]);
        assert_eq!(ledger.current_at(1.5), 2.0);
        assert_eq!(ledger.current_at(5.5), 1.0);
    }

    #[test]
    fn test_prune_ended_before() {
        let mut ledger = StimulusLedger::new();
        ledger.apply_event(StimulusChannel::One, event(10.0, 1.0, 0.0));
        ledger.apply_event(StimulusChannel::Two, event(-10.0, 2.0, 0.5));
        ledger.apply_event(StimulusChannel::One, event(10.0, 1.0, 4.0));

        // First event ends exactly at 1.0: it cannot affect t >= 1.0
        assert_eq!(ledger.prune_ended_before(1.0), 1);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.prune_ended_before(2.5), 1);
        assert_eq!(ledger.events(StimulusChannel::Two).len(), 0);
        assert_eq!(ledger.events(StimulusChannel::One).len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut ledger = StimulusLedger::new();
        ledger.apply_event(StimulusChannel::One, event(10.0, 1.0, 0.0));
        ledger.apply_event(StimulusChannel::Two, event(-10.0, 1.0, 0.0));
        ledger.clear();
        assert!(ledger.is_empty());
        assert_eq!(ledger.current_at(0.5), 0.0);
    }

    #[test]
    fn test_event_validation() {
        assert!(StimulusEvent::new(f64::NAN, 1.0, 0.0).is_err());
        assert!(StimulusEvent::new(10.0, 0.0, 0.0).is_err());
        assert!(StimulusEvent::new(10.0, -1.0, 0.0).is_err());
        assert!(StimulusEvent::new(10.0, f64::INFINITY, 0.0).is_err());
        assert!(StimulusEvent::new(10.0, 1.0, -0.1).is_err());
        assert!(StimulusEvent::new(-10.0, 1.0, 0.0).is_ok());
    }

    #[test]
    fn test_defaults() {
        let defaults = StimulusDefaults::default();
        assert_eq!(defaults.get(StimulusChannel::One).amplitude, 10.0);
        assert_eq!(defaults.get(StimulusChannel::Two).duration, 2.0);
        assert!(defaults.validate().is_ok());
    }

    #[test]
    fn test_event_serializes_with_external_names() {
        let json = serde_json::to_value(event(10.0, 1.0, 2.5)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"amplitude": 10.0, "duration": 1.0, "startTime": 2.5})
        );
    }
}
