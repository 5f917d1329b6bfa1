// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Simulation Engine
//!
//! Owns the membrane model, the stimulus ledger and the history buffer, and
//! paces integration against wall-clock time supplied by the host.
//!
//! ## Tick
//! ```text
//! drain parameter queue (silent)
//! Idle?  -> done
//! budget += min(Δwall, cap) · sim_ms_per_wall_ms
//! steps   = ⌊budget / dt⌋       (remainder carried)
//! per step: I = ledger(t) -> model.step(I) -> history (down-sampled)
//! end time reached -> Idle + final notification
//! otherwise, ≥1 step -> notification
//! ```
//!
//! The engine never reads a clock itself; hosts (RealtimeRunner, the CLI,
//! tests) decide how much wall time each tick represents.

use std::sync::Arc;
use std::time::Duration;

use axolemma_config::AxolemmaConfig;
use axolemma_membrane::{MembraneModel, MembraneParameters};
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use crate::history::{HistoryBuffer, HistorySample};
use crate::notification::{HistorySnapshot, HistorySubscriber, SubscriberRegistry, SubscriptionId};
use crate::parameter_update_queue::{ParameterUpdate, ParameterUpdateQueue};
use crate::settings::{membrane_from_config, stimulus_defaults_from_config, EngineSettings};
use crate::stimulus::{ChannelDefaults, StimulusChannel, StimulusDefaults, StimulusEvent, StimulusLedger};
use crate::EngineStats;

/// Absorbs round-off when converting the carried budget to whole steps.
const STEP_BUDGET_EPSILON: f64 = 1e-9;

/// Fraction of dt treated as "already there" when comparing against the end
/// time; a summed clock drifts below the exact multiple.
const END_TIME_TOLERANCE_DT: f64 = 1e-3;

/// Run/idle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
}

/// What one tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Integration steps taken
    pub steps: usize,
    /// Samples accepted into history
    pub samples_recorded: usize,
    /// Queued parameter updates applied before stepping
    pub updates_applied: usize,
    /// The end time was reached and the engine went Idle
    pub finished: bool,
    pub notified: bool,
}

pub struct SimulationEngine {
    settings: EngineSettings,
    model: MembraneModel,
    ledger: StimulusLedger,
    history: HistoryBuffer,
    stimulus_defaults: StimulusDefaults,
    subscribers: SubscriberRegistry,
    parameter_queue: ParameterUpdateQueue,
    run_state: RunState,
    end_time: Option<f64>,
    /// Simulated ms owed but not yet stepped
    sim_budget: f64,
    /// Set inside `reset`; silences `update_parameters` notifications
    resetting: bool,
    stats: EngineStats,
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationEngine {
    /// Default membrane, stimulus defaults and pacing
    pub fn new() -> Self {
        Self::assemble(
            EngineSettings::default(),
            MembraneModel::new(),
            StimulusDefaults::default(),
        )
    }

    /// Default membrane with custom pacing/retention
    pub fn with_settings(settings: EngineSettings) -> Result<Self> {
        Self::with_components(
            settings,
            MembraneParameters::default(),
            axolemma_membrane::RESTING_VOLTAGE_MV,
            StimulusDefaults::default(),
        )
    }

    /// Fully specified construction; everything is validated before use
    pub fn with_components(
        settings: EngineSettings,
        params: MembraneParameters,
        resting_voltage: f64,
        stimulus_defaults: StimulusDefaults,
    ) -> Result<Self> {
        settings.validate()?;
        stimulus_defaults.validate()?;
        let model = MembraneModel::with_parameters(params, resting_voltage, settings.dt)?;
        Ok(Self::assemble(settings, model, stimulus_defaults))
    }

    /// Build from a loaded `axolemma.toml`
    pub fn from_config(config: &AxolemmaConfig) -> Result<Self> {
        let settings = EngineSettings::from_config(config)?;
        let (params, resting_voltage) = membrane_from_config(config);
        let defaults = stimulus_defaults_from_config(config);
        Self::with_components(settings, params, resting_voltage, defaults)
    }

    fn assemble(
        settings: EngineSettings,
        model: MembraneModel,
        stimulus_defaults: StimulusDefaults,
    ) -> Self {
        let mut history = HistoryBuffer::new(settings.history_capacity, settings.min_sample_interval);
        history.reseed(Self::current_sample(&model));
        info!(
            "[SIM-ENGINE] Initialized: dt={} ms, history={} samples, pacing={} sim-ms/wall-ms",
            settings.dt, settings.history_capacity, settings.sim_ms_per_wall_ms
        );
        Self {
            settings,
            model,
            ledger: StimulusLedger::new(),
            history,
            stimulus_defaults,
            subscribers: SubscriberRegistry::new(),
            parameter_queue: ParameterUpdateQueue::new(),
            run_state: RunState::Idle,
            end_time: None,
            sim_budget: 0.0,
            resetting: false,
            stats: EngineStats::default(),
        }
    }

    /// Sample for the model's present state, currents included.
    fn current_sample(model: &MembraneModel) -> HistorySample {
        let (i_na, i_k, i_l) = model.ionic_currents();
        let gates = model.gates();
        HistorySample {
            time: model.time(),
            voltage: model.voltage(),
            i_na,
            i_k,
            i_l,
            m: gates.m,
            h: gates.h,
            n: gates.n,
        }
    }

    // ------------------------------------------------------------------
    // Scheduling
    // ------------------------------------------------------------------

    /// Run for `duration` ms of simulated time from now. While already
    /// running the end time only ever moves later.
    pub fn run_for(&mut self, duration: f64) -> Result<()> {
        if !(duration.is_finite() && duration > 0.0) {
            return Err(EngineError::InvalidRunDuration(duration));
        }
        let target = self.model.time() + duration;
        match self.run_state {
            RunState::Idle => {
                self.end_time = Some(target);
                self.run_state = RunState::Running;
                debug!(
                    "[SIM-ENGINE] ▶️ Running from t={:.3} ms until t={:.3} ms",
                    self.model.time(),
                    target
                );
            }
            RunState::Running => {
                if self.end_time.map_or(true, |end| target > end) {
                    self.end_time = Some(target);
                    debug!("[SIM-ENGINE] Run extended until t={:.3} ms", target);
                }
            }
        }
        Ok(())
    }

    /// Idempotent. Drops the pending schedule and carried budget; model,
    /// ledger and history are untouched.
    pub fn stop(&mut self) {
        if self.run_state == RunState::Running {
            debug!("[SIM-ENGINE] ⏸️ Stopped at t={:.3} ms", self.model.time());
        }
        self.run_state = RunState::Idle;
        self.end_time = None;
        self.sim_budget = 0.0;
    }

    /// Advance by the simulated time that `wall_delta` is worth.
    pub fn tick(&mut self, wall_delta: Duration) -> TickReport {
        self.stats.total_ticks += 1;
        let mut report = TickReport {
            updates_applied: self.drain_parameter_queue(),
            ..Default::default()
        };

        if self.run_state == RunState::Idle {
            return report;
        }

        let capped = wall_delta.min(self.settings.max_wall_delta);
        let wall_ms = capped.as_nanos() as f64 / 1_000_000.0;
        self.sim_budget += wall_ms * self.settings.sim_ms_per_wall_ms;

        let dt = self.model.dt();
        let steps = (self.sim_budget / dt + STEP_BUDGET_EPSILON).floor() as usize;
        self.sim_budget = (self.sim_budget - steps as f64 * dt).max(0.0);

        let end_time = self.end_time.unwrap_or(f64::INFINITY);
        for _ in 0..steps {
            self.advance_one_step(&mut report);
            if self.model.time() + dt * END_TIME_TOLERANCE_DT >= end_time {
                report.finished = true;
                break;
            }
        }

        if report.finished {
            self.stop();
            debug!(
                "[SIM-ENGINE] ⏹️ Reached end time at t={:.3} ms",
                self.model.time()
            );
        }

        if report.steps > 0 {
            if let Some(oldest) = self.history.oldest_time() {
                self.ledger.prune_ended_before(oldest);
            }
            self.notify(false);
            report.notified = true;
        }

        report
    }

    fn advance_one_step(&mut self, report: &mut TickReport) {
        let current = self.ledger.current_at(self.model.time());
        let out = self.model.step(current);
        self.stats.total_steps += 1;
        report.steps += 1;
        if self
            .history
            .record(HistorySample::from_step(self.model.time(), &out))
        {
            report.samples_recorded += 1;
        }
    }

    /// Tick with a fixed synthetic frame until Idle or `max_ticks` ticks.
    /// Returns the number of ticks taken.
    pub fn run_until_idle(&mut self, frame: Duration, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while self.run_state == RunState::Running && ticks < max_ticks {
            self.tick(frame);
            ticks += 1;
        }
        ticks
    }

    // ------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------

    /// Start a pulse on `channel` at the present simulated time. Omitted
    /// values come from the channel defaults. Keeps the engine running for
    /// the stimulus lookahead.
    pub fn apply_stimulus(
        &mut self,
        channel: StimulusChannel,
        amplitude: Option<f64>,
        duration: Option<f64>,
    ) -> Result<StimulusEvent> {
        let defaults = self.stimulus_defaults.get(channel);
        let event = StimulusEvent::new(
            amplitude.unwrap_or(defaults.amplitude),
            duration.unwrap_or(defaults.duration),
            self.model.time(),
        )?;
        self.ledger.apply_event(channel, event);
        info!(
            "[SIM-ENGINE] ⚡ {} pulse {} µA/cm² for {} ms at t={:.3} ms",
            channel,
            event.amplitude(),
            event.duration(),
            event.start_time()
        );
        self.run_for(self.settings.stimulus_lookahead)?;
        Ok(event)
    }

    /// Back to the baseline with an empty ledger and a one-sample history.
    /// Emits exactly one notification, flagged `reset`.
    pub fn reset(&mut self) {
        self.resetting = true;
        self.stop();
        // Through update_parameters so the only notification is the reset one
        for update in self.parameter_queue.drain_all() {
            if let Err(e) = self.update_parameters(&update) {
                warn!("[SIM-ENGINE] ⚠️ Dropped queued parameter update: {}", e);
            }
        }
        self.model.reset();
        self.ledger.clear();
        self.history.reseed(Self::current_sample(&self.model));
        self.notify(true);
        self.resetting = false;
        info!("[SIM-ENGINE] 🔄 Reset to baseline V={} mV", self.model.voltage());
    }

    /// Keep only the latest sample, drop events that ended before it.
    pub fn clear_history(&mut self) {
        self.history.truncate_to_latest();
        if let Some(oldest) = self.history.oldest_time() {
            let pruned = self.ledger.prune_ended_before(oldest);
            debug!("[SIM-ENGINE] History cleared, {} stale events pruned", pruned);
        }
        self.notify(false);
    }

    /// Validate and apply `update`, then notify (suppressed during reset).
    /// An invalid update changes nothing.
    pub fn update_parameters(&mut self, update: &ParameterUpdate) -> Result<()> {
        self.apply_update(update)?;
        if !self.resetting {
            self.notify(false);
        }
        Ok(())
    }

    fn apply_update(&mut self, update: &ParameterUpdate) -> Result<()> {
        update.validate()?;
        let defaults = update.merged_stimulus_defaults(&self.stimulus_defaults);
        defaults.validate()?;

        let patch = update.membrane_patch();
        if !patch.is_empty() {
            self.model.update_parameters(&patch)?;
        }
        self.stimulus_defaults = defaults;
        debug!("[SIM-ENGINE] Parameters updated: {:?}", update);
        Ok(())
    }

    /// Apply everything waiting in the queue, without notifying.
    fn drain_parameter_queue(&mut self) -> usize {
        if self.parameter_queue.is_empty() {
            return 0;
        }
        let mut applied = 0;
        for update in self.parameter_queue.drain_all() {
            match self.apply_update(&update) {
                Ok(()) => applied += 1,
                Err(e) => warn!("[SIM-ENGINE] ⚠️ Dropped queued parameter update: {}", e),
            }
        }
        applied
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    pub fn subscribe(&mut self, subscriber: Arc<dyn HistorySubscriber>) -> SubscriptionId {
        self.subscribers.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    fn notify(&mut self, reset: bool) {
        self.stats.notifications_sent += 1;
        if self.subscribers.is_empty() {
            return;
        }
        let snapshot = HistorySnapshot::capture(&self.history, &self.ledger, reset);
        let failures = self.subscribers.publish(&snapshot);
        self.stats.subscriber_failures += failures as u64;
    }

    /// Current history and events, as a subscriber would see them.
    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot::capture(&self.history, &self.ledger, false)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Cloneable handle other threads can push updates through
    pub fn parameter_queue(&self) -> ParameterUpdateQueue {
        self.parameter_queue.clone()
    }

    pub fn model(&self) -> &MembraneModel {
        &self.model
    }

    pub fn ledger(&self) -> &StimulusLedger {
        &self.ledger
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }

    pub fn end_time(&self) -> Option<f64> {
        self.end_time
    }

    pub fn stimulus_defaults(&self, channel: StimulusChannel) -> ChannelDefaults {
        self.stimulus_defaults.get(channel)
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }
}

impl std::fmt::Debug for SimulationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationEngine")
            .field("time", &self.model.time())
            .field("voltage", &self.model.voltage())
            .field("run_state", &self.run_state)
            .field("end_time", &self.end_time)
            .field("history_len", &self.history.len())
            .field("events", &self.ledger.len())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const FRAME: Duration = Duration::from_millis(16);

    fn counting_subscriber(engine: &mut SimulationEngine) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        engine.subscribe(Arc::new(move |_: &HistorySnapshot| -> std::result::Result<(), String> {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));
        count
    }

    #[test]
    fn test_new_engine_is_idle_with_one_sample() {
        let engine = SimulationEngine::new();
        assert_eq!(engine.run_state(), RunState::Idle);
        assert_eq!(engine.history().len(), 1);
        assert!(engine.ledger().is_empty());
        assert_eq!(engine.end_time(), None);
    }

    #[test]
    fn test_idle_tick_does_nothing() {
        let mut engine = SimulationEngine::new();
        let count = counting_subscriber(&mut engine);
        let report = engine.tick(FRAME);
        assert_eq!(report.steps, 0);
        assert!(!report.notified);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(engine.model().time(), 0.0);
    }

    #[test]
    fn test_wall_delta_is_capped() {
        let mut engine = SimulationEngine::new();
        engine.run_for(1000.0).unwrap();
        let report = engine.tick(Duration::from_secs(10));
        // 50 ms cap · 0.1 sim-ms/wall-ms / 0.01 ms
        assert_eq!(report.steps, 500);
    }

    #[test]
    fn test_budget_remainder_carries_over() {
        let mut engine = SimulationEngine::new();
        engine.run_for(1000.0).unwrap();
        // 0.15 ms of wall time -> 0.015 sim ms -> 1 step, 0.005 carried
        let first = engine.tick(Duration::from_micros(150));
        let second = engine.tick(Duration::from_micros(150));
        assert_eq!(first.steps, 1);
        assert_eq!(second.steps, 2);
        assert!(!first.finished);
    }

    #[test]
    fn test_tick_without_whole_step_does_not_notify() {
        let mut engine = SimulationEngine::new();
        let count = counting_subscriber(&mut engine);
        engine.run_for(10.0).unwrap();
        let report = engine.tick(Duration::from_micros(50));
        assert_eq!(report.steps, 0);
        assert!(!report.notified);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_run_stops_at_end_time() {
        let mut engine = SimulationEngine::new();
        let count = counting_subscriber(&mut engine);
        engine.run_for(1.0).unwrap();

        // One capped tick is worth 5 ms; the run ends after 100 steps
        let report = engine.tick(Duration::from_secs(1));
        assert_eq!(report.steps, 100);
        assert!(report.finished);
        assert!(report.notified);
        assert_eq!(engine.run_state(), RunState::Idle);
        assert_eq!(engine.end_time(), None);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!((engine.model().time() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_run_for_never_shortens() {
        let mut engine = SimulationEngine::new();
        engine.run_for(10.0).unwrap();
        engine.run_for(2.0).unwrap();
        assert_eq!(engine.end_time(), Some(10.0));
        engine.run_for(20.0).unwrap();
        assert_eq!(engine.end_time(), Some(20.0));
    }

    #[test]
    fn test_run_for_rejects_bad_durations() {
        let mut engine = SimulationEngine::new();
        for d in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                engine.run_for(d),
                Err(EngineError::InvalidRunDuration(_))
            ));
        }
        assert_eq!(engine.run_state(), RunState::Idle);
    }

    #[test]
    fn test_stop_is_idempotent_and_keeps_state() {
        let mut engine = SimulationEngine::new();
        engine.apply_stimulus(StimulusChannel::One, None, None).unwrap();
        engine.tick(FRAME);
        let time = engine.model().time();
        let samples = engine.history().len();

        engine.stop();
        engine.stop();
        assert_eq!(engine.run_state(), RunState::Idle);
        assert_eq!(engine.model().time(), time);
        assert_eq!(engine.history().len(), samples);
        assert_eq!(engine.ledger().len(), 1);
    }

    #[test]
    fn test_apply_stimulus_uses_defaults_and_runs() {
        let mut engine = SimulationEngine::new();
        let event = engine
            .apply_stimulus(StimulusChannel::Two, None, Some(3.0))
            .unwrap();
        assert_eq!(event.amplitude(), -10.0);
        assert_eq!(event.duration(), 3.0);
        assert_eq!(event.start_time(), 0.0);
        assert_eq!(engine.run_state(), RunState::Running);
        assert_eq!(engine.end_time(), Some(50.0));
    }

    #[test]
    fn test_invalid_stimulus_is_rejected_without_side_effects() {
        let mut engine = SimulationEngine::new();
        assert!(engine
            .apply_stimulus(StimulusChannel::One, Some(f64::NAN), None)
            .is_err());
        assert!(engine.ledger().is_empty());
        assert_eq!(engine.run_state(), RunState::Idle);
    }

    #[test]
    fn test_reset_notifies_once_with_flag() {
        let mut engine = SimulationEngine::new();
        let flags = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let f = flags.clone();
        engine.subscribe(Arc::new(move |s: &HistorySnapshot| -> std::result::Result<(), String> {
            f.lock().push(s.reset);
            Ok(())
        }));

        engine.apply_stimulus(StimulusChannel::One, None, None).unwrap();
        engine.tick(FRAME);
        engine.reset();

        assert_eq!(*flags.lock(), vec![false, true]);
        assert_eq!(engine.history().len(), 1);
        assert_eq!(engine.model().time(), 0.0);
        assert!(engine.ledger().is_empty());
        assert_eq!(engine.run_state(), RunState::Idle);
    }

    #[test]
    fn test_reset_applies_queued_updates_silently() {
        let mut engine = SimulationEngine::new();
        let count = counting_subscriber(&mut engine);
        engine
            .parameter_queue()
            .push(ParameterUpdate {
                tea_block: Some(0.5),
                ..Default::default()
            })
            .unwrap();

        engine.reset();

        assert_eq!(engine.model().parameters().tea_block, 0.5);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(engine.parameter_queue().is_empty());
    }

    #[test]
    fn test_reset_emits_single_flagged_notification_with_queued_updates() {
        let mut engine = SimulationEngine::new();
        let flags = Arc::new(Mutex::new(Vec::new()));
        let f = flags.clone();
        engine.subscribe(Arc::new(move |s: &HistorySnapshot| -> std::result::Result<(), String> {
            f.lock().push(s.reset);
            Ok(())
        }));
        let queue = engine.parameter_queue();
        for ttx in [0.2, 0.4, 0.6] {
            queue
                .push(ParameterUpdate {
                    ttx_block: Some(ttx),
                    ..Default::default()
                })
                .unwrap();
        }

        engine.reset();

        assert_eq!(*flags.lock(), vec![true]);
        assert_eq!(engine.model().parameters().ttx_block, 0.6);

        // Guard is lowered again afterwards
        engine
            .update_parameters(&ParameterUpdate {
                ttx_block: Some(0.0),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(*flags.lock(), vec![true, false]);
    }

    #[test]
    fn test_update_parameters_notifies() {
        let mut engine = SimulationEngine::new();
        let count = counting_subscriber(&mut engine);
        engine
            .update_parameters(&ParameterUpdate {
                pronase: Some(true),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(engine.model().gates().h, 1.0);
    }

    #[test]
    fn test_invalid_update_changes_nothing() {
        let mut engine = SimulationEngine::new();
        let count = counting_subscriber(&mut engine);
        let result = engine.update_parameters(&ParameterUpdate {
            g_l: Some(1.0),
            stim1: Some(crate::ChannelDefaultsUpdate {
                amplitude: None,
                duration: Some(-1.0),
            }),
            ..Default::default()
        });
        assert!(result.is_err());
        assert_eq!(engine.model().parameters().g_l, 0.3);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stimulus_defaults_update() {
        let mut engine = SimulationEngine::new();
        engine
            .update_parameters(&ParameterUpdate::from_json(r#"{"stim1": {"amplitude": 20}}"#).unwrap())
            .unwrap();
        let event = engine.apply_stimulus(StimulusChannel::One, None, None).unwrap();
        assert_eq!(event.amplitude(), 20.0);
        assert_eq!(event.duration(), 1.0);
    }

    #[test]
    fn test_queued_update_applied_on_next_tick() {
        let mut engine = SimulationEngine::new();
        let queue = engine.parameter_queue();
        queue
            .push(ParameterUpdate {
                ttx_block: Some(1.0),
                ..Default::default()
            })
            .unwrap();
        let report = engine.tick(FRAME);
        assert_eq!(report.updates_applied, 1);
        assert_eq!(engine.model().parameters().ttx_block, 1.0);
    }

    #[test]
    fn test_clear_history_keeps_latest() {
        let mut engine = SimulationEngine::new();
        let count = counting_subscriber(&mut engine);
        engine.apply_stimulus(StimulusChannel::One, None, None).unwrap();
        for _ in 0..5 {
            engine.tick(FRAME);
        }
        let latest = *engine.history().latest().unwrap();
        let notified = count.load(Ordering::SeqCst);

        engine.clear_history();

        assert_eq!(engine.history().len(), 1);
        assert_eq!(*engine.history().latest().unwrap(), latest);
        // The 1 ms pulse ended before the retained window
        assert!(engine.ledger().is_empty());
        assert_eq!(count.load(Ordering::SeqCst), notified + 1);
    }

    #[test]
    fn test_stats_accumulate() {
        let mut engine = SimulationEngine::new();
        engine.run_for(1.0).unwrap();
        engine.tick(Duration::from_secs(1));
        engine.tick(FRAME);
        let stats = engine.stats();
        assert_eq!(stats.total_ticks, 2);
        assert_eq!(stats.total_steps, 100);
        assert_eq!(stats.notifications_sent, 1);
    }

    #[test]
    fn test_from_default_config() {
        let engine = SimulationEngine::from_config(&AxolemmaConfig::default()).unwrap();
        assert_eq!(engine.settings(), &EngineSettings::default());
        assert_eq!(engine.model().voltage(), axolemma_membrane::RESTING_VOLTAGE_MV);
    }
}
