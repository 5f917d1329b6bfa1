// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end engine behaviour driven with synthetic frames.

use std::sync::Arc;
use std::time::Duration;

use axolemma_engine::{
    ChannelSubscriber, EngineSettings, HistorySnapshot, ParameterUpdate, RunState,
    SimulationEngine, StimulusChannel,
};
use axolemma_membrane::RESTING_VOLTAGE_MV;

/// ~60 Hz display frame
const FRAME: Duration = Duration::from_micros(16_667);
const MAX_TICKS: usize = 100_000;

fn max_voltage(snapshot: &HistorySnapshot) -> f64 {
    snapshot.voltage.iter().copied().fold(f64::MIN, f64::max)
}

fn min_voltage(snapshot: &HistorySnapshot) -> f64 {
    snapshot.voltage.iter().copied().fold(f64::MAX, f64::min)
}

#[test]
fn test_suprathreshold_pulse_fires_action_potential() {
    let mut engine = SimulationEngine::new();
    engine
        .apply_stimulus(StimulusChannel::One, None, None)
        .unwrap();
    let ticks = engine.run_until_idle(FRAME, MAX_TICKS);

    assert!(ticks > 0);
    assert_eq!(engine.run_state(), RunState::Idle);
    assert!((engine.model().time() - 50.0).abs() < 1e-6);

    let snapshot = engine.snapshot();
    assert!(max_voltage(&snapshot) > RESTING_VOLTAGE_MV + 50.0);
    // After-hyperpolarisation
    assert!(min_voltage(&snapshot) < RESTING_VOLTAGE_MV - 2.0);
    assert_eq!(snapshot.stim1_events.len(), 1);
    assert!(snapshot.stim2_events.is_empty());
}

#[test]
fn test_ttx_abolishes_spike() {
    let mut engine = SimulationEngine::new();
    engine
        .update_parameters(&ParameterUpdate {
            ttx_block: Some(1.0),
            ..Default::default()
        })
        .unwrap();
    engine
        .apply_stimulus(StimulusChannel::One, None, None)
        .unwrap();
    engine.run_until_idle(FRAME, MAX_TICKS);

    assert!(max_voltage(&engine.snapshot()) < -50.0);
}

#[test]
fn test_opposing_pulses_cancel_exactly() {
    let mut stimulated = SimulationEngine::new();
    stimulated
        .apply_stimulus(StimulusChannel::One, Some(10.0), Some(1.0))
        .unwrap();
    stimulated
        .apply_stimulus(StimulusChannel::Two, Some(-10.0), Some(1.0))
        .unwrap();
    stimulated.run_until_idle(FRAME, MAX_TICKS);

    let mut control = SimulationEngine::new();
    control.run_for(50.0).unwrap();
    control.run_until_idle(FRAME, MAX_TICKS);

    assert_eq!(stimulated.snapshot().voltage, control.snapshot().voltage);
}

#[test]
fn test_identical_schedules_are_deterministic() {
    let run = || {
        let mut engine = SimulationEngine::new();
        engine
            .apply_stimulus(StimulusChannel::One, None, None)
            .unwrap();
        for _ in 0..40 {
            engine.tick(FRAME);
        }
        engine
            .apply_stimulus(StimulusChannel::Two, None, None)
            .unwrap();
        engine.run_until_idle(FRAME, MAX_TICKS);
        engine.snapshot()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_reset_restores_reproducible_baseline() {
    let mut engine = SimulationEngine::new();

    engine
        .apply_stimulus(StimulusChannel::One, None, None)
        .unwrap();
    engine.run_until_idle(FRAME, MAX_TICKS);
    let first = engine.snapshot();

    engine.reset();
    assert_eq!(engine.model().voltage(), RESTING_VOLTAGE_MV);
    assert_eq!(engine.history().len(), 1);

    engine
        .apply_stimulus(StimulusChannel::One, None, None)
        .unwrap();
    engine.run_until_idle(FRAME, MAX_TICKS);
    assert_eq!(engine.snapshot(), first);
}

#[test]
fn test_reset_twice_yields_identical_state() {
    let mut engine = SimulationEngine::new();
    engine
        .apply_stimulus(StimulusChannel::One, None, None)
        .unwrap();
    engine
        .apply_stimulus(StimulusChannel::Two, None, None)
        .unwrap();
    for _ in 0..20 {
        engine.tick(FRAME);
    }
    assert!(!engine.ledger().is_empty());

    engine.reset();
    let state = *engine.model().state();
    let ledger_len = engine.ledger().len();
    let snapshot = engine.snapshot();

    engine.reset();
    assert_eq!(*engine.model().state(), state);
    assert_eq!(engine.ledger().len(), ledger_len);
    assert!(engine.ledger().is_empty());
    assert_eq!(engine.snapshot(), snapshot);
    assert_eq!(engine.run_state(), RunState::Idle);
}

#[test]
fn test_stop_then_resume_continues_from_same_time() {
    let mut engine = SimulationEngine::new();
    engine.run_for(20.0).unwrap();
    for _ in 0..10 {
        engine.tick(FRAME);
    }
    engine.stop();
    let paused_at = engine.model().time();

    let report = engine.tick(FRAME);
    assert_eq!(report.steps, 0);
    assert_eq!(engine.model().time(), paused_at);

    engine.run_for(5.0).unwrap();
    engine.run_until_idle(FRAME, MAX_TICKS);
    assert!((engine.model().time() - (paused_at + 5.0)).abs() < 1e-6);
}

#[test]
fn test_history_respects_capacity() {
    let settings = EngineSettings {
        history_capacity: 25,
        ..Default::default()
    };
    let mut engine = SimulationEngine::with_settings(settings).unwrap();
    engine
        .apply_stimulus(StimulusChannel::One, None, None)
        .unwrap();

    while engine.is_running() {
        engine.tick(FRAME);
        assert!(engine.history().len() <= 25);
    }
    assert_eq!(engine.history().len(), 25);

    // Retained samples are ordered and spaced at least the sample interval
    let snapshot = engine.snapshot();
    for pair in snapshot.time.windows(2) {
        assert!(pair[1] - pair[0] >= 0.05 - 1e-9);
    }
    // The 1 ms pulse has scrolled out of the window
    assert!(snapshot.stim1_events.is_empty());
}

#[test]
fn test_large_wall_gap_is_capped() {
    let mut engine = SimulationEngine::new();
    engine.run_for(100.0).unwrap();
    engine.tick(Duration::from_secs(30));
    // 50 ms wall at 0.1 sim-ms/wall-ms
    assert!((engine.model().time() - 5.0).abs() < 1e-6);
    assert!(engine.is_running());
}

#[test]
fn test_channel_subscriber_receives_snapshots() {
    let mut engine = SimulationEngine::new();
    let (subscriber, receiver) = ChannelSubscriber::bounded(64);
    engine.subscribe(Arc::new(subscriber));

    engine
        .apply_stimulus(StimulusChannel::One, None, None)
        .unwrap();
    engine.tick(FRAME);
    engine.tick(FRAME);
    engine.reset();

    let received: Vec<HistorySnapshot> = receiver.try_iter().collect();
    assert_eq!(received.len(), 3);
    assert!(!received[0].reset);
    assert!(received[1].len() >= received[0].len());
    assert!(received[2].reset);
    assert_eq!(received[2].len(), 1);
}

#[test]
fn test_full_channel_counts_failures_without_blocking() {
    let mut engine = SimulationEngine::new();
    let (subscriber, _receiver) = ChannelSubscriber::bounded(1);
    engine.subscribe(Arc::new(subscriber));

    engine.run_for(10.0).unwrap();
    for _ in 0..3 {
        engine.tick(FRAME);
    }
    let stats = engine.stats();
    assert_eq!(stats.notifications_sent, 3);
    assert_eq!(stats.subscriber_failures, 2);
}

#[test]
fn test_unsubscribed_listener_hears_nothing() {
    let mut engine = SimulationEngine::new();
    let (subscriber, receiver) = ChannelSubscriber::bounded(8);
    let id = engine.subscribe(Arc::new(subscriber));
    assert!(engine.unsubscribe(id));
    assert!(!engine.unsubscribe(id));

    engine.clear_history();
    assert!(receiver.try_recv().is_err());
}

#[test]
fn test_snapshot_serializes_with_external_field_names() {
    let mut engine = SimulationEngine::new();
    engine
        .apply_stimulus(StimulusChannel::Two, None, None)
        .unwrap();
    engine.tick(FRAME);

    let value = serde_json::to_value(engine.snapshot()).unwrap();
    for key in ["time", "voltage", "iNa", "iK", "iL", "gating", "stim1Events", "stim2Events", "reset"] {
        assert!(value.get(key).is_some(), "missing {}", key);
    }
    assert_eq!(value["stim2Events"][0]["amplitude"], -10.0);
    assert_eq!(value["stim2Events"][0]["startTime"], 0.0);
}

#[test]
fn test_json_update_round_trip_through_queue() {
    let mut engine = SimulationEngine::new();
    let queue = engine.parameter_queue();

    let update = ParameterUpdate::from_json(r#"{"gKMax": 18, "teaBlock": 0.25}"#).unwrap();
    queue.push(update).unwrap();
    assert!(ParameterUpdate::from_json(r#"{"gKmax": 18}"#).is_err());

    let report = engine.tick(FRAME);
    assert_eq!(report.updates_applied, 1);
    assert_eq!(engine.model().parameters().g_k_max, 18.0);
    assert_eq!(engine.model().parameters().tea_block, 0.25);
}
